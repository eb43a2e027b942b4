pub mod encoding;
pub mod json;
pub mod random;
pub mod util;
