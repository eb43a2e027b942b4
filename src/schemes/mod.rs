pub mod algorithms;
pub mod generics;
