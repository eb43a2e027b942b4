// Copyright 2025 Fondazione LINKS

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at

//     http://www.apache.org/licenses/LICENSE-2.0

// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::ciphersuites::CLCiphersuite;
use crate::{
    errors::Error,
    impl_json,
    utils::{random::random_bits, util::IntegerExt},
};
use rug::Integer;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Single-use value binding a correctness proof to one protocol run.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Nonce(pub(crate) Integer);

impl Nonce {
    pub fn new<CS: CLCiphersuite>() -> Self {
        Self(random_bits(CS::lnonce))
    }

    pub fn from_dec(dec: &str) -> Result<Self, Error> {
        Integer::from_str_radix(dec, 10)
            .map(Self)
            .map_err(|err| Error::InvalidParam(1, format!("Nonce is not a decimal integer: {err}")))
    }

    pub fn to_dec(&self) -> String {
        self.0.to_string()
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes_be()
    }
}

// A nonce travels as a bare decimal string.
impl Serialize for Nonce {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        crate::utils::encoding::integer::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Nonce {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        crate::utils::encoding::integer::deserialize(deserializer).map(Nonce)
    }
}

impl_json!(Nonce);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cl::ciphersuites::CL2048Sha256;
    use crate::utils::json::{JsonDecodable, JsonEncodable};

    #[test]
    fn nonce_json_is_a_string() {
        let nonce = Nonce::new::<CL2048Sha256>();
        assert!(nonce.0.significant_bits() <= CL2048Sha256::lnonce);
        let json = nonce.to_json().unwrap();
        assert_eq!(json, format!("\"{}\"", nonce.to_dec()));
        assert_eq!(Nonce::from_json(&json).unwrap(), nonce);
    }

    #[test]
    fn nonce_from_dec() {
        assert_eq!(Nonce::from_dec("526193306511429638192053").unwrap().to_dec(), "526193306511429638192053");
        assert!(Nonce::from_dec("nonce").is_err());
    }
}
