// Copyright 2023 Fondazione LINKS

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at

//     http://www.apache.org/licenses/LICENSE-2.0

// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::errors::Error;
use bls12_381_plus::Scalar;
use digest::Digest;
use rug::{integer::Order, Integer};

pub trait IntegerExt {
    /// Minimal big-endian encoding of the absolute value.
    fn to_bytes_be(&self) -> Vec<u8>;
    fn mod_exp(&self, exp: &Integer, n: &Integer) -> Result<Integer, Error>;
    fn mod_inverse(&self, n: &Integer) -> Result<Integer, Error>;
}

impl IntegerExt for Integer {
    fn to_bytes_be(&self) -> Vec<u8> {
        self.to_digits::<u8>(Order::MsfBe)
    }

    fn mod_exp(&self, exp: &Integer, n: &Integer) -> Result<Integer, Error> {
        self.pow_mod_ref(exp, n)
            .map(Integer::from)
            .ok_or_else(|| Error::InvalidStructure("Modular exponentiation failed: base not invertible".to_string()))
    }

    fn mod_inverse(&self, n: &Integer) -> Result<Integer, Error> {
        self.invert_ref(n)
            .map(Integer::from)
            .ok_or_else(|| Error::InvalidStructure("Element is not invertible".to_string()))
    }
}

//b*x = a mod m -> return x
pub fn divm(a: &Integer, b: &Integer, m: &Integer) -> Result<Integer, Error> {
    let b_inv = b.mod_inverse(m)?;
    Ok(Integer::from(a * &b_inv) % m)
}

/// `g1^e1 * g2^e2 mod n`
pub fn pedersen_commitment(
    g1: &Integer,
    e1: &Integer,
    g2: &Integer,
    e2: &Integer,
    n: &Integer,
) -> Result<Integer, Error> {
    Ok(Integer::from(g1.mod_exp(e1, n)? * g2.mod_exp(e2, n)?) % n)
}

/// Fiat-Shamir challenge: digest of the concatenated chunks read as a big-endian integer.
pub fn hash_as_int<H: Digest>(chunks: &[Vec<u8>]) -> Integer {
    let mut hasher = H::new();
    // chunks are not length prefixed, every caller hashes a fixed sequence of values
    for chunk in chunks {
        hasher.update(chunk);
    }
    let digest = hasher.finalize();
    Integer::from_digits(digest.as_slice(), Order::MsfBe)
}

/// Maps an integer (e.g. a credential context) to a scalar of the pairing group.
pub fn scalar_from_integer(value: &Integer) -> Scalar {
    let reduced = Integer::from(value.keep_bits_ref(384));
    let mut okm = [0u8; 48];
    let digits = reduced.to_digits::<u8>(Order::MsfBe);
    okm[48 - digits.len()..].copy_from_slice(&digits);
    Scalar::from_okm(&okm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha2::Sha256;

    #[test]
    fn modular_helpers() {
        let n = Integer::from(23);
        assert_eq!(divm(&Integer::from(6), &Integer::from(3), &n).unwrap(), 2);
        assert!(divm(&Integer::from(6), &Integer::from(46), &n).is_err());

        let c = pedersen_commitment(&Integer::from(2), &Integer::from(3), &Integer::from(3), &Integer::from(2), &n).unwrap();
        assert_eq!(c, (8 * 9) % 23);

        // negative exponent goes through the inverse
        let inv = Integer::from(2).mod_exp(&Integer::from(-1), &n).unwrap();
        assert_eq!(inv, 12);
    }

    #[test]
    fn challenge_is_order_sensitive() {
        let a = vec![1u8, 2, 3];
        let b = vec![4u8, 5];
        let c1 = hash_as_int::<Sha256>(&[a.clone(), b.clone()]);
        let c2 = hash_as_int::<Sha256>(&[b, a]);
        assert_ne!(c1, c2);
        assert!(c1.significant_bits() <= 256);
    }

    #[test]
    fn scalar_mapping_is_deterministic() {
        let v = Integer::from_str_radix("123456789123456789123456789", 10).unwrap();
        assert_eq!(scalar_from_integer(&v), scalar_from_integer(&v));
        assert_ne!(scalar_from_integer(&v), scalar_from_integer(&Integer::from(7)));
    }
}
