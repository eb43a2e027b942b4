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

use super::schema::{CredentialSchema, NonCredentialSchema};
use crate::{errors::Error, impl_json, utils::encoding};
use rug::{integer::Order, Integer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum CredentialValue {
    /// Revealed to the issuer and signed directly.
    Known {
        #[serde(with = "encoding::integer")]
        value: Integer,
    },
    /// Only the prover knows it; enters the signature through the blinded `u`.
    Hidden {
        #[serde(with = "encoding::integer")]
        value: Integer,
    },
    /// Pedersen-committed, `C = z^value * s^blinding_factor`.
    Commitment {
        #[serde(with = "encoding::integer")]
        value: Integer,
        #[serde(with = "encoding::integer")]
        blinding_factor: Integer,
    },
}

impl CredentialValue {
    pub fn value(&self) -> &Integer {
        match self {
            CredentialValue::Known { value }
            | CredentialValue::Hidden { value }
            | CredentialValue::Commitment { value, .. } => value,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, CredentialValue::Known { .. })
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self, CredentialValue::Hidden { .. })
    }

    pub fn is_commitment(&self) -> bool {
        matches!(self, CredentialValue::Commitment { .. })
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CredentialValues {
    pub(crate) attrs_values: BTreeMap<String, CredentialValue>,
}

impl CredentialValues {
    pub fn builder() -> CredentialValuesBuilder {
        CredentialValuesBuilder::default()
    }

    pub fn attrs_values(&self) -> &BTreeMap<String, CredentialValue> {
        &self.attrs_values
    }

    pub fn get(&self, attr: &str) -> Option<&CredentialValue> {
        self.attrs_values.get(attr)
    }

    /// Every attribute of both schemas must have exactly one value, and nothing else.
    pub fn check_against(
        &self,
        schema: &CredentialSchema,
        non_schema: &NonCredentialSchema,
    ) -> Result<(), Error> {
        let expected: BTreeSet<&String> = schema.attrs.iter().chain(non_schema.attrs.iter()).collect();
        let actual: BTreeSet<&String> = self.attrs_values.keys().collect();

        if let Some(missing) = expected.difference(&actual).next() {
            return Err(Error::InvalidStructure(format!("Value for attribute '{missing}' is missing")));
        }
        if let Some(extra) = actual.difference(&expected).next() {
            return Err(Error::InvalidStructure(format!("Attribute '{extra}' is not part of the schema")));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct CredentialValuesBuilder {
    attrs_values: BTreeMap<String, CredentialValue>,
}

impl CredentialValuesBuilder {
    pub fn add_dec_known(&mut self, attr: &str, dec_value: &str) -> Result<&mut Self, Error> {
        let value = parse_dec(attr, dec_value)?;
        self.add_value(attr, CredentialValue::Known { value })
    }

    pub fn add_dec_hidden(&mut self, attr: &str, dec_value: &str) -> Result<&mut Self, Error> {
        let value = parse_dec(attr, dec_value)?;
        self.add_value(attr, CredentialValue::Hidden { value })
    }

    pub fn add_dec_commitment(
        &mut self,
        attr: &str,
        dec_value: &str,
        dec_blinding_factor: &str,
    ) -> Result<&mut Self, Error> {
        let value = parse_dec(attr, dec_value)?;
        let blinding_factor = parse_dec(attr, dec_blinding_factor)?;
        self.add_value(attr, CredentialValue::Commitment { value, blinding_factor })
    }

    /// Adds a known attribute from its raw json value, see [`encode_attribute`].
    pub fn add_raw_known(&mut self, attr: &str, raw: &Value) -> Result<&mut Self, Error> {
        let value = parse_dec(attr, &encode_attribute(raw))?;
        self.add_value(attr, CredentialValue::Known { value })
    }

    pub fn add_raw_hidden(&mut self, attr: &str, raw: &Value) -> Result<&mut Self, Error> {
        let value = parse_dec(attr, &encode_attribute(raw))?;
        self.add_value(attr, CredentialValue::Hidden { value })
    }

    /// The blinding factor is already an integer and is taken in decimal form.
    pub fn add_raw_commitment(
        &mut self,
        attr: &str,
        raw: &Value,
        dec_blinding_factor: &str,
    ) -> Result<&mut Self, Error> {
        self.add_dec_commitment(attr, &encode_attribute(raw), dec_blinding_factor)
    }

    pub fn add_value(&mut self, attr: &str, value: CredentialValue) -> Result<&mut Self, Error> {
        if self.attrs_values.contains_key(attr) {
            return Err(Error::InvalidParam(2, format!("Value for attribute '{attr}' already added")));
        }
        self.attrs_values.insert(attr.to_owned(), value);
        Ok(self)
    }

    pub fn finalize(self) -> Result<CredentialValues, Error> {
        if self.attrs_values.is_empty() {
            return Err(Error::InvalidParam(1, "No credential values added".to_string()));
        }
        Ok(CredentialValues { attrs_values: self.attrs_values })
    }
}

fn parse_dec(attr: &str, dec: &str) -> Result<Integer, Error> {
    Integer::from_str_radix(dec, 10)
        .map_err(|err| Error::InvalidParam(3, format!("Value of '{attr}' is not a decimal integer: {err}")))
}

/// A raw attribute value together with its integer encoding.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct AttributeValue {
    pub raw: Value,
    pub encoded: String,
}

impl AttributeValue {
    pub fn new(raw: Value) -> Self {
        let encoded = encode_attribute(&raw);
        Self { raw, encoded }
    }
}

/// Decimal encoding of a raw attribute value.
///
/// Integers in the `i32` range (and strings holding one) encode as themselves, booleans as
/// `1`/`0`; everything else is the SHA-256 of its textual form read as a big-endian integer.
/// `null` hashes as `None`, floats use six decimals except zero which hashes as `0.0`.
pub fn encode_attribute(raw: &Value) -> String {
    match raw {
        Value::Null => hash_encode("None"),
        Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
        Value::String(s) => match s.parse::<i64>() {
            Ok(i) if in_i32(i) => s.clone(),
            _ => hash_encode(s),
        },
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                if in_i32(i) {
                    i.to_string()
                } else {
                    hash_encode(&i.to_string())
                }
            } else if let Some(u) = n.as_u64() {
                hash_encode(&u.to_string())
            } else {
                let f = n.as_f64().unwrap_or_default();
                if f == 0.0 {
                    hash_encode("0.0")
                } else {
                    hash_encode(&format!("{f:.6}"))
                }
            }
        }
        other => hash_encode(&other.to_string()),
    }
}

fn in_i32(i: i64) -> bool {
    i >= i64::from(i32::MIN) && i <= i64::from(i32::MAX)
}

fn hash_encode(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    Integer::from_digits(digest.as_slice(), Order::MsfBe).to_string()
}

impl_json!(CredentialValues, AttributeValue);
