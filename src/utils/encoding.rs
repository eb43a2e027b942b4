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

//! Serde adapters for the interchange format: big integers travel as decimal strings,
//! target-group elements as hex.

pub mod integer {
    use rug::Integer;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Integer, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Integer, D::Error> {
        let s = String::deserialize(deserializer)?;
        Integer::from_str_radix(&s, 10)
            .map_err(|e| D::Error::custom(format!("invalid decimal integer '{s}': {e}")))
    }
}

pub mod integer_map {
    use rug::Integer;
    use serde::{de::Error as _, ser::SerializeMap, Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<String, Integer>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(map.len()))?;
        for (k, v) in map {
            out.serialize_entry(k, &v.to_string())?;
        }
        out.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, Integer>, D::Error> {
        let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(k, s)| {
                Integer::from_str_radix(&s, 10)
                    .map(|v| (k.clone(), v))
                    .map_err(|e| D::Error::custom(format!("invalid decimal integer for '{k}': {e}")))
            })
            .collect()
    }
}

pub mod gt {
    use bls12_381_plus::Gt;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Gt, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(value.to_bytes()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Gt, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(D::Error::custom)?;
        let bytes: [u8; Gt::BYTES] = bytes
            .try_into()
            .map_err(|_| D::Error::custom("invalid Gt length"))?;
        Option::<Gt>::from(Gt::from_bytes(&bytes)).ok_or_else(|| D::Error::custom("invalid Gt element"))
    }
}

#[cfg(test)]
mod tests {
    use rug::Integer;
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Holder {
        #[serde(with = "super::integer")]
        n: Integer,
        #[serde(with = "super::integer_map")]
        m: BTreeMap<String, Integer>,
    }

    #[test]
    fn integers_are_decimal_strings() {
        let mut m = BTreeMap::new();
        m.insert("age".to_string(), Integer::from(-25));
        let h = Holder { n: Integer::from(1) << 300, m };
        let json = serde_json::to_string(&h).unwrap();
        assert!(json.contains("\"age\":\"-25\""));
        assert!(json.contains(&format!("\"{}\"", Integer::from(1) << 300)));
        let back: Holder = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn rejects_non_decimal() {
        let err = serde_json::from_str::<Holder>(r#"{"n":"0x12","m":{}}"#);
        assert!(err.is_err());
    }
}
