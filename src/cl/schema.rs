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

use crate::{errors::Error, impl_json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Attribute name of the prover's link secret in the non-credential schema.
pub const MASTER_SECRET: &str = "master_secret";

/// Attributes signed into the credential.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CredentialSchema {
    pub(crate) attrs: BTreeSet<String>,
}

/// Attributes bound to the credential that are not part of the issuer's schema (the master secret).
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct NonCredentialSchema {
    pub(crate) attrs: BTreeSet<String>,
}

impl CredentialSchema {
    pub fn builder() -> CredentialSchemaBuilder {
        CredentialSchemaBuilder::default()
    }

    pub fn attrs(&self) -> &BTreeSet<String> {
        &self.attrs
    }
}

impl NonCredentialSchema {
    pub fn builder() -> NonCredentialSchemaBuilder {
        NonCredentialSchemaBuilder::default()
    }

    pub fn attrs(&self) -> &BTreeSet<String> {
        &self.attrs
    }
}

#[derive(Clone, Debug, Default)]
pub struct CredentialSchemaBuilder {
    attrs: BTreeSet<String>,
}

impl CredentialSchemaBuilder {
    pub fn add_attr(&mut self, attr: &str) -> Result<&mut Self, Error> {
        insert_attr(&mut self.attrs, attr)?;
        Ok(self)
    }

    pub fn finalize(self) -> Result<CredentialSchema, Error> {
        if self.attrs.is_empty() {
            return Err(Error::InvalidParam(1, "Credential schema has no attributes".to_string()));
        }
        Ok(CredentialSchema { attrs: self.attrs })
    }
}

#[derive(Clone, Debug, Default)]
pub struct NonCredentialSchemaBuilder {
    attrs: BTreeSet<String>,
}

impl NonCredentialSchemaBuilder {
    pub fn add_attr(&mut self, attr: &str) -> Result<&mut Self, Error> {
        insert_attr(&mut self.attrs, attr)?;
        Ok(self)
    }

    pub fn finalize(self) -> Result<NonCredentialSchema, Error> {
        Ok(NonCredentialSchema { attrs: self.attrs })
    }
}

fn insert_attr(attrs: &mut BTreeSet<String>, attr: &str) -> Result<(), Error> {
    if attr.is_empty() {
        return Err(Error::InvalidParam(1, "Attribute name is empty".to_string()));
    }
    if !attrs.insert(attr.to_owned()) {
        return Err(Error::InvalidParam(1, format!("Attribute '{attr}' already added")));
    }
    Ok(())
}

impl_json!(CredentialSchema, NonCredentialSchema);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::json::{JsonDecodable, JsonEncodable};

    #[test]
    fn credential_schema_builder() {
        let mut builder = CredentialSchema::builder();
        builder.add_attr("sex").unwrap().add_attr("name").unwrap().add_attr("age").unwrap();
        let schema = builder.finalize().unwrap();

        assert_eq!(schema.attrs().len(), 3);
        assert!(schema.attrs().contains("name"));

        let back = CredentialSchema::from_json(&schema.to_json().unwrap()).unwrap();
        assert_eq!(back, schema);
    }

    #[test]
    fn duplicate_and_empty_attrs_are_rejected() {
        let mut builder = CredentialSchema::builder();
        builder.add_attr("name").unwrap();
        assert!(matches!(builder.add_attr("name"), Err(Error::InvalidParam(..))));
        assert!(matches!(builder.add_attr(""), Err(Error::InvalidParam(..))));

        assert!(matches!(CredentialSchema::builder().finalize(), Err(Error::InvalidParam(..))));
    }

    #[test]
    fn non_credential_schema_builder() {
        let mut builder = NonCredentialSchema::builder();
        builder.add_attr(MASTER_SECRET).unwrap();
        let schema = builder.finalize().unwrap();
        assert!(schema.attrs().contains(MASTER_SECRET));
    }
}
