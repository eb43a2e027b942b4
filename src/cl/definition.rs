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

use super::{
    ciphersuites::CLCiphersuite,
    keys::{CredentialPrivateKey, CredentialPublicKey, KeyCorrectnessProof},
    schema::{
        CredentialSchema, CredentialSchemaBuilder, NonCredentialSchema, NonCredentialSchemaBuilder,
        MASTER_SECRET,
    },
};
use crate::{
    errors::Error,
    keys::pair::KeyPair,
    schemes::{algorithms::CL, generics::Issuer},
};
use log::trace;

/// Signature type tag used in credential definition ids.
pub const SIGNATURE_TYPE: &str = "CL";

const DELIMITER: &str = ":";
const MARKER: &str = "3";

/// Ledger style identifier of a credential definition,
/// `<did_method_id>:3:<signature_type>:<schema_id>:<tag>`.
pub fn credential_definition_id(did_method_id: &str, schema_id: u32, signature_type: &str, tag: &str) -> String {
    [did_method_id, MARKER, signature_type, &schema_id.to_string(), tag].join(DELIMITER)
}

/// Schemas, key pair and key correctness proof of one credential definition.
#[derive(Clone, Debug)]
pub struct CredentialDefinition<CS: CLCiphersuite> {
    schema: CredentialSchema,
    non_schema: NonCredentialSchema,
    keypair: KeyPair<CL<CS>>,
    key_correctness_proof: KeyCorrectnessProof,
}

impl<CS: CLCiphersuite> CredentialDefinition<CS> {
    pub fn builder() -> CredentialDefinitionBuilder {
        CredentialDefinitionBuilder::default()
    }

    pub fn schema(&self) -> &CredentialSchema {
        &self.schema
    }

    pub fn non_schema(&self) -> &NonCredentialSchema {
        &self.non_schema
    }

    pub fn keypair(&self) -> &KeyPair<CL<CS>> {
        &self.keypair
    }

    pub fn public_key(&self) -> &CredentialPublicKey {
        self.keypair.public_key()
    }

    pub fn private_key(&self) -> &CredentialPrivateKey {
        self.keypair.private_key()
    }

    pub fn key_correctness_proof(&self) -> &KeyCorrectnessProof {
        &self.key_correctness_proof
    }

    pub fn into_parts(self) -> (KeyPair<CL<CS>>, KeyCorrectnessProof) {
        (self.keypair, self.key_correctness_proof)
    }
}

/// Collects schema fields, then generates the keys in one step.
/// The master secret is always part of the non-credential schema.
#[derive(Clone, Debug, Default)]
pub struct CredentialDefinitionBuilder {
    schema: CredentialSchemaBuilder,
    non_schema: NonCredentialSchemaBuilder,
    has_master_secret: bool,
    support_revocation: bool,
}

impl CredentialDefinitionBuilder {
    pub fn add_schema_fields(&mut self, fields: &[&str]) -> Result<&mut Self, Error> {
        for field in fields {
            self.schema.add_attr(field)?;
        }
        Ok(self)
    }

    pub fn add_non_schema_field(&mut self, field: &str) -> Result<&mut Self, Error> {
        self.non_schema.add_attr(field)?;
        if field == MASTER_SECRET {
            self.has_master_secret = true;
        }
        Ok(self)
    }

    pub fn support_revocation(&mut self, support_revocation: bool) -> &mut Self {
        self.support_revocation = support_revocation;
        self
    }

    pub fn finalize<CS: CLCiphersuite>(mut self) -> Result<CredentialDefinition<CS>, Error> {
        trace!("CredentialDefinitionBuilder::finalize: >>> {:?}", self);

        if !self.has_master_secret {
            self.non_schema.add_attr(MASTER_SECRET)?;
        }
        let schema = self.schema.finalize()?;
        let non_schema = self.non_schema.finalize()?;

        let (keypair, key_correctness_proof) =
            Issuer::<CL<CS>>::new_credential_def(&schema, &non_schema, self.support_revocation)?;

        trace!("CredentialDefinitionBuilder::finalize: <<< key_correctness_proof: {:?}", key_correctness_proof);

        Ok(CredentialDefinition { schema, non_schema, keypair, key_correctness_proof })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cl::ciphersuites::CL1024Sha256;

    #[test]
    fn definition_id() {
        assert_eq!(
            credential_definition_id("NcYxiDXkpYi6ov5FcYDi1e", 14, SIGNATURE_TYPE, "tag"),
            "NcYxiDXkpYi6ov5FcYDi1e:3:CL:14:tag"
        );
    }

    #[test]
    fn finalize_adds_master_secret() {
        let mut builder = CredentialDefinition::<CL1024Sha256>::builder();
        builder.add_schema_fields(&["name", "age"]).unwrap();
        let definition = builder.finalize::<CL1024Sha256>().unwrap();

        assert_eq!(definition.schema().attrs().len(), 2);
        assert!(definition.non_schema().attrs().contains(MASTER_SECRET));
        assert!(definition.public_key().revocation_key().is_none());
        assert!(definition.public_key().primary_key().r.contains_key(MASTER_SECRET));
        definition
            .key_correctness_proof()
            .verify::<CL1024Sha256>(definition.public_key().primary_key())
            .unwrap();
    }

    #[test]
    fn explicit_master_secret_and_revocation() {
        let mut builder = CredentialDefinition::<CL1024Sha256>::builder();
        builder
            .add_schema_fields(&["name"])
            .unwrap()
            .add_non_schema_field(MASTER_SECRET)
            .unwrap()
            .support_revocation(true);
        let definition = builder.finalize::<CL1024Sha256>().unwrap();

        assert_eq!(definition.non_schema().attrs().len(), 1);
        assert!(definition.public_key().revocation_key().is_some());
    }

    #[test]
    fn definition_errors() {
        let builder = CredentialDefinition::<CL1024Sha256>::builder();
        assert!(matches!(builder.finalize::<CL1024Sha256>(), Err(Error::InvalidParam(1, _))));

        let mut builder = CredentialDefinition::<CL1024Sha256>::builder();
        assert!(builder.add_schema_fields(&["name", "name"]).is_err());

        let mut builder = CredentialDefinition::<CL1024Sha256>::builder();
        builder.add_schema_fields(&[MASTER_SECRET]).unwrap();
        assert!(matches!(builder.finalize::<CL1024Sha256>(), Err(Error::InvalidParam(2, _))));
    }
}
