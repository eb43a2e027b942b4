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
    keys::{CredentialPrimaryPublicKey, CredentialPublicKey, KeyCorrectnessProof},
    nonce::Nonce,
    values::{CredentialValue, CredentialValues},
};
use crate::{
    errors::Error,
    impl_json,
    schemes::{algorithms::CL, generics::Prover},
    utils::{
        encoding,
        random::random_bits,
        util::{hash_as_int, pedersen_commitment, IntegerExt},
    },
};
use bls12_381_plus::{G1Projective, Scalar};
use ff::Field;
use log::trace;
use rug::Integer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The prover's link secret, hidden in every credential it obtains.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct MasterSecret {
    #[serde(with = "encoding::integer")]
    pub(crate) ms: Integer,
}

impl MasterSecret {
    pub fn value(&self) -> &Integer {
        &self.ms
    }
}

/// What the issuer gets of the prover's hidden and committed values.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BlindedCredentialSecrets {
    #[serde(with = "encoding::integer")]
    pub(crate) u: Integer,
    pub(crate) ur: Option<G1Projective>,
    pub(crate) hidden_attributes: BTreeSet<String>,
    #[serde(with = "encoding::integer_map")]
    pub(crate) committed_attributes: BTreeMap<String, Integer>,
}

impl BlindedCredentialSecrets {
    pub fn hidden_attributes(&self) -> &BTreeSet<String> {
        &self.hidden_attributes
    }

    pub fn committed_attributes(&self) -> &BTreeMap<String, Integer> {
        &self.committed_attributes
    }
}

/// Kept by the prover to complete the signature.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CredentialSecretsBlindingFactors {
    #[serde(with = "encoding::integer")]
    pub(crate) v_prime: Integer,
    pub(crate) vr_prime: Option<Scalar>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BlindedCredentialSecretsCorrectnessProof {
    #[serde(with = "encoding::integer")]
    pub(crate) c: Integer,
    #[serde(with = "encoding::integer")]
    pub(crate) v_dash_cap: Integer,
    #[serde(with = "encoding::integer_map")]
    pub(crate) m_caps: BTreeMap<String, Integer>,
    #[serde(with = "encoding::integer_map")]
    pub(crate) r_caps: BTreeMap<String, Integer>,
}

impl<CS: CLCiphersuite> Prover<CL<CS>> {
    pub fn new_master_secret() -> MasterSecret {
        MasterSecret { ms: random_bits(CS::lms) }
    }

    /// Blinds the hidden and committed values of `values` under `pub_key`.
    ///
    /// `key_correctness_proof` is checked first, a key that fails it is `InvalidStructure`.
    pub fn blind_credential_secrets(
        pub_key: &CredentialPublicKey,
        key_correctness_proof: &KeyCorrectnessProof,
        values: &CredentialValues,
        nonce: &Nonce,
    ) -> Result<
        (
            BlindedCredentialSecrets,
            CredentialSecretsBlindingFactors,
            BlindedCredentialSecretsCorrectnessProof,
        ),
        Error,
    > {
        trace!(
            "Prover::blind_credential_secrets: >>> pub_key: {:?}, key_correctness_proof: {:?}, nonce: {:?}",
            pub_key,
            key_correctness_proof,
            nonce
        );

        let p_key = &pub_key.p_key;
        key_correctness_proof
            .verify::<CS>(p_key)
            .map_err(|err| Error::InvalidStructure(format!("Credential public key is not correct: {err}")))?;

        if let Some(attr) = p_key.r.keys().find(|attr| !values.attrs_values.contains_key(*attr)) {
            return Err(Error::InvalidStructure(format!("Value for attribute '{attr}' is missing")));
        }
        if let Some(attr) = values.attrs_values.keys().find(|attr| !p_key.r.contains_key(*attr)) {
            return Err(Error::InvalidStructure(format!("Attribute '{attr}' is not part of the credential key")));
        }

        let v_prime = random_bits(CS::lvprime);

        let mut u = p_key.s.mod_exp(&v_prime, &p_key.n)?;
        let mut hidden_attributes = BTreeSet::new();
        let mut committed_attributes = BTreeMap::new();
        for (attr, value) in values.attrs_values.iter() {
            let r = r_of(p_key, attr)?;
            match value {
                CredentialValue::Hidden { value } => {
                    u = Integer::from(u * r.mod_exp(value, &p_key.n)?) % &p_key.n;
                    hidden_attributes.insert(attr.to_owned());
                }
                CredentialValue::Commitment { value, blinding_factor } => {
                    u = Integer::from(u * r.mod_exp(value, &p_key.n)?) % &p_key.n;
                    let commitment = pedersen_commitment(&p_key.z, value, &p_key.s, blinding_factor, &p_key.n)?;
                    committed_attributes.insert(attr.to_owned(), commitment);
                }
                CredentialValue::Known { .. } => {}
            }
        }

        let (ur, vr_prime) = match pub_key.r_key {
            Some(ref r_key) => {
                let vr_prime = Scalar::random(&mut rand::thread_rng());
                (Some(r_key.h2 * vr_prime), Some(vr_prime))
            }
            None => (None, None),
        };

        let blinded = BlindedCredentialSecrets { u, ur, hidden_attributes, committed_attributes };
        let factors = CredentialSecretsBlindingFactors { v_prime, vr_prime };
        let proof = new_blinded_secrets_correctness_proof::<CS>(p_key, &blinded, &factors, values, nonce)?;

        trace!(
            "Prover::blind_credential_secrets: <<< blinded_secrets: {:?}, correctness_proof: {:?}",
            blinded,
            proof
        );

        Ok((blinded, factors, proof))
    }
}

fn r_of<'a>(p_key: &'a CredentialPrimaryPublicKey, attr: &str) -> Result<&'a Integer, Error> {
    p_key
        .r
        .get(attr)
        .ok_or_else(|| Error::InvalidStructure(format!("Value by key '{attr}' not found in pub_key.r")))
}

fn blinding_challenge<CS: CLCiphersuite>(
    blinded: &BlindedCredentialSecrets,
    u_tilde: &Integer,
    c_tildes: &BTreeMap<String, Integer>,
    nonce: &Nonce,
) -> Result<Integer, Error> {
    let mut values: Vec<Vec<u8>> = Vec::new();
    for (attr, commitment) in blinded.committed_attributes.iter() {
        let c_tilde = c_tildes
            .get(attr)
            .ok_or_else(|| Error::InvalidStructure(format!("No commitment proof for '{attr}'")))?;
        values.push(c_tilde.to_bytes_be());
        values.push(commitment.to_bytes_be());
    }
    values.push(blinded.u.to_bytes_be());
    values.push(u_tilde.to_bytes_be());
    values.push(nonce.to_bytes());
    Ok(hash_as_int::<CS::HashAlg>(&values))
}

fn new_blinded_secrets_correctness_proof<CS: CLCiphersuite>(
    p_key: &CredentialPrimaryPublicKey,
    blinded: &BlindedCredentialSecrets,
    factors: &CredentialSecretsBlindingFactors,
    values: &CredentialValues,
    nonce: &Nonce,
) -> Result<BlindedCredentialSecretsCorrectnessProof, Error> {
    let v_tilde = random_bits(CS::lvprime_tilde);

    let mut u_tilde = p_key.s.mod_exp(&v_tilde, &p_key.n)?;
    let mut m_tildes = BTreeMap::new();
    let mut r_tildes = BTreeMap::new();
    let mut c_tildes = BTreeMap::new();

    for (attr, value) in values.attrs_values.iter() {
        if value.is_known() {
            continue;
        }
        let m_tilde = random_bits(CS::lmtilde);
        let r = r_of(p_key, attr)?;
        u_tilde = Integer::from(u_tilde * r.mod_exp(&m_tilde, &p_key.n)?) % &p_key.n;

        // the same m~ opens the commitment, tying it to the exponent of r_i in u
        if value.is_commitment() {
            let r_tilde = random_bits(CS::lmtilde);
            let c_tilde = pedersen_commitment(&p_key.z, &m_tilde, &p_key.s, &r_tilde, &p_key.n)?;
            c_tildes.insert(attr.to_owned(), c_tilde);
            r_tildes.insert(attr.to_owned(), r_tilde);
        }
        m_tildes.insert(attr.to_owned(), m_tilde);
    }

    let c = blinding_challenge::<CS>(blinded, &u_tilde, &c_tildes, nonce)?;

    let v_dash_cap = Integer::from(&c * &factors.v_prime) + v_tilde;

    let mut m_caps = BTreeMap::new();
    let mut r_caps = BTreeMap::new();
    for (attr, m_tilde) in m_tildes {
        let value = values
            .get(&attr)
            .ok_or_else(|| Error::InvalidState(format!("Value for '{attr}' disappeared")))?;
        if let CredentialValue::Commitment { blinding_factor, .. } = value {
            let r_tilde = r_tildes
                .remove(&attr)
                .ok_or_else(|| Error::InvalidState(format!("No randomness for '{attr}'")))?;
            r_caps.insert(attr.clone(), Integer::from(&c * blinding_factor) + r_tilde);
        }
        m_caps.insert(attr, Integer::from(&c * value.value()) + m_tilde);
    }

    Ok(BlindedCredentialSecretsCorrectnessProof { c, v_dash_cap, m_caps, r_caps })
}

impl BlindedCredentialSecretsCorrectnessProof {
    /// Issuer side check of the proof against `nonce`; `ProofRejected` on mismatch.
    pub fn verify<CS: CLCiphersuite>(
        &self,
        p_key: &CredentialPrimaryPublicKey,
        blinded: &BlindedCredentialSecrets,
        nonce: &Nonce,
    ) -> Result<(), Error> {
        trace!("BlindedCredentialSecretsCorrectnessProof::verify: >>> proof: {:?}, nonce: {:?}", self, nonce);

        let proven: BTreeSet<&String> = blinded
            .hidden_attributes
            .iter()
            .chain(blinded.committed_attributes.keys())
            .collect();
        if proven.len() != self.m_caps.len() || !self.m_caps.keys().all(|attr| proven.contains(attr)) {
            return Err(Error::InvalidStructure("Blinded attributes do not match the proof".to_string()));
        }
        if !self.r_caps.keys().eq(blinded.committed_attributes.keys()) {
            return Err(Error::InvalidStructure("Committed attributes do not match the proof".to_string()));
        }

        let n = &p_key.n;

        // u^{-c} * s^{v_dash_cap} * prod r_i^{m_cap_i}, hidden and committed
        let mut u_cap = Integer::from(
            blinded.u.mod_inverse(n)?.mod_exp(&self.c, n)? * p_key.s.mod_exp(&self.v_dash_cap, n)?,
        ) % n;
        for (attr, m_cap) in self.m_caps.iter() {
            u_cap = Integer::from(u_cap * r_of(p_key, attr)?.mod_exp(m_cap, n)?) % n;
        }

        let mut c_caps = BTreeMap::new();
        for (attr, commitment) in blinded.committed_attributes.iter() {
            let c_inv = commitment.mod_inverse(n)?.mod_exp(&self.c, n)?;
            let opened = pedersen_commitment(&p_key.z, &self.m_caps[attr], &p_key.s, &self.r_caps[attr], n)?;
            c_caps.insert(attr.to_owned(), Integer::from(c_inv * opened) % n);
        }

        let c = blinding_challenge::<CS>(blinded, &u_cap, &c_caps, nonce)?;
        if c != self.c {
            return Err(Error::ProofRejected("Invalid blinded credential secrets correctness proof".to_string()));
        }

        trace!("BlindedCredentialSecretsCorrectnessProof::verify: <<<");
        Ok(())
    }
}

impl_json!(
    MasterSecret,
    BlindedCredentialSecrets,
    CredentialSecretsBlindingFactors,
    BlindedCredentialSecretsCorrectnessProof
);
