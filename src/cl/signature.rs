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
    blind::{BlindedCredentialSecrets, BlindedCredentialSecretsCorrectnessProof, CredentialSecretsBlindingFactors},
    ciphersuites::CLCiphersuite,
    keys::{CredentialPrimaryPublicKey, CredentialPublicKey},
    non_revocation::{test_witness_signature, NonRevocationCredentialSignature},
    nonce::Nonce,
    registry::{RevocationKeyPublic, RevocationRegistry},
    values::{encode_attribute, CredentialValue, CredentialValues},
    witness::Witness,
};
use crate::{
    errors::Error,
    impl_json,
    keys::pair::KeyPair,
    schemes::{
        algorithms::CL,
        generics::{Issuer, Prover},
    },
    utils::{
        encoding,
        random::{is_prime, random_bits, random_number, random_prime_in_range},
        util::{divm, hash_as_int, IntegerExt},
    },
};
use log::trace;
use rug::Integer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// CL signature `(e, A, v)` over the attributes and the credential context `m_2`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PrimaryCredentialSignature {
    #[serde(with = "encoding::integer")]
    pub(crate) m_2: Integer,
    #[serde(with = "encoding::integer")]
    pub(crate) a: Integer,
    #[serde(with = "encoding::integer")]
    pub(crate) e: Integer,
    #[serde(with = "encoding::integer")]
    pub(crate) v: Integer,
}

impl PrimaryCredentialSignature {
    pub fn m_2(&self) -> &Integer {
        &self.m_2
    }

    pub fn a(&self) -> &Integer {
        &self.a
    }

    pub fn e(&self) -> &Integer {
        &self.e
    }

    pub fn v(&self) -> &Integer {
        &self.v
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CredentialSignature {
    pub(crate) p_credential: PrimaryCredentialSignature,
    pub(crate) r_credential: Option<NonRevocationCredentialSignature>,
}

impl CredentialSignature {
    pub fn primary_credential(&self) -> &PrimaryCredentialSignature {
        &self.p_credential
    }

    pub fn non_revocation_credential(&self) -> Option<&NonRevocationCredentialSignature> {
        self.r_credential.as_ref()
    }

    /// Accumulator index of a revocable credential.
    pub fn extract_index(&self) -> Option<u32> {
        self.r_credential.as_ref().map(|r| r.i)
    }
}

/// Proof that `A` was computed as `Q^{e^{-1}}`, bound to the issuance nonce.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SignatureCorrectnessProof {
    #[serde(with = "encoding::integer")]
    pub(crate) se: Integer,
    #[serde(with = "encoding::integer")]
    pub(crate) c: Integer,
}

impl<CS: CLCiphersuite> Issuer<CL<CS>> {
    /// Signs the known values of `values` together with the prover's blinded secrets.
    ///
    /// `blinded_secrets_proof` is checked against `credential_nonce`, failure is `InvalidStructure`.
    /// The returned correctness proof is bound to `credential_issuance_nonce`.
    #[allow(clippy::too_many_arguments)]
    pub fn sign_credential(
        prover_id: &str,
        blinded_secrets: &BlindedCredentialSecrets,
        blinded_secrets_proof: &BlindedCredentialSecretsCorrectnessProof,
        credential_nonce: &Nonce,
        credential_issuance_nonce: &Nonce,
        values: &CredentialValues,
        keypair: &KeyPair<CL<CS>>,
    ) -> Result<(CredentialSignature, SignatureCorrectnessProof), Error> {
        trace!(
            "Issuer::sign_credential: >>> prover_id: {:?}, blinded_secrets: {:?}, credential_nonce: {:?}, \
             credential_issuance_nonce: {:?}, values: {:?}",
            prover_id,
            blinded_secrets,
            credential_nonce,
            credential_issuance_nonce,
            values
        );

        let (p_credential, proof) = sign_primary::<CS>(
            prover_id,
            None,
            blinded_secrets,
            blinded_secrets_proof,
            credential_nonce,
            credential_issuance_nonce,
            values,
            keypair,
        )?;
        let signature = CredentialSignature { p_credential, r_credential: None };

        trace!("Issuer::sign_credential: <<< signature: {:?}, proof: {:?}", signature, proof);

        Ok((signature, proof))
    }
}

/// `m_2 = H(enc(prover_id) || enc(rev_idx or -1))`
pub(crate) fn credential_context<CS: CLCiphersuite>(prover_id: &str, rev_idx: Option<u32>) -> Result<Integer, Error> {
    let rev_idx = rev_idx.map(i64::from).unwrap_or(-1);
    let encode = |raw: String| -> Result<Integer, Error> {
        let encoded = encode_attribute(&Value::String(raw));
        Integer::from_str_radix(&encoded, 10)
            .map_err(|err| Error::InvalidState(format!("Attribute encoding is not decimal: {err}")))
    };
    let prover_id = encode(prover_id.to_owned())?;
    let rev_idx = encode(rev_idx.to_string())?;

    let mut bytes = prover_id.to_bytes_be();
    bytes.extend(rev_idx.to_bytes_be());
    Ok(hash_as_int::<CS::HashAlg>(&[bytes]))
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn sign_primary<CS: CLCiphersuite>(
    prover_id: &str,
    rev_idx: Option<u32>,
    blinded_secrets: &BlindedCredentialSecrets,
    blinded_secrets_proof: &BlindedCredentialSecretsCorrectnessProof,
    credential_nonce: &Nonce,
    credential_issuance_nonce: &Nonce,
    values: &CredentialValues,
    keypair: &KeyPair<CL<CS>>,
) -> Result<(PrimaryCredentialSignature, SignatureCorrectnessProof), Error> {
    let p_pub = &keypair.public.p_key;
    let p_priv = &keypair.private.p_key;

    blinded_secrets_proof
        .verify::<CS>(p_pub, blinded_secrets, credential_nonce)
        .map_err(|err| Error::InvalidStructure(format!("Blinded credential secrets are not correct: {err}")))?;

    for attr in values.attrs_values.iter().filter(|(_, v)| v.is_known()).map(|(attr, _)| attr) {
        if blinded_secrets.hidden_attributes.contains(attr) || blinded_secrets.committed_attributes.contains_key(attr) {
            return Err(Error::InvalidStructure(format!("Attribute '{attr}' is both known and blinded")));
        }
    }
    let covered = |attr: &String| {
        matches!(values.get(attr), Some(v) if v.is_known())
            || blinded_secrets.hidden_attributes.contains(attr)
            || blinded_secrets.committed_attributes.contains_key(attr)
    };
    if let Some(attr) = p_pub.r.keys().find(|attr| !covered(*attr)) {
        return Err(Error::InvalidStructure(format!("Value for attribute '{attr}' is missing")));
    }

    let m_2 = credential_context::<CS>(prover_id, rev_idx)?;

    let v_prime_prime = random_bits(CS::lvprime_prime) | (Integer::from(1) << (CS::lvprime_prime - 1));
    let e_start = Integer::from(1) << CS::le_start;
    let e_end = Integer::from(&e_start + (Integer::from(1) << CS::le_range));
    let e = random_prime_in_range(&e_start, &e_end)?;

    let q = primary_q(p_pub, values, Some(&blinded_secrets.u), &m_2, &v_prime_prime, |v| v.is_known())?;

    let n_prime = p_priv.order();
    let e_inverse = e.mod_inverse(&n_prime)?;
    let a = q.mod_exp(&e_inverse, &p_pub.n)?;

    let proof = new_signature_correctness_proof::<CS>(p_pub, &n_prime, &q, &a, &e_inverse, credential_issuance_nonce)?;

    Ok((PrimaryCredentialSignature { m_2, a, e, v: v_prime_prime }, proof))
}

/// `Q = z / (s^v * u * rctxt^{m_2} * prod r_i^{m_i})` over the selected values.
fn primary_q(
    p_pub: &CredentialPrimaryPublicKey,
    values: &CredentialValues,
    u: Option<&Integer>,
    m_2: &Integer,
    v: &Integer,
    select: impl Fn(&CredentialValue) -> bool,
) -> Result<Integer, Error> {
    let n = &p_pub.n;

    let mut rx = Integer::from(p_pub.s.mod_exp(v, n)? * p_pub.rctxt.mod_exp(m_2, n)?) % n;
    if let Some(u) = u {
        rx = Integer::from(rx * u) % n;
    }
    for (attr, value) in values.attrs_values.iter().filter(|(_, v)| select(v)) {
        let r = p_pub
            .r
            .get(attr)
            .ok_or_else(|| Error::InvalidStructure(format!("Value by key '{attr}' not found in pub_key.r")))?;
        rx = Integer::from(rx * r.mod_exp(value.value(), n)?) % n;
    }

    divm(&p_pub.z, &rx, n)
}

fn signature_challenge<CS: CLCiphersuite>(q: &Integer, a: &Integer, a_cap: &Integer, nonce: &Nonce) -> Integer {
    hash_as_int::<CS::HashAlg>(&[q.to_bytes_be(), a.to_bytes_be(), a_cap.to_bytes_be(), nonce.to_bytes()])
}

fn new_signature_correctness_proof<CS: CLCiphersuite>(
    p_pub: &CredentialPrimaryPublicKey,
    n_prime: &Integer,
    q: &Integer,
    a: &Integer,
    e_inverse: &Integer,
    nonce: &Nonce,
) -> Result<SignatureCorrectnessProof, Error> {
    let r = random_number(n_prime);
    let a_cap = q.mod_exp(&r, &p_pub.n)?;

    let c = signature_challenge::<CS>(q, a, &a_cap, nonce);

    let mut se = Integer::from(r - Integer::from(&c * e_inverse)) % n_prime;
    if se < 0 {
        se += n_prime;
    }

    Ok(SignatureCorrectnessProof { se, c })
}

impl SignatureCorrectnessProof {
    /// Prover side check of a completed primary signature (`v = v' + v''`) over all `values`.
    pub fn verify<CS: CLCiphersuite>(
        &self,
        p_pub: &CredentialPrimaryPublicKey,
        signature: &PrimaryCredentialSignature,
        values: &CredentialValues,
        nonce: &Nonce,
    ) -> Result<(), Error> {
        trace!("SignatureCorrectnessProof::verify: >>> proof: {:?}, nonce: {:?}", self, nonce);

        if !is_prime(&signature.e) {
            return Err(Error::InvalidStructure("Invalid signature: e is not prime".to_string()));
        }

        let n = &p_pub.n;
        let q = primary_q(p_pub, values, None, &signature.m_2, &signature.v, |_| true)?;
        if q != signature.a.mod_exp(&signature.e, n)? {
            return Err(Error::ProofRejected("Invalid signature correctness proof: q != a^e".to_string()));
        }

        let degree = Integer::from(&self.c + Integer::from(&self.se * &signature.e));
        let a_cap = signature.a.mod_exp(&degree, n)?;

        if signature_challenge::<CS>(&q, &signature.a, &a_cap, nonce) != self.c {
            return Err(Error::ProofRejected("Invalid signature correctness proof".to_string()));
        }

        trace!("SignatureCorrectnessProof::verify: <<<");
        Ok(())
    }
}

impl<CS: CLCiphersuite> Prover<CL<CS>> {
    /// Completes a signature received from the issuer.
    ///
    /// Checks the correctness proof against `nonce` (the issuance nonce) and, for a revocable
    /// credential, the witness equations against the registry. `signature` is only updated when
    /// every check passes.
    #[allow(clippy::too_many_arguments)]
    pub fn process_credential_signature(
        signature: &mut CredentialSignature,
        values: &CredentialValues,
        proof: &SignatureCorrectnessProof,
        factors: &CredentialSecretsBlindingFactors,
        pub_key: &CredentialPublicKey,
        nonce: &Nonce,
        rev_key_pub: Option<&RevocationKeyPublic>,
        registry: Option<&RevocationRegistry>,
        witness: Option<&Witness>,
    ) -> Result<(), Error> {
        trace!(
            "Prover::process_credential_signature: >>> signature: {:?}, proof: {:?}, nonce: {:?}",
            signature,
            proof,
            nonce
        );

        let mut p_credential = signature.p_credential.clone();
        p_credential.v += &factors.v_prime;
        proof.verify::<CS>(&pub_key.p_key, &p_credential, values, nonce)?;

        let r_credential = match (signature.r_credential.as_ref(), factors.vr_prime) {
            (Some(r_credential), Some(vr_prime)) => {
                let mut r_credential = r_credential.clone();
                r_credential.vr_prime_prime += vr_prime;

                let r_key = pub_key.r_key.as_ref().ok_or_else(|| {
                    Error::InvalidStructure("No revocation part present in credential public key".to_string())
                })?;
                let missing = |what: &str| Error::InvalidStructure(format!("{what} is required for a revocable credential"));
                test_witness_signature(
                    &r_credential,
                    &p_credential.m_2,
                    r_key,
                    rev_key_pub.ok_or_else(|| missing("Revocation key"))?,
                    registry.ok_or_else(|| missing("Revocation registry"))?,
                    witness.ok_or_else(|| missing("Witness"))?,
                )?;
                Some(r_credential)
            }
            (None, _) => None,
            (Some(_), None) => {
                return Err(Error::InvalidStructure(
                    "No revocation blinding factor for a revocable credential".to_string(),
                ))
            }
        };

        signature.p_credential = p_credential;
        signature.r_credential = r_credential;

        trace!("Prover::process_credential_signature: <<< signature: {:?}", signature);

        Ok(())
    }
}

impl_json!(CredentialSignature, PrimaryCredentialSignature, SignatureCorrectnessProof);
