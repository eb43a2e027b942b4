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
    schema::{CredentialSchema, NonCredentialSchema},
};
use crate::{
    errors::Error,
    impl_json,
    keys::pair::KeyPair,
    schemes::{algorithms::CL, generics::Issuer},
    utils::{
        encoding,
        random::{gen_x, random_qr, random_safe_prime},
        util::{hash_as_int, IntegerExt},
    },
};
use bls12_381_plus::{G1Projective, G2Projective, Scalar};
use ff::Field;
use group::Group;
use log::trace;
use rug::Integer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CredentialPrimaryPublicKey {
    #[serde(with = "encoding::integer")]
    pub n: Integer,
    #[serde(with = "encoding::integer")]
    pub s: Integer,
    #[serde(with = "encoding::integer")]
    pub rctxt: Integer,
    #[serde(with = "encoding::integer_map")]
    pub r: BTreeMap<String, Integer>,
    #[serde(with = "encoding::integer")]
    pub z: Integer,
}

/// `p'` and `q'` of the safe primes `p = 2p'+1`, `q = 2q'+1`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CredentialPrimaryPrivateKey {
    #[serde(with = "encoding::integer")]
    pub(crate) p: Integer,
    #[serde(with = "encoding::integer")]
    pub(crate) q: Integer,
}

impl CredentialPrimaryPrivateKey {
    /// Order of the quadratic residues group, `p'q'`.
    pub(crate) fn order(&self) -> Integer {
        Integer::from(&self.p * &self.q)
    }
}

/// Discrete logs of the public bases to `s`, only needed for the key correctness proof.
struct CredentialPrimaryPublicKeyMetadata {
    xz: Integer,
    xrctxt: Integer,
    xr: BTreeMap<String, Integer>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CredentialRevocationPublicKey {
    pub g: G1Projective,
    pub g_dash: G2Projective,
    pub h: G1Projective,
    pub h0: G1Projective,
    pub h1: G1Projective,
    pub h2: G1Projective,
    pub htilde: G1Projective,
    pub h_cap: G2Projective,
    pub u: G2Projective,
    pub pk: G1Projective,
    pub y: G2Projective,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CredentialRevocationPrivateKey {
    pub(crate) x: Scalar,
    pub(crate) sk: Scalar,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CredentialPublicKey {
    pub(crate) p_key: CredentialPrimaryPublicKey,
    pub(crate) r_key: Option<CredentialRevocationPublicKey>,
}

impl CredentialPublicKey {
    pub fn primary_key(&self) -> &CredentialPrimaryPublicKey {
        &self.p_key
    }

    pub fn revocation_key(&self) -> Option<&CredentialRevocationPublicKey> {
        self.r_key.as_ref()
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CredentialPrivateKey {
    pub(crate) p_key: CredentialPrimaryPrivateKey,
    pub(crate) r_key: Option<CredentialRevocationPrivateKey>,
}

/// Proof that every base of the primary public key lies in the group generated by `s`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct KeyCorrectnessProof {
    #[serde(with = "encoding::integer")]
    pub(crate) c: Integer,
    #[serde(with = "encoding::integer")]
    pub(crate) xz_cap: Integer,
    #[serde(with = "encoding::integer")]
    pub(crate) xrctxt_cap: Integer,
    #[serde(with = "encoding::integer_map")]
    pub(crate) xr_cap: BTreeMap<String, Integer>,
}

impl<CS: CLCiphersuite> Issuer<CL<CS>> {
    /// Generates the credential key pair for `schema` and `non_schema` plus its correctness proof.
    pub fn new_credential_def(
        schema: &CredentialSchema,
        non_schema: &NonCredentialSchema,
        support_revocation: bool,
    ) -> Result<(KeyPair<CL<CS>>, KeyCorrectnessProof), Error> {
        KeyPair::<CL<CS>>::generate(schema, non_schema, support_revocation)
    }
}

impl<CS: CLCiphersuite> KeyPair<CL<CS>> {
    pub fn generate(
        schema: &CredentialSchema,
        non_schema: &NonCredentialSchema,
        support_revocation: bool,
    ) -> Result<(Self, KeyCorrectnessProof), Error> {
        trace!(
            "KeyPair::generate: >>> schema: {:?}, non_schema: {:?}, support_revocation: {}",
            schema,
            non_schema,
            support_revocation
        );

        if schema.attrs.is_empty() {
            return Err(Error::InvalidParam(1, "List of attributes is empty".to_string()));
        }
        if let Some(attr) = schema.attrs.intersection(&non_schema.attrs).next() {
            return Err(Error::InvalidParam(
                2,
                format!("Attribute '{attr}' is in both the credential and the non-credential schema"),
            ));
        }

        let (p_key, p_priv, meta) = new_primary_keys::<CS>(schema, non_schema)?;
        let proof = new_key_correctness_proof::<CS>(&p_key, &p_priv, &meta)?;

        let (r_key, r_priv) = if support_revocation {
            let (pk, sk) = new_revocation_keys();
            (Some(pk), Some(sk))
        } else {
            (None, None)
        };

        let keypair = Self {
            public: CredentialPublicKey { p_key, r_key },
            private: CredentialPrivateKey { p_key: p_priv, r_key: r_priv },
        };

        trace!("KeyPair::generate: <<< key_correctness_proof: {:?}", proof);

        Ok((keypair, proof))
    }
}

fn new_primary_keys<CS: CLCiphersuite>(
    schema: &CredentialSchema,
    non_schema: &NonCredentialSchema,
) -> Result<
    (
        CredentialPrimaryPublicKey,
        CredentialPrimaryPrivateKey,
        CredentialPrimaryPublicKeyMetadata,
    ),
    Error,
> {
    let qreps = CS::QSEC + 24; // "is_probably_prime" subtracts 24 from reps.
    let (p_safe, p) = random_safe_prime(CS::SECPARAM, qreps);
    let (q_safe, q) = loop {
        let (q_safe, q) = random_safe_prime(CS::SECPARAM, qreps);
        if q_safe != p_safe {
            break (q_safe, q);
        }
    };

    let n = Integer::from(&p_safe * &q_safe);
    let s = random_qr(&n);

    let mut xr = BTreeMap::new();
    let mut r = BTreeMap::new();
    for attr in schema.attrs.iter().chain(non_schema.attrs.iter()) {
        let x = gen_x(&p, &q);
        r.insert(attr.to_owned(), s.mod_exp(&x, &n)?);
        xr.insert(attr.to_owned(), x);
    }

    let xz = gen_x(&p, &q);
    let z = s.mod_exp(&xz, &n)?;
    let xrctxt = gen_x(&p, &q);
    let rctxt = s.mod_exp(&xrctxt, &n)?;

    Ok((
        CredentialPrimaryPublicKey { n, s, rctxt, r, z },
        CredentialPrimaryPrivateKey { p, q },
        CredentialPrimaryPublicKeyMetadata { xz, xrctxt, xr },
    ))
}

fn new_revocation_keys() -> (CredentialRevocationPublicKey, CredentialRevocationPrivateKey) {
    let mut rng = rand::thread_rng();

    let g = G1Projective::random(&mut rng);
    let g_dash = G2Projective::random(&mut rng);
    let h = G1Projective::random(&mut rng);
    let h0 = G1Projective::random(&mut rng);
    let h1 = G1Projective::random(&mut rng);
    let h2 = G1Projective::random(&mut rng);
    let htilde = G1Projective::random(&mut rng);
    let h_cap = G2Projective::random(&mut rng);
    let u = G2Projective::random(&mut rng);

    let x = Scalar::random(&mut rng);
    let sk = Scalar::random(&mut rng);

    let pk = g * sk;
    let y = h_cap * x;

    (
        CredentialRevocationPublicKey { g, g_dash, h, h0, h1, h2, htilde, h_cap, u, pk, y },
        CredentialRevocationPrivateKey { x, sk },
    )
}

fn key_proof_challenge<CS: CLCiphersuite>(
    p_key: &CredentialPrimaryPublicKey,
    z_tilde: &Integer,
    rctxt_tilde: &Integer,
    r_tilde: &BTreeMap<String, Integer>,
) -> Integer {
    let mut values: Vec<Vec<u8>> = Vec::new();
    values.push(p_key.z.to_bytes_be());
    values.extend(p_key.r.values().map(|r| r.to_bytes_be()));
    values.push(p_key.rctxt.to_bytes_be());
    values.push(z_tilde.to_bytes_be());
    values.extend(r_tilde.values().map(|r| r.to_bytes_be()));
    values.push(rctxt_tilde.to_bytes_be());
    hash_as_int::<CS::HashAlg>(&values)
}

fn new_key_correctness_proof<CS: CLCiphersuite>(
    p_key: &CredentialPrimaryPublicKey,
    p_priv: &CredentialPrimaryPrivateKey,
    meta: &CredentialPrimaryPublicKeyMetadata,
) -> Result<KeyCorrectnessProof, Error> {
    let xz_tilde = gen_x(&p_priv.p, &p_priv.q);
    let xrctxt_tilde = gen_x(&p_priv.p, &p_priv.q);
    let xr_tilde: BTreeMap<String, Integer> = p_key
        .r
        .keys()
        .map(|k| (k.to_owned(), gen_x(&p_priv.p, &p_priv.q)))
        .collect();

    let z_tilde = p_key.s.mod_exp(&xz_tilde, &p_key.n)?;
    let rctxt_tilde = p_key.s.mod_exp(&xrctxt_tilde, &p_key.n)?;
    let mut r_tilde = BTreeMap::new();
    for (k, x) in xr_tilde.iter() {
        r_tilde.insert(k.to_owned(), p_key.s.mod_exp(x, &p_key.n)?);
    }

    let c = key_proof_challenge::<CS>(p_key, &z_tilde, &rctxt_tilde, &r_tilde);

    let xz_cap = Integer::from(&c * &meta.xz) + &xz_tilde;
    let xrctxt_cap = Integer::from(&c * &meta.xrctxt) + &xrctxt_tilde;
    let mut xr_cap = BTreeMap::new();
    for (k, x_tilde) in xr_tilde {
        let xr = meta
            .xr
            .get(&k)
            .ok_or_else(|| Error::InvalidState(format!("No discrete log for attribute '{k}'")))?;
        xr_cap.insert(k, Integer::from(&c * xr) + x_tilde);
    }

    Ok(KeyCorrectnessProof { c, xz_cap, xrctxt_cap, xr_cap })
}

impl KeyCorrectnessProof {
    /// Recomputes the challenge from `p_key`; `ProofRejected` on mismatch.
    ///
    /// Only the primary key is covered. The revocation key elements are not bound by this proof
    /// and a change to them is not detected here.
    pub fn verify<CS: CLCiphersuite>(&self, p_key: &CredentialPrimaryPublicKey) -> Result<(), Error> {
        trace!("KeyCorrectnessProof::verify: >>> p_key: {:?}, proof: {:?}", p_key, self);

        // base^{-c} * s^{cap}
        let cap = |base: &Integer, x_cap: &Integer| -> Result<Integer, Error> {
            let inv = base.mod_inverse(&p_key.n)?;
            Ok(Integer::from(inv.mod_exp(&self.c, &p_key.n)? * p_key.s.mod_exp(x_cap, &p_key.n)?) % &p_key.n)
        };

        let z_cap = cap(&p_key.z, &self.xz_cap)?;
        let rctxt_cap = cap(&p_key.rctxt, &self.xrctxt_cap)?;

        if self.xr_cap.len() != p_key.r.len() {
            return Err(Error::InvalidStructure(
                "Key correctness proof does not cover every attribute".to_string(),
            ));
        }
        let mut r_cap = BTreeMap::new();
        for (k, r) in p_key.r.iter() {
            let xr_cap = self.xr_cap.get(k).ok_or_else(|| {
                Error::InvalidStructure(format!("Value by key '{k}' not found in key correctness proof"))
            })?;
            r_cap.insert(k.to_owned(), cap(r, xr_cap)?);
        }

        let c = key_proof_challenge::<CS>(p_key, &z_cap, &rctxt_cap, &r_cap);
        if c != self.c {
            return Err(Error::ProofRejected("Invalid credential key correctness proof".to_string()));
        }

        trace!("KeyCorrectnessProof::verify: <<<");
        Ok(())
    }
}

impl_json!(
    CredentialPublicKey,
    CredentialPrivateKey,
    CredentialPrimaryPublicKey,
    CredentialRevocationPublicKey,
    KeyCorrectnessProof
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cl::schema::MASTER_SECRET;
    use crate::schemes::algorithms::{Scheme, CL_CL1024_SHA256, CL_CL2048_SHA256, CL_CL3072_SHA256};
    use crate::utils::json::{JsonDecodable, JsonEncodable};

    fn schemas() -> (CredentialSchema, NonCredentialSchema) {
        let mut sb = CredentialSchema::builder();
        sb.add_attr("name").unwrap().add_attr("age").unwrap();
        let mut nb = NonCredentialSchema::builder();
        nb.add_attr(MASTER_SECRET).unwrap();
        (sb.finalize().unwrap(), nb.finalize().unwrap())
    }

    #[test]
    fn keypair_cl1024_sha256() {
        keypair::<CL_CL1024_SHA256>();
    }

    #[test]
    fn key_correctness_proof_cl1024_sha256() {
        key_correctness_proof::<CL_CL1024_SHA256>();
    }

    // safe prime generation at these sizes takes minutes
    #[test]
    #[ignore]
    fn key_correctness_proof_cl2048_sha256() {
        key_correctness_proof::<CL_CL2048_SHA256>();
    }

    #[test]
    #[ignore]
    fn key_correctness_proof_cl3072_sha256() {
        key_correctness_proof::<CL_CL3072_SHA256>();
    }

    fn keypair<S: Scheme>()
    where
        S::Ciphersuite: CLCiphersuite,
    {
        let (schema, non_schema) = schemas();
        let (keypair, _) =
            Issuer::<CL<S::Ciphersuite>>::new_credential_def(&schema, &non_schema, true).unwrap();

        let pk = keypair.public_key();
        let sk = keypair.private_key();
        let p_safe = Integer::from(&sk.p_key.p * 2) + 1;
        let q_safe = Integer::from(&sk.p_key.q * 2) + 1;
        assert_eq!(pk.p_key.n, p_safe * q_safe);
        assert_eq!(pk.p_key.r.len(), 3);
        assert!(pk.p_key.r.contains_key(MASTER_SECRET));
        assert!(pk.r_key.is_some() && sk.r_key.is_some());

        let rk = pk.r_key.as_ref().unwrap();
        assert_eq!(rk.pk, rk.g * sk.r_key.as_ref().unwrap().sk);

        let pk_back = CredentialPublicKey::from_json(&pk.to_json().unwrap()).unwrap();
        assert_eq!(&pk_back, pk);
        let json: serde_json::Value = serde_json::from_str(&pk.to_json().unwrap()).unwrap();
        assert!(json.get("p_key").is_some() && json.get("r_key").is_some());

        let (no_rev, _) =
            Issuer::<CL<S::Ciphersuite>>::new_credential_def(&schema, &non_schema, false).unwrap();
        assert!(no_rev.public_key().r_key.is_none());
    }

    fn key_correctness_proof<S: Scheme>()
    where
        S::Ciphersuite: CLCiphersuite,
    {
        let (schema, non_schema) = schemas();
        let (keypair, proof) =
            Issuer::<CL<S::Ciphersuite>>::new_credential_def(&schema, &non_schema, false).unwrap();
        let p_key = &keypair.public_key().p_key;

        proof.verify::<S::Ciphersuite>(p_key).unwrap();

        let proof_back = KeyCorrectnessProof::from_json(&proof.to_json().unwrap()).unwrap();
        proof_back.verify::<S::Ciphersuite>(p_key).unwrap();

        // flip the lowest bit of each public component
        let flip = |v: &Integer| Integer::from(v ^ 1u32);
        let mut mutated = Vec::new();
        let mut k = p_key.clone();
        k.z = flip(&k.z);
        mutated.push(k);
        let mut k = p_key.clone();
        k.s = flip(&k.s);
        mutated.push(k);
        let mut k = p_key.clone();
        k.rctxt = flip(&k.rctxt);
        mutated.push(k);
        let mut k = p_key.clone();
        let r = k.r.get_mut("age").unwrap();
        *r = flip(r);
        mutated.push(k);

        for k in mutated {
            assert!(proof.verify::<S::Ciphersuite>(&k).is_err());
        }
    }

    #[test]
    fn empty_schema_is_rejected() {
        let non_schema = NonCredentialSchema::builder().finalize().unwrap();
        let schema = CredentialSchema { attrs: Default::default() };
        let res = Issuer::<CL_CL1024_SHA256>::new_credential_def(&schema, &non_schema, false);
        assert!(matches!(res, Err(Error::InvalidParam(1, _))));
    }
}
