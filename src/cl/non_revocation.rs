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
    blind::{BlindedCredentialSecrets, BlindedCredentialSecretsCorrectnessProof},
    ciphersuites::CLCiphersuite,
    delta::RevocationRegistryDelta,
    keys::{CredentialRevocationPrivateKey, CredentialRevocationPublicKey},
    nonce::Nonce,
    registry::{RevocationKeyPrivate, RevocationKeyPublic, RevocationRegistry},
    signature::{sign_primary, CredentialSignature, SignatureCorrectnessProof},
    tails::TailsStore,
    values::CredentialValues,
    witness::Witness,
};
use crate::{
    errors::Error,
    impl_json,
    keys::pair::KeyPair,
    schemes::{algorithms::CL, generics::Issuer},
    utils::util::scalar_from_integer,
};
use bls12_381_plus::{multi_miller_loop, G1Affine, G1Projective, G2Prepared, G2Projective, Scalar};
use elliptic_curve::group::{Curve, Group};
use ff::Field;
use log::trace;
use rug::Integer;
use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct WitnessSignature {
    pub(crate) sigma_i: G2Projective,
    pub(crate) u_i: G2Projective,
    pub(crate) g_i: G1Projective,
}

/// Signature over the accumulator index `i`, checked by the prover against a [`Witness`].
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct NonRevocationCredentialSignature {
    pub(crate) sigma: G1Projective,
    pub(crate) c: Scalar,
    pub(crate) vr_prime_prime: Scalar,
    pub(crate) witness_signature: WitnessSignature,
    pub(crate) g_i: G1Projective,
    pub(crate) i: u32,
    pub(crate) m2: Scalar,
}

impl NonRevocationCredentialSignature {
    pub fn index(&self) -> u32 {
        self.i
    }
}

impl<CS: CLCiphersuite> Issuer<CL<CS>> {
    /// [`Issuer::sign_credential`] for a revocable credential at accumulator index `rev_idx`.
    ///
    /// The registry is updated last: if anything fails it is left untouched and every tail taken
    /// from `tails` has been put back.
    #[allow(clippy::too_many_arguments)]
    pub fn sign_credential_with_revoc<T: TailsStore + ?Sized>(
        prover_id: &str,
        blinded_secrets: &BlindedCredentialSecrets,
        blinded_secrets_proof: &BlindedCredentialSecretsCorrectnessProof,
        credential_nonce: &Nonce,
        credential_issuance_nonce: &Nonce,
        values: &CredentialValues,
        keypair: &KeyPair<CL<CS>>,
        rev_idx: u32,
        registry: &mut RevocationRegistry,
        rev_key_priv: &RevocationKeyPrivate,
        tails: &T,
    ) -> Result<(CredentialSignature, SignatureCorrectnessProof, RevocationRegistryDelta), Error> {
        trace!(
            "Issuer::sign_credential_with_revoc: >>> prover_id: {:?}, credential_nonce: {:?}, \
             credential_issuance_nonce: {:?}, values: {:?}, rev_idx: {}, registry: {:?}",
            prover_id,
            credential_nonce,
            credential_issuance_nonce,
            values,
            rev_idx,
            registry
        );

        registry.check_issuable(rev_idx)?;

        let (p_credential, proof) = sign_primary::<CS>(
            prover_id,
            Some(rev_idx),
            blinded_secrets,
            blinded_secrets_proof,
            credential_nonce,
            credential_issuance_nonce,
            values,
            keypair,
        )?;

        let r_pub = keypair.public.r_key.as_ref().ok_or_else(|| {
            Error::InvalidStructure("No revocation part present in credential public key".to_string())
        })?;
        let r_priv = keypair.private.r_key.as_ref().ok_or_else(|| {
            Error::InvalidStructure("No revocation part present in credential private key".to_string())
        })?;
        let ur = blinded_secrets.ur.ok_or_else(|| {
            Error::InvalidStructure("No revocation part present in blinded credential secrets".to_string())
        })?;

        let r_credential =
            new_non_revocation_signature(rev_idx, &p_credential.m_2, ur, r_pub, r_priv, rev_key_priv)?;

        let delta = registry.issue(rev_idx, tails)?;

        let signature = CredentialSignature { p_credential, r_credential: Some(r_credential) };

        trace!(
            "Issuer::sign_credential_with_revoc: <<< signature: {:?}, proof: {:?}, delta: {:?}",
            signature,
            proof,
            delta
        );

        Ok((signature, proof, delta))
    }
}

fn gamma_pow(gamma: &Scalar, i: u32) -> Scalar {
    gamma.pow_vartime(&[u64::from(i), 0, 0, 0])
}

fn new_non_revocation_signature(
    rev_idx: u32,
    m_2: &Integer,
    ur: G1Projective,
    r_pub: &CredentialRevocationPublicKey,
    r_priv: &CredentialRevocationPrivateKey,
    rev_key_priv: &RevocationKeyPrivate,
) -> Result<NonRevocationCredentialSignature, Error> {
    let mut rng = rand::thread_rng();
    let vr_prime_prime = Scalar::random(&mut rng);
    let c = Scalar::random(&mut rng);
    let m2 = scalar_from_integer(m_2);

    let gamma_i = gamma_pow(&rev_key_priv.gamma, rev_idx);
    let g_i = r_pub.g * gamma_i;

    let x_c_inv = Option::<Scalar>::from((r_priv.x + c).invert())
        .ok_or_else(|| Error::InvalidState("x + c is not invertible".to_string()))?;
    let sigma = (r_pub.h0 + r_pub.h1 * m2 + ur + g_i + r_pub.h2 * vr_prime_prime) * x_c_inv;

    let sk_gamma_inv = Option::<Scalar>::from((r_priv.sk + gamma_i).invert())
        .ok_or_else(|| Error::InvalidState("sk + gamma^i is not invertible".to_string()))?;
    let sigma_i = r_pub.g_dash * sk_gamma_inv;
    let u_i = r_pub.u * gamma_i;

    Ok(NonRevocationCredentialSignature {
        sigma,
        c,
        vr_prime_prime,
        witness_signature: WitnessSignature { sigma_i, u_i, g_i },
        g_i,
        i: rev_idx,
        m2,
    })
}

/// `e(a1, b1) == e(a2, b2)`
fn pairings_match(a1: &G1Projective, b1: &G2Projective, a2: &G1Projective, b2: &G2Projective) -> bool {
    let lhs: G1Affine = a1.to_affine();
    let rhs: G1Affine = (-a2).to_affine();
    let term1 = (&lhs, &G2Prepared::from(b1.to_affine()));
    let term2 = (&rhs, &G2Prepared::from(b2.to_affine()));
    multi_miller_loop(&[term1, term2]).final_exponentiation().is_identity().into()
}

/// Prover side check of a completed non-revocation signature against the registry.
pub(crate) fn test_witness_signature(
    r_credential: &NonRevocationCredentialSignature,
    m_2: &Integer,
    r_pub: &CredentialRevocationPublicKey,
    rev_key_pub: &RevocationKeyPublic,
    registry: &RevocationRegistry,
    witness: &Witness,
) -> Result<(), Error> {
    trace!("test_witness_signature: >>> index: {}", r_credential.i);

    if r_credential.m2 != scalar_from_integer(m_2) {
        return Err(Error::InvalidStructure("Credential context does not match the primary signature".to_string()));
    }
    if r_credential.g_i != r_credential.witness_signature.g_i {
        return Err(Error::InvalidStructure("Inconsistent g_i in the witness signature".to_string()));
    }

    // e(g_i, accum) / e(g, omega) == z
    let z_calc = multi_miller_loop(&[
        (&r_credential.g_i.to_affine(), &G2Prepared::from(registry.accum.to_affine())),
        (&(-r_pub.g).to_affine(), &G2Prepared::from(witness.omega.to_affine())),
    ])
    .final_exponentiation();
    if z_calc != rev_key_pub.z {
        return Err(Error::InvalidStructure("Witness does not match the accumulator".to_string()));
    }

    if !pairings_match(&(r_pub.pk + r_credential.g_i), &r_credential.witness_signature.sigma_i, &r_pub.g, &r_pub.g_dash) {
        return Err(Error::InvalidStructure("Invalid witness signature".to_string()));
    }

    let h = r_pub.h0 + r_pub.h1 * r_credential.m2 + r_pub.h2 * r_credential.vr_prime_prime + r_credential.g_i;
    if !pairings_match(&r_credential.sigma, &(r_pub.y + r_pub.h_cap * r_credential.c), &h, &r_pub.h_cap) {
        return Err(Error::InvalidStructure("Invalid non-revocation signature".to_string()));
    }

    trace!("test_witness_signature: <<<");
    Ok(())
}

impl_json!(NonRevocationCredentialSignature, WitnessSignature);
