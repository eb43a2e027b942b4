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

#![allow(non_camel_case_types)]

#[cfg(test)]
mod issuance_tests {

    use anoncreds_cl::{
        cl::{
            blind::{
                BlindedCredentialSecrets, BlindedCredentialSecretsCorrectnessProof, CredentialSecretsBlindingFactors,
                MasterSecret,
            },
            ciphersuites::CLCiphersuite,
            definition::CredentialDefinition,
            keys::KeyCorrectnessProof,
            nonce::Nonce,
            schema::MASTER_SECRET,
            signature::{CredentialSignature, SignatureCorrectnessProof},
            values::{encode_attribute, CredentialValue, CredentialValues},
        },
        errors::Error,
        keys::pair::KeyPair,
        schemes::{
            algorithms::{Scheme, CL, CL_CL1024_SHA256, CL_CL2048_SHA256},
            generics::{Issuer, Prover},
        },
        utils::json::{JsonDecodable, JsonEncodable},
    };
    use serde_json::json;

    const PROVER_ID: &str = "CnEDk9HrMnmiHXEV1WFgbVCRteYnPqsJwrTdcZaNhFVW";
    const NAME: &str = "1139481716457488690172217916278103335";

    fn init() {
        dotenvy::dotenv().ok();
        let _ = env_logger::builder().is_test(true).try_init();
    }

    struct Session<CS: CLCiphersuite> {
        keypair: KeyPair<CL<CS>>,
        kcp: KeyCorrectnessProof,
        prover_values: CredentialValues,
        issuer_values: CredentialValues,
        blinded: BlindedCredentialSecrets,
        factors: CredentialSecretsBlindingFactors,
        blinded_proof: BlindedCredentialSecretsCorrectnessProof,
        nonce: Nonce,
    }

    fn open_session<S: Scheme>(ms: &MasterSecret) -> Session<S::Ciphersuite>
    where
        S::Ciphersuite: CLCiphersuite,
    {
        let mut builder = CredentialDefinition::<S::Ciphersuite>::builder();
        builder.add_schema_fields(&["name", "age"]).unwrap();
        let (keypair, kcp) = builder.finalize::<S::Ciphersuite>().unwrap().into_parts();

        let mut pb = CredentialValues::builder();
        pb.add_value(MASTER_SECRET, CredentialValue::Hidden { value: ms.value().clone() })
            .unwrap()
            .add_dec_known("name", NAME)
            .unwrap()
            .add_dec_commitment("age", &encode_attribute(&json!(25)), "1234567890")
            .unwrap();
        let prover_values = pb.finalize().unwrap();

        let mut ib = CredentialValues::builder();
        ib.add_dec_known("name", NAME).unwrap();
        let issuer_values = ib.finalize().unwrap();

        let nonce = Nonce::new::<S::Ciphersuite>();
        let (blinded, factors, blinded_proof) = Prover::<CL<S::Ciphersuite>>::blind_credential_secrets(
            keypair.public_key(),
            &kcp,
            &prover_values,
            &nonce,
        )
        .unwrap();

        Session { keypair, kcp, prover_values, issuer_values, blinded, factors, blinded_proof, nonce }
    }

    //FULL ISSUANCE

    #[test]
    fn issuance_cl1024_sha256() {
        issuance::<CL_CL1024_SHA256>();
    }

    #[test]
    #[ignore]
    fn issuance_cl2048_sha256() {
        issuance::<CL_CL2048_SHA256>();
    }

    fn issuance<S: Scheme>()
    where
        S::Ciphersuite: CLCiphersuite,
    {
        init();
        let ms = Prover::<CL<S::Ciphersuite>>::new_master_secret();
        let s = open_session::<S>(&ms);

        s.kcp.verify::<S::Ciphersuite>(s.keypair.public_key().primary_key()).unwrap();
        s.blinded_proof
            .verify::<S::Ciphersuite>(s.keypair.public_key().primary_key(), &s.blinded, &s.nonce)
            .unwrap();
        assert!(s.blinded.hidden_attributes().contains(MASTER_SECRET));
        assert!(s.blinded.committed_attributes().contains_key("age"));

        let issuance_nonce = Nonce::new::<S::Ciphersuite>();
        let (mut signature, proof) = Issuer::<CL<S::Ciphersuite>>::sign_credential(
            PROVER_ID,
            &s.blinded,
            &s.blinded_proof,
            &s.nonce,
            &issuance_nonce,
            &s.issuer_values,
            &s.keypair,
        )
        .unwrap();
        assert!(signature.non_revocation_credential().is_none());

        Prover::<CL<S::Ciphersuite>>::process_credential_signature(
            &mut signature,
            &s.prover_values,
            &proof,
            &s.factors,
            s.keypair.public_key(),
            &issuance_nonce,
            None,
            None,
            None,
        )
        .unwrap();
    }

    //INTERCHANGE

    #[test]
    fn json_round_trip_keeps_proofs_valid() {
        init();
        let ms = Prover::<CL_CL1024_SHA256>::new_master_secret();
        let ms_back = MasterSecret::from_json(&ms.to_json().unwrap()).unwrap();
        assert_eq!(ms_back.value(), ms.value());

        let s = open_session::<CL_CL1024_SHA256>(&ms_back);

        let keypair = KeyPair::<CL_CL1024_SHA256>::from_json(&s.keypair.to_json().unwrap()).unwrap();
        assert_eq!(keypair, s.keypair);
        let kcp = KeyCorrectnessProof::from_json(&s.kcp.to_json().unwrap()).unwrap();
        kcp.verify::<<CL_CL1024_SHA256 as Scheme>::Ciphersuite>(keypair.public_key().primary_key()).unwrap();

        let blinded = BlindedCredentialSecrets::from_json(&s.blinded.to_json().unwrap()).unwrap();
        let blinded_proof =
            BlindedCredentialSecretsCorrectnessProof::from_json(&s.blinded_proof.to_json().unwrap()).unwrap();
        let nonce = Nonce::from_json(&s.nonce.to_json().unwrap()).unwrap();
        assert_eq!(nonce, s.nonce);
        let issuer_values = CredentialValues::from_json(&s.issuer_values.to_json().unwrap()).unwrap();
        assert_eq!(issuer_values, s.issuer_values);

        let issuance_nonce = Nonce::new::<<CL_CL1024_SHA256 as Scheme>::Ciphersuite>();
        let (signature, proof) = Issuer::<CL_CL1024_SHA256>::sign_credential(
            PROVER_ID,
            &blinded,
            &blinded_proof,
            &nonce,
            &issuance_nonce,
            &issuer_values,
            &keypair,
        )
        .unwrap();

        let mut signature = CredentialSignature::from_json(&signature.to_json().unwrap()).unwrap();
        let proof = SignatureCorrectnessProof::from_json(&proof.to_json().unwrap()).unwrap();
        let factors = CredentialSecretsBlindingFactors::from_json(&s.factors.to_json().unwrap()).unwrap();

        Prover::<CL_CL1024_SHA256>::process_credential_signature(
            &mut signature,
            &s.prover_values,
            &proof,
            &factors,
            keypair.public_key(),
            &issuance_nonce,
            None,
            None,
            None,
        )
        .unwrap();
    }

    #[test]
    fn keypair_file_round_trip() {
        init();
        let ms = Prover::<CL_CL1024_SHA256>::new_master_secret();
        let s = open_session::<CL_CL1024_SHA256>(&ms);

        let path = std::env::temp_dir().join(format!("anoncreds-cl-keypair-{}.json", std::process::id()));
        s.keypair.write_keypair_to_file(&path).unwrap();
        let read = KeyPair::<CL_CL1024_SHA256>::read_keypair_from_file(&path);
        std::fs::remove_file(&path).unwrap();
        let keypair = read.unwrap();

        assert_eq!(keypair, s.keypair);
        s.kcp
            .verify::<<CL_CL1024_SHA256 as Scheme>::Ciphersuite>(keypair.public_key().primary_key())
            .unwrap();

        let (sk, pk) = keypair.into_parts();
        assert_eq!(&sk, s.keypair.private_key());
        assert_eq!(&pk, s.keypair.public_key());

        let res = KeyPair::<CL_CL1024_SHA256>::read_keypair_from_file(&path);
        assert!(matches!(res, Err(Error::IOError(_))));
    }

    //NONCE TAMPERING

    fn bump_last_digit(nonce: &Nonce) -> Nonce {
        let mut dec = nonce.to_dec();
        let last = dec.pop().and_then(|c| c.to_digit(10)).unwrap();
        dec.push(char::from_digit((last + 1) % 10, 10).unwrap());
        Nonce::from_dec(&dec).unwrap()
    }

    #[test]
    fn tampered_blinding_nonce_is_rejected() {
        init();
        let ms = Prover::<CL_CL1024_SHA256>::new_master_secret();
        let s = open_session::<CL_CL1024_SHA256>(&ms);
        let tampered = bump_last_digit(&s.nonce);

        let res = s.blinded_proof.verify::<<CL_CL1024_SHA256 as Scheme>::Ciphersuite>(
            s.keypair.public_key().primary_key(),
            &s.blinded,
            &tampered,
        );
        assert!(matches!(res, Err(Error::ProofRejected(_))));

        // the issuer reports a stale blinding as a structural problem
        let res = Issuer::<CL_CL1024_SHA256>::sign_credential(
            PROVER_ID,
            &s.blinded,
            &s.blinded_proof,
            &tampered,
            &s.nonce,
            &s.issuer_values,
            &s.keypair,
        );
        assert!(matches!(res, Err(Error::InvalidStructure(_))));
    }

    #[test]
    fn tampered_issuance_nonce_is_rejected() {
        init();
        let ms = Prover::<CL_CL1024_SHA256>::new_master_secret();
        let s = open_session::<CL_CL1024_SHA256>(&ms);
        let issuance_nonce = Nonce::new::<<CL_CL1024_SHA256 as Scheme>::Ciphersuite>();
        let (mut signature, proof) = Issuer::<CL_CL1024_SHA256>::sign_credential(
            PROVER_ID,
            &s.blinded,
            &s.blinded_proof,
            &s.nonce,
            &issuance_nonce,
            &s.issuer_values,
            &s.keypair,
        )
        .unwrap();

        let res = Prover::<CL_CL1024_SHA256>::process_credential_signature(
            &mut signature,
            &s.prover_values,
            &proof,
            &s.factors,
            s.keypair.public_key(),
            &bump_last_digit(&issuance_nonce),
            None,
            None,
            None,
        );
        assert!(matches!(res, Err(Error::ProofRejected(_))));
    }

    #[test]
    fn foreign_key_proof_is_refused_by_the_prover() {
        init();
        let ms = Prover::<CL_CL1024_SHA256>::new_master_secret();
        let s = open_session::<CL_CL1024_SHA256>(&ms);
        let other = open_session::<CL_CL1024_SHA256>(&ms);

        let res = Prover::<CL_CL1024_SHA256>::blind_credential_secrets(
            s.keypair.public_key(),
            &other.kcp,
            &s.prover_values,
            &s.nonce,
        );
        assert!(matches!(res, Err(Error::InvalidStructure(_))));
    }

    #[test]
    fn values_must_match_the_schema() {
        init();
        let ms = Prover::<CL_CL1024_SHA256>::new_master_secret();
        let s = open_session::<CL_CL1024_SHA256>(&ms);

        let mut pb = CredentialValues::builder();
        pb.add_value(MASTER_SECRET, CredentialValue::Hidden { value: ms.value().clone() })
            .unwrap()
            .add_dec_known("name", NAME)
            .unwrap();
        let missing_age = pb.finalize().unwrap();

        let res = Prover::<CL_CL1024_SHA256>::blind_credential_secrets(
            s.keypair.public_key(),
            &s.kcp,
            &missing_age,
            &s.nonce,
        );
        assert!(matches!(res, Err(Error::InvalidStructure(_))));

        let mut ib = CredentialValues::builder();
        ib.add_dec_known("name", NAME).unwrap().add_dec_known("nickname", "7").unwrap();
        let foreign = ib.finalize().unwrap();
        let res = Issuer::<CL_CL1024_SHA256>::sign_credential(
            PROVER_ID,
            &s.blinded,
            &s.blinded_proof,
            &s.nonce,
            &s.nonce,
            &foreign,
            &s.keypair,
        );
        assert!(matches!(res, Err(Error::InvalidStructure(_))));
    }
}
