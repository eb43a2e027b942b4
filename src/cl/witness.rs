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
    delta::RevocationRegistryDelta,
    tails::{TailGuard, TailsStore},
};
use crate::{errors::Error, impl_json};
use bls12_381_plus::G2Projective;
use group::Group;
use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Prover's membership witness, `omega = sum_{j in V, j != i} g_dash * gamma^{L+1-j+i}`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Witness {
    pub(crate) omega: G2Projective,
}

impl Witness {
    /// Builds the witness of `rev_idx` from the delta of the registry since its creation.
    pub fn new<T: TailsStore + ?Sized>(
        rev_idx: u32,
        max_cred_num: u32,
        delta: &RevocationRegistryDelta,
        tails: &T,
    ) -> Result<Self, Error> {
        trace!("Witness::new: >>> rev_idx: {}, max_cred_num: {}, delta: {:?}", rev_idx, max_cred_num, delta);

        check_index(rev_idx, max_cred_num)?;
        if !bool::from(delta.prev_accum.is_identity()) {
            return Err(Error::InvalidState(
                "A witness is built from the delta since the creation of the registry".to_string(),
            ));
        }
        if !delta.issued.contains(&rev_idx) {
            return Err(Error::CredentialRevoked(rev_idx));
        }

        let omega = sum_tails(rev_idx, max_cred_num, &delta.issued, tails)?;
        let witness = Witness { omega };

        trace!("Witness::new: <<< witness: {:?}", witness);

        Ok(witness)
    }

    /// Moves the witness of `rev_idx` forward by `delta`. On error the witness is unchanged.
    pub fn update<T: TailsStore + ?Sized>(
        &mut self,
        rev_idx: u32,
        max_cred_num: u32,
        delta: &RevocationRegistryDelta,
        tails: &T,
    ) -> Result<(), Error> {
        trace!("Witness::update: >>> rev_idx: {}, delta: {:?}", rev_idx, delta);

        check_index(rev_idx, max_cred_num)?;
        if delta.revoked.contains(&rev_idx) {
            return Err(Error::CredentialRevoked(rev_idx));
        }

        let num = sum_tails(rev_idx, max_cred_num, &delta.issued, tails)?;
        let denom = sum_tails(rev_idx, max_cred_num, &delta.revoked, tails)?;
        self.omega += num - denom;

        trace!("Witness::update: <<< witness: {:?}", self);

        Ok(())
    }

    pub fn omega(&self) -> &G2Projective {
        &self.omega
    }
}

fn check_index(rev_idx: u32, max_cred_num: u32) -> Result<(), Error> {
    if !(1..=max_cred_num).contains(&rev_idx) {
        return Err(Error::InvalidRevocationAccumulatorIndex(rev_idx));
    }
    Ok(())
}

fn sum_tails<T: TailsStore + ?Sized>(
    rev_idx: u32,
    max_cred_num: u32,
    indices: &BTreeSet<u32>,
    tails: &T,
) -> Result<G2Projective, Error> {
    let mut sum = G2Projective::identity();
    for j in indices.iter().filter(|j| **j != rev_idx) {
        check_index(*j, max_cred_num)?;
        let guard = TailGuard::take(tails, max_cred_num + 1 - j + rev_idx)?;
        sum += guard.point();
        guard.release()?;
    }
    Ok(sum)
}

impl_json!(Witness);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cl::{
        schema::{CredentialSchema, NonCredentialSchema},
        tails::SimpleTailsStore,
    };
    use crate::schemes::{algorithms::CL_CL1024_SHA256, generics::Issuer};

    #[test]
    fn updated_witness_equals_fresh_witness() {
        let mut sb = CredentialSchema::builder();
        sb.add_attr("name").unwrap();
        let nb = NonCredentialSchema::builder();
        let (keypair, _) =
            Issuer::<CL_CL1024_SHA256>::new_credential_def(&sb.finalize().unwrap(), &nb.finalize().unwrap(), true)
                .unwrap();
        let (_, _, mut registry, creation, mut tails_gen) =
            Issuer::<CL_CL1024_SHA256>::new_revocation_registry_def(keypair.public_key(), 6, true).unwrap();
        let tails = SimpleTailsStore::new(&mut tails_gen).unwrap();

        let mut witness = Witness::new(3, 6, &creation, &tails).unwrap();

        let d1 = Issuer::<CL_CL1024_SHA256>::revoke_credential(&mut registry, 5, &tails).unwrap();
        let d2 = Issuer::<CL_CL1024_SHA256>::revoke_credential(&mut registry, 1, &tails).unwrap();
        let step = RevocationRegistryDelta::merge(&d1, &d2).unwrap();
        witness.update(3, 6, &step, &tails).unwrap();

        let full = RevocationRegistryDelta::merge(&creation, &step).unwrap();
        assert_eq!(full.issued, BTreeSet::from([2, 3, 4, 6]));
        assert_eq!(witness, Witness::new(3, 6, &full, &tails).unwrap());
        assert_eq!(tails.outstanding(), 0);

        let d3 = Issuer::<CL_CL1024_SHA256>::revoke_credential(&mut registry, 3, &tails).unwrap();
        let before = witness.clone();
        assert_eq!(witness.update(3, 6, &d3, &tails), Err(Error::CredentialRevoked(3)));
        assert_eq!(witness, before);
    }

    #[test]
    fn witness_needs_history_since_creation() {
        let mut sb = CredentialSchema::builder();
        sb.add_attr("name").unwrap();
        let nb = NonCredentialSchema::builder();
        let (keypair, _) =
            Issuer::<CL_CL1024_SHA256>::new_credential_def(&sb.finalize().unwrap(), &nb.finalize().unwrap(), true)
                .unwrap();
        let (_, _, mut registry, _, mut tails_gen) =
            Issuer::<CL_CL1024_SHA256>::new_revocation_registry_def(keypair.public_key(), 4, true).unwrap();
        let tails = SimpleTailsStore::new(&mut tails_gen).unwrap();

        let d = Issuer::<CL_CL1024_SHA256>::revoke_credential(&mut registry, 2, &tails).unwrap();
        assert!(matches!(Witness::new(1, 4, &d, &tails), Err(Error::InvalidState(_))));
        assert_eq!(Witness::new(0, 4, &d, &tails), Err(Error::InvalidRevocationAccumulatorIndex(0)));
    }
}
