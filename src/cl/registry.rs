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
    delta::RevocationRegistryDelta,
    keys::{CredentialPublicKey, CredentialRevocationPublicKey},
    tails::{tail_index, RevocationTailsGenerator, Tail, TailGuard, TailsStore},
};
use crate::{
    errors::Error,
    impl_json,
    schemes::{algorithms::CL, generics::Issuer},
    utils::encoding,
};
use bls12_381_plus::{pairing, G2Projective, Gt, Scalar};
use elliptic_curve::group::Curve;
use ff::Field;
use group::Group;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// `z = e(g, g_dash)^{gamma^{L+1}}`
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct RevocationKeyPublic {
    #[serde(with = "encoding::gt")]
    pub(crate) z: Gt,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct RevocationKeyPrivate {
    pub(crate) gamma: Scalar,
}

/// Accumulator of the indices currently not revoked, plus the bookkeeping needed to keep it
/// consistent.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct RevocationRegistry {
    pub(crate) accum: G2Projective,
    pub(crate) max_cred_num: u32,
    pub(crate) issuance_by_default: bool,
    /// Indices handed out to credentials.
    pub(crate) assigned: BTreeSet<u32>,
    /// Indices taken out of the accumulator that would otherwise be in it.
    pub(crate) revoked: BTreeSet<u32>,
}

impl RevocationRegistry {
    pub fn accum(&self) -> &G2Projective {
        &self.accum
    }

    pub fn max_cred_num(&self) -> u32 {
        self.max_cred_num
    }

    pub fn issuance_by_default(&self) -> bool {
        self.issuance_by_default
    }

    pub fn assigned(&self) -> &BTreeSet<u32> {
        &self.assigned
    }

    /// Whether `rev_idx` is currently part of the accumulator.
    pub fn is_included(&self, rev_idx: u32) -> bool {
        self.in_range(rev_idx)
            && (self.issuance_by_default || self.assigned.contains(&rev_idx))
            && !self.revoked.contains(&rev_idx)
    }

    fn in_range(&self, rev_idx: u32) -> bool {
        (1..=self.max_cred_num).contains(&rev_idx)
    }

    fn check_index(&self, rev_idx: u32) -> Result<(), Error> {
        if !self.in_range(rev_idx) {
            return Err(Error::InvalidRevocationAccumulatorIndex(rev_idx));
        }
        Ok(())
    }

    /// Checks that `rev_idx` can be handed to a new credential.
    pub(crate) fn check_issuable(&self, rev_idx: u32) -> Result<(), Error> {
        let fresh = !self.assigned.contains(&rev_idx);
        if fresh && self.assigned.len() >= self.max_cred_num as usize {
            return Err(Error::RevocationAccumulatorIsFull(self.max_cred_num));
        }
        self.check_index(rev_idx)?;
        if !fresh {
            return Err(Error::InvalidState(format!("Index {rev_idx} is already assigned to a credential")));
        }
        if self.revoked.contains(&rev_idx) {
            return Err(Error::InvalidState(format!("Index {rev_idx} is revoked and not assigned")));
        }
        Ok(())
    }

    /// Adds `rev_idx` to the accumulator (unless issued by default) and marks it assigned.
    /// On error the registry is unchanged.
    pub(crate) fn issue<T: TailsStore + ?Sized>(
        &mut self,
        rev_idx: u32,
        tails: &T,
    ) -> Result<RevocationRegistryDelta, Error> {
        self.check_issuable(rev_idx)?;

        let delta = if self.issuance_by_default {
            RevocationRegistryDelta::new(self.accum, self.accum, BTreeSet::new(), BTreeSet::new())
        } else {
            let accum = self.accum + take_tail(tails, tail_index(self.max_cred_num, rev_idx))?;
            RevocationRegistryDelta::new(self.accum, accum, BTreeSet::from([rev_idx]), BTreeSet::new())
        };

        self.accum = delta.accum;
        self.assigned.insert(rev_idx);

        debug!("RevocationRegistry::issue: index {} assigned", rev_idx);

        Ok(delta)
    }

    fn revoke<T: TailsStore + ?Sized>(
        &mut self,
        rev_idx: u32,
        tails: &T,
    ) -> Result<RevocationRegistryDelta, Error> {
        self.check_index(rev_idx)?;
        if self.revoked.contains(&rev_idx) {
            return Err(Error::CredentialRevoked(rev_idx));
        }
        if !self.is_included(rev_idx) {
            return Err(Error::InvalidState(format!("Index {rev_idx} was never issued")));
        }

        let accum = self.accum - take_tail(tails, tail_index(self.max_cred_num, rev_idx))?;
        let delta = RevocationRegistryDelta::new(self.accum, accum, BTreeSet::new(), BTreeSet::from([rev_idx]));

        self.accum = accum;
        self.revoked.insert(rev_idx);

        debug!("RevocationRegistry::revoke: index {} revoked", rev_idx);

        Ok(delta)
    }

    fn recover<T: TailsStore + ?Sized>(
        &mut self,
        rev_idx: u32,
        tails: &T,
    ) -> Result<RevocationRegistryDelta, Error> {
        self.check_index(rev_idx)?;
        if !self.revoked.contains(&rev_idx) {
            return Err(Error::InvalidState(format!("Index {rev_idx} is not revoked")));
        }

        let accum = self.accum + take_tail(tails, tail_index(self.max_cred_num, rev_idx))?;
        let delta = RevocationRegistryDelta::new(self.accum, accum, BTreeSet::from([rev_idx]), BTreeSet::new());

        self.accum = accum;
        self.revoked.remove(&rev_idx);

        debug!("RevocationRegistry::recover: index {} back in the accumulator", rev_idx);

        Ok(delta)
    }

    /// Moves a mirrored registry forward by a delta produced by the issuer.
    ///
    /// Under `issuance_by_default` signing publishes no index, so `assigned` is only tracked by
    /// the issuer's own registry.
    pub fn apply_delta(&mut self, delta: &RevocationRegistryDelta) -> Result<(), Error> {
        trace!("RevocationRegistry::apply_delta: >>> delta: {:?}", delta);

        delta.check_structure()?;
        if delta.prev_accum != self.accum {
            return Err(Error::InvalidState("Delta does not start from the current accumulator".to_string()));
        }
        if let Some(idx) = delta.issued.iter().chain(delta.revoked.iter()).find(|idx| !self.in_range(**idx)) {
            return Err(Error::InvalidRevocationAccumulatorIndex(*idx));
        }

        self.accum = delta.accum;
        for idx in delta.issued.iter() {
            self.revoked.remove(idx);
            if !self.issuance_by_default {
                self.assigned.insert(*idx);
            }
        }
        for idx in delta.revoked.iter() {
            self.revoked.insert(*idx);
        }

        trace!("RevocationRegistry::apply_delta: <<<");

        Ok(())
    }
}

/// Reads one tail, returning it to the store before the caller commits anything.
fn take_tail<T: TailsStore + ?Sized>(tails: &T, index: u32) -> Result<G2Projective, Error> {
    let guard = TailGuard::take(tails, index)?;
    let point = guard.point();
    guard.release()?;
    Ok(point)
}

impl<CS: CLCiphersuite> Issuer<CL<CS>> {
    /// Creates the registry keys, an empty (or, `issuance_by_default`, full) registry, the delta
    /// describing its initial content and the generator of its tails.
    pub fn new_revocation_registry_def(
        pub_key: &CredentialPublicKey,
        max_cred_num: u32,
        issuance_by_default: bool,
    ) -> Result<
        (
            RevocationKeyPublic,
            RevocationKeyPrivate,
            RevocationRegistry,
            RevocationRegistryDelta,
            RevocationTailsGenerator,
        ),
        Error,
    > {
        trace!(
            "Issuer::new_revocation_registry_def: >>> max_cred_num: {}, issuance_by_default: {}",
            max_cred_num,
            issuance_by_default
        );

        let r_key = pub_key.r_key.as_ref().ok_or_else(|| {
            Error::InvalidStructure("There are no revocation keys in the credential public key".to_string())
        })?;
        if max_cred_num == 0 || max_cred_num > (u32::MAX - 1) / 2 {
            return Err(Error::InvalidParam(2, format!("Unsupported max_cred_num {max_cred_num}")));
        }

        let (rev_key_pub, rev_key_priv) = new_revocation_registry_keys(r_key, max_cred_num);

        let (accum, issued) = if issuance_by_default {
            let accum = (1..=max_cred_num)
                .map(|rev_idx| Tail::new(tail_index(max_cred_num, rev_idx), &r_key.g_dash, &rev_key_priv.gamma).point)
                .fold(G2Projective::identity(), |acc, tail| acc + tail);
            (accum, (1..=max_cred_num).collect())
        } else {
            (G2Projective::identity(), BTreeSet::new())
        };

        let registry = RevocationRegistry {
            accum,
            max_cred_num,
            issuance_by_default,
            assigned: BTreeSet::new(),
            revoked: BTreeSet::new(),
        };
        let delta = RevocationRegistryDelta::new(G2Projective::identity(), accum, issued, BTreeSet::new());
        let generator = RevocationTailsGenerator::new(max_cred_num, rev_key_priv.gamma, r_key.g_dash);

        trace!("Issuer::new_revocation_registry_def: <<< registry: {:?}", registry);

        Ok((rev_key_pub, rev_key_priv, registry, delta, generator))
    }

    /// Takes `rev_idx` out of the accumulator.
    pub fn revoke_credential<T: TailsStore + ?Sized>(
        registry: &mut RevocationRegistry,
        rev_idx: u32,
        tails: &T,
    ) -> Result<RevocationRegistryDelta, Error> {
        trace!("Issuer::revoke_credential: >>> rev_idx: {}", rev_idx);
        let delta = registry.revoke(rev_idx, tails)?;
        trace!("Issuer::revoke_credential: <<< delta: {:?}", delta);
        Ok(delta)
    }

    /// Puts a revoked `rev_idx` back into the accumulator.
    pub fn recovery_credential<T: TailsStore + ?Sized>(
        registry: &mut RevocationRegistry,
        rev_idx: u32,
        tails: &T,
    ) -> Result<RevocationRegistryDelta, Error> {
        trace!("Issuer::recovery_credential: >>> rev_idx: {}", rev_idx);
        let delta = registry.recover(rev_idx, tails)?;
        trace!("Issuer::recovery_credential: <<< delta: {:?}", delta);
        Ok(delta)
    }
}

fn new_revocation_registry_keys(
    r_key: &CredentialRevocationPublicKey,
    max_cred_num: u32,
) -> (RevocationKeyPublic, RevocationKeyPrivate) {
    let gamma = Scalar::random(&mut rand::thread_rng());
    let z = pairing(&r_key.g.to_affine(), &r_key.g_dash.to_affine())
        * gamma.pow_vartime(&[u64::from(max_cred_num) + 1, 0, 0, 0]);

    (RevocationKeyPublic { z }, RevocationKeyPrivate { gamma })
}

impl_json!(RevocationKeyPublic, RevocationKeyPrivate, RevocationRegistry);
