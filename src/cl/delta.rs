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
use bls12_381_plus::G2Projective;
use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One transition of a revocation accumulator, `prev_accum -> accum`.
///
/// `issued` and `revoked` are disjoint. A delta produced from a fresh registry has the identity as
/// `prev_accum`, so merging every delta since creation yields the full state of the registry.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct RevocationRegistryDelta {
    pub(crate) prev_accum: G2Projective,
    pub(crate) accum: G2Projective,
    pub(crate) issued: BTreeSet<u32>,
    pub(crate) revoked: BTreeSet<u32>,
}

impl RevocationRegistryDelta {
    pub(crate) fn new(
        prev_accum: G2Projective,
        accum: G2Projective,
        issued: BTreeSet<u32>,
        revoked: BTreeSet<u32>,
    ) -> Self {
        Self { prev_accum, accum, issued, revoked }
    }

    pub fn prev_accum(&self) -> &G2Projective {
        &self.prev_accum
    }

    pub fn accum(&self) -> &G2Projective {
        &self.accum
    }

    pub fn issued(&self) -> &BTreeSet<u32> {
        &self.issued
    }

    pub fn revoked(&self) -> &BTreeSet<u32> {
        &self.revoked
    }

    /// Rejects a delta that issues and revokes the same index.
    pub fn check_structure(&self) -> Result<(), Error> {
        match self.issued.intersection(&self.revoked).next() {
            Some(idx) => Err(Error::InvalidStructure(format!("Index {idx} is both issued and revoked in one delta"))),
            None => Ok(()),
        }
    }

    /// Accumulator unchanged and no index touched.
    pub fn is_empty(&self) -> bool {
        self.prev_accum == self.accum && self.issued.is_empty() && self.revoked.is_empty()
    }

    /// Combines two deltas of the same registry into one.
    ///
    /// The order of the two transitions is read from the accumulators: when one delta starts where
    /// the other ends they are consecutive, when both start from the same value they were computed
    /// concurrently against one snapshot and their changes add up. Any other pair is rejected.
    ///
    /// When each delta ends where the other starts (a round trip) the accumulators cannot tell the
    /// order, so `a` is taken as the earlier one and the result starts from `a.prev_accum`.
    ///
    /// An index issued and then revoked cancels out, as does a round trip that undoes itself. An
    /// index revoked and then issued again by a later, different transition, or issued (revoked)
    /// by both deltas, is `InvalidState`.
    pub fn merge(a: &Self, b: &Self) -> Result<Self, Error> {
        trace!("RevocationRegistryDelta::merge: >>> a: {:?}, b: {:?}", a, b);

        a.check_structure()?;
        b.check_structure()?;

        let forward = a.accum == b.prev_accum;
        let backward = b.accum == a.prev_accum;

        let merged = match (forward, backward) {
            (true, false) => Self::chain(a, b),
            (false, true) => Self::chain(b, a),
            (true, true) => Self::round_trip(a, b),
            (false, false) if a.prev_accum == b.prev_accum => Self::concurrent(a, b),
            (false, false) => Err(Error::InvalidState(
                "Deltas neither follow one another nor start from the same accumulator".to_string(),
            )),
        }?;

        trace!("RevocationRegistryDelta::merge: <<< merged: {:?}", merged);

        Ok(merged)
    }

    fn chain(first: &Self, second: &Self) -> Result<Self, Error> {
        if let Some(idx) = first.revoked.intersection(&second.issued).next() {
            return Err(Error::InvalidState(format!(
                "Index {idx} is issued again after being revoked"
            )));
        }
        check_disjoint(first, second)?;

        let issued = first
            .issued
            .difference(&second.revoked)
            .chain(second.issued.iter())
            .copied()
            .collect();
        let revoked = first
            .revoked
            .iter()
            .chain(second.revoked.difference(&first.issued))
            .copied()
            .collect();

        Ok(Self::new(first.prev_accum, second.accum, issued, revoked))
    }

    fn round_trip(first: &Self, second: &Self) -> Result<Self, Error> {
        if first.issued == second.revoked && first.revoked == second.issued {
            return Ok(Self::new(first.prev_accum, first.prev_accum, BTreeSet::new(), BTreeSet::new()));
        }
        Self::chain(first, second)
    }

    fn concurrent(a: &Self, b: &Self) -> Result<Self, Error> {
        check_disjoint(a, b)?;

        let cancelled: BTreeSet<u32> = a
            .issued
            .intersection(&b.revoked)
            .chain(b.issued.intersection(&a.revoked))
            .copied()
            .collect();

        let issued = a
            .issued
            .union(&b.issued)
            .filter(|idx| !cancelled.contains(idx))
            .copied()
            .collect();
        let revoked = a
            .revoked
            .union(&b.revoked)
            .filter(|idx| !cancelled.contains(idx))
            .copied()
            .collect();

        let accum = a.accum + b.accum - a.prev_accum;

        Ok(Self::new(a.prev_accum, accum, issued, revoked))
    }
}

fn check_disjoint(a: &RevocationRegistryDelta, b: &RevocationRegistryDelta) -> Result<(), Error> {
    if let Some(idx) = a.issued.intersection(&b.issued).next() {
        return Err(Error::InvalidState(format!("Index {idx} is issued twice")));
    }
    if let Some(idx) = a.revoked.intersection(&b.revoked).next() {
        return Err(Error::InvalidState(format!("Index {idx} is revoked twice")));
    }
    Ok(())
}

impl_json!(RevocationRegistryDelta);
