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
use bls12_381_plus::{G2Projective, Scalar};
use ff::Field;
use group::Group;
use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Precomputed accumulator term `g_dash * gamma^index`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Tail {
    pub(crate) index: u32,
    pub(crate) point: G2Projective,
}

impl Tail {
    pub(crate) fn new(index: u32, g_dash: &G2Projective, gamma: &Scalar) -> Self {
        Self { index, point: g_dash * gamma.pow_vartime(&[u64::from(index), 0, 0, 0]) }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn point(&self) -> &G2Projective {
        &self.point
    }
}

/// Position of the tail that carries `rev_idx` in the accumulator.
pub(crate) fn tail_index(max_cred_num: u32, rev_idx: u32) -> u32 {
    max_cred_num + 1 - rev_idx
}

/// Caller supplied cache of tails.
///
/// Every successful `take` is paired with exactly one `put` of the same tail, on error paths
/// too. Inside the crate this pairing is enforced by [`TailGuard`].
pub trait TailsStore {
    fn take(&self, index: u32) -> Result<Tail, Error>;
    fn put(&self, tail: Tail) -> Result<(), Error>;
}

/// A taken tail that goes back to its store when released or dropped.
pub(crate) struct TailGuard<'a, T: TailsStore + ?Sized> {
    store: &'a T,
    tail: Option<Tail>,
}

impl<'a, T: TailsStore + ?Sized> TailGuard<'a, T> {
    pub(crate) fn take(store: &'a T, index: u32) -> Result<Self, Error> {
        let tail = store.take(index)?;
        if tail.index != index {
            let guard = Self { store, tail: Some(tail) };
            guard.release()?;
            return Err(Error::IOError(format!("Tails store returned a tail for the wrong index, expected {index}")));
        }
        Ok(Self { store, tail: Some(tail) })
    }

    pub(crate) fn point(&self) -> G2Projective {
        self.tail.as_ref().map(|t| t.point).unwrap_or_else(G2Projective::identity)
    }

    /// Puts the tail back, surfacing the store's error.
    pub(crate) fn release(mut self) -> Result<(), Error> {
        match self.tail.take() {
            Some(tail) => self.store.put(tail),
            None => Ok(()),
        }
    }
}

impl<T: TailsStore + ?Sized> Drop for TailGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(tail) = self.tail.take() {
            let index = tail.index;
            if let Err(err) = self.store.put(tail) {
                warn!("TailGuard: failed to put back tail {index}: {err}");
            }
        }
    }
}

/// Produces the `2 * max_cred_num + 1` tails of a registry.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct RevocationTailsGenerator {
    size: u32,
    current_index: u32,
    g_dash: G2Projective,
    gamma: Scalar,
}

impl RevocationTailsGenerator {
    pub(crate) fn new(max_cred_num: u32, gamma: Scalar, g_dash: G2Projective) -> Self {
        Self {
            // unused 0th, 1..L, unused (L+1)th, (L+2)..2L
            size: 2 * max_cred_num + 1,
            current_index: 0,
            g_dash,
            gamma,
        }
    }

    pub fn count(&self) -> u32 {
        self.size - self.current_index
    }

    pub fn next(&mut self) -> Result<Option<Tail>, Error> {
        if self.current_index >= self.size {
            return Ok(None);
        }

        // never accessed
        let tail = if self.current_index == self.size / 2 + 1 {
            Tail { index: self.current_index, point: G2Projective::identity() }
        } else {
            Tail::new(self.current_index, &self.g_dash, &self.gamma)
        };

        self.current_index += 1;

        Ok(Some(tail))
    }
}

/// In-memory [`TailsStore`] holding every tail of a registry.
#[derive(Debug)]
pub struct SimpleTailsStore {
    tails: Vec<Tail>,
    taken: AtomicUsize,
}

impl SimpleTailsStore {
    pub fn new(generator: &mut RevocationTailsGenerator) -> Result<Self, Error> {
        let mut tails = Vec::with_capacity(generator.count() as usize);
        while let Some(tail) = generator.next()? {
            tails.push(tail);
        }
        Ok(Self { tails, taken: AtomicUsize::new(0) })
    }

    pub fn len(&self) -> usize {
        self.tails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tails.is_empty()
    }

    /// Tails taken and not yet put back.
    pub fn outstanding(&self) -> usize {
        self.taken.load(Ordering::SeqCst)
    }
}

impl TailsStore for SimpleTailsStore {
    fn take(&self, index: u32) -> Result<Tail, Error> {
        let tail = self
            .tails
            .get(index as usize)
            .cloned()
            .ok_or_else(|| Error::IOError(format!("Tail {index} is not in the store")))?;
        self.taken.fetch_add(1, Ordering::SeqCst);
        Ok(tail)
    }

    fn put(&self, tail: Tail) -> Result<(), Error> {
        if self.tails.get(tail.index as usize) != Some(&tail) {
            return Err(Error::IOError(format!("Tail {} does not belong to this store", tail.index)));
        }
        self.taken
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .map(|_| ())
            .map_err(|_| Error::IOError("Put without a matching take".to_string()))
    }
}

impl_json!(RevocationTailsGenerator, Tail);
