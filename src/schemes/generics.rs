// Copyright 2023 Fondazione LINKS

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at

//     http://www.apache.org/licenses/LICENSE-2.0

// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::algorithms::Scheme;
use core::marker::PhantomData;

/// Issuer side of the issuance protocol. Operations live in the scheme modules,
/// e.g. `impl<CS: CLCiphersuite> Issuer<CL<CS>>`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Issuer<S: Scheme> {
    _p: PhantomData<S>,
}

/// Prover (credential holder) side of the issuance protocol.
#[derive(Clone, Copy, Debug, Default)]
pub struct Prover<S: Scheme> {
    _p: PhantomData<S>,
}
