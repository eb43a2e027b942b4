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

use crate::schemes::algorithms::Ciphersuite;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

pub trait CLCiphersuite: Eq + 'static + Ciphersuite {
    const SECPARAM: u32; // NOTE: bit length of p' and q' (i.e. n = (2p'+1)(2q'+1) has about 2*SECPARAM bits)
    const QSEC: u32; // NOTE: Miller-Rabin repetitions for primality testing of the safe primes. (Check NIST-FIPS 186-4, Table C.1, Column 2 (Integer.is_probably_prime runs a lukas test internally and "reps - 24" repetitions of the MR primality test)
    const ln: u32 = 2 * Self::SECPARAM; // NOTE: length of n (i.e. special RSA modulus)
    const lms: u32 = 256; // NOTE: length of the master secret
    const le_start: u32 = 596; // NOTE: e is a prime in [2^le_start, 2^le_start + 2^le_range]
    const le_range: u32 = 119;
    const lvprime: u32 = 2128; // NOTE: length of v' (prover blinding of u)
    const lvprime_prime: u32 = 2724; // NOTE: length of v'' (issuer part of v)
    const lmtilde: u32 = 593; // NOTE: length of the m~ randomizers
    const lvprime_tilde: u32 = 673; // NOTE: length of the v~ randomizer
    const lnonce: u32 = 80; // NOTE: length of a nonce
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CL1024Sha256 {}

impl CLCiphersuite for CL1024Sha256 {
    const SECPARAM: u32 = 512;
    const QSEC: u32 = 19;
}

impl Ciphersuite for CL1024Sha256 {
    type HashAlg = Sha256;
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CL2048Sha256 {}

impl CLCiphersuite for CL2048Sha256 {
    const SECPARAM: u32 = 1024;
    const QSEC: u32 = 27;
}

impl Ciphersuite for CL2048Sha256 {
    type HashAlg = Sha256;
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CL3072Sha256 {}

impl CLCiphersuite for CL3072Sha256 {
    const SECPARAM: u32 = 1536;
    const QSEC: u32 = 27;
}

impl Ciphersuite for CL3072Sha256 {
    type HashAlg = Sha256;
}
