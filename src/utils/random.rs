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

use crate::errors::Error;
use rand::RngCore;
use rug::{
    integer::{IsPrime, Order},
    rand::RandState,
    Integer,
};

// "is_probably_prime" subtracts 24 from reps.
const PRIME_REPS: u32 = 3 + 24;

/// GMP state seeded from the thread rng, one per call.
fn rand_state() -> RandState<'static> {
    let mut seed = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut seed);
    let mut state = RandState::new();
    state.seed(&Integer::from_digits(&seed, Order::MsfBe));
    state
}

/// Uniform integer in `[0, 2^n)`.
pub fn random_bits(n: u32) -> Integer {
    let mut state = rand_state();
    Integer::from(Integer::random_bits(n, &mut state))
}

/// Uniform integer in `[0, n)`.
pub fn random_number(n: &Integer) -> Integer {
    let mut state = rand_state();
    Integer::from(n.random_below_ref(&mut state))
}

/// Uniform integer in `[start, end)`.
pub fn random_in_range(start: &Integer, end: &Integer) -> Result<Integer, Error> {
    if end <= start {
        return Err(Error::InvalidState(format!(
            "Empty random range [{start}, {end})"
        )));
    }
    let width = Integer::from(end - start);
    Ok(random_number(&width) + start)
}

/// First prime after a random `n`-bit value (top bit set).
pub fn random_prime(n: u32) -> Integer {
    let mut candidate = random_bits(n);
    candidate.set_bit(n - 1, true);
    candidate.next_prime()
}

/// Safe prime `p = 2p' + 1`, returns `(p, p')`.
pub fn random_safe_prime(n: u32, reps: u32) -> (Integer, Integer) {
    loop {
        let pprime = random_prime(n);
        let p = Integer::from(&pprime << 1) + 1u32;
        if p.is_probably_prime(reps) != IsPrime::No {
            return (p, pprime);
        }
    }
}

/// Prime uniformly placed in `[start, end)`.
pub fn random_prime_in_range(start: &Integer, end: &Integer) -> Result<Integer, Error> {
    // Bounded search so an empty interval cannot loop forever.
    for _ in 0..100_000 {
        let candidate = random_in_range(start, end)?.next_prime();
        if &candidate < end {
            return Ok(candidate);
        }
    }
    Err(Error::IOError(format!(
        "Unable to find a prime in [{start}, {end})"
    )))
}

/// Random quadratic residue mod `n`, coprime with `n`.
pub fn random_qr(n: &Integer) -> Integer {
    loop {
        let r = random_number(n);
        if r > 1u32 && Integer::from(r.gcd_ref(n)) == 1u32 {
            return Integer::from(r.square_ref()) % n;
        }
    }
}

/// Uniform exponent in `[2, p'q' - 1]`.
pub fn gen_x(p: &Integer, q: &Integer) -> Integer {
    let order = Integer::from(p * q) - 3u32;
    random_number(&order) + 2u32
}

pub fn is_prime(n: &Integer) -> bool {
    n.is_probably_prime(PRIME_REPS) != IsPrime::No
}
