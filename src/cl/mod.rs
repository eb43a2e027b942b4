// SPDX-FileCopyrightText: 2025 Fondazione LINKS
//
// SPDX-License-Identifier: APACHE-2.0

pub mod blind;
pub mod ciphersuites;
pub mod definition;
pub mod delta;
pub mod keys;
pub mod non_revocation;
pub mod nonce;
pub mod registry;
pub mod schema;
pub mod signature;
pub mod tails;
pub mod values;
pub mod witness;
