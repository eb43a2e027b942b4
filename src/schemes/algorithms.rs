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

use core::fmt::Debug;
use core::marker::PhantomData;
use digest::Digest;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::cl::{
    ciphersuites::{CL1024Sha256, CL2048Sha256, CL3072Sha256, CLCiphersuite},
    keys::{CredentialPrivateKey, CredentialPublicKey},
};

pub trait Ciphersuite: 'static + Eq {
    type HashAlg: Digest;
}

pub trait Scheme: Eq + 'static + Sized + Serialize + DeserializeOwned {
    type Ciphersuite: Ciphersuite;
    type PrivKey: Clone + Debug + PartialEq + Eq + Serialize + DeserializeOwned;
    type PubKey: Clone + Debug + PartialEq + Eq + Serialize + DeserializeOwned;
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CL<CS: CLCiphersuite> {
    _p: PhantomData<CS>,
}

impl<CS: CLCiphersuite> Scheme for CL<CS> {
    type Ciphersuite = CS;
    type PrivKey = CredentialPrivateKey;
    type PubKey = CredentialPublicKey;
}

pub type CL_CL1024_SHA256 = CL<CL1024Sha256>;
pub type CL_CL2048_SHA256 = CL<CL2048Sha256>;
pub type CL_CL3072_SHA256 = CL<CL3072Sha256>;
