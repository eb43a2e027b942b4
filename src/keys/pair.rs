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
use crate::schemes::algorithms::Scheme;
use crate::utils::json::{JsonDecodable, JsonEncodable};
use serde::Deserialize;
use serde::Serialize;

/// Public and private credential keys, generated together and kept together.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct KeyPair<S: Scheme> {
    pub(crate) public: S::PubKey,
    pub(crate) private: S::PrivKey,
}

impl<S> KeyPair<S>
where
    S: Scheme,
{
    pub fn public_key(&self) -> &S::PubKey {
        &self.public
    }

    pub fn private_key(&self) -> &S::PrivKey {
        &self.private
    }

    /// Returns the couple `(sk, pk)`.
    pub fn into_parts(self) -> (S::PrivKey, S::PubKey) {
        (self.private, self.public)
    }

    /// Writes the key pair as json to `path`.
    pub fn write_keypair_to_file(&self, path: &std::path::Path) -> Result<(), Error> {
        log::debug!("writing key pair to {path:?}");
        std::fs::write(path, self.to_json()?)
            .map_err(|err| Error::IOError(format!("failed to write key pair to {path:?}: {err}")))
    }

    pub fn read_keypair_from_file(path: &std::path::Path) -> Result<Self, Error> {
        let json = std::fs::read_to_string(path)
            .map_err(|err| Error::IOError(format!("failed to read key pair from {path:?}: {err}")))?;
        Self::from_json(&json)
    }
}

impl<S: Scheme> JsonEncodable for KeyPair<S> {}
impl<S: Scheme> JsonDecodable for KeyPair<S> {}
