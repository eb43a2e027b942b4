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
use serde::{de::DeserializeOwned, Serialize};

/// Canonical textual encoding of an entity.
pub trait JsonEncodable: Serialize + Sized {
    fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string(self)
            .map_err(|err| Error::InvalidState(format!("Unable to serialize entity: {err}")))
    }
}

pub trait JsonDecodable: DeserializeOwned {
    fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(Error::from)
    }
}

/// Implements both directions for a list of types.
#[macro_export]
macro_rules! impl_json {
    ($($t:ty),+ $(,)?) => {
        $(
            impl $crate::utils::json::JsonEncodable for $t {}
            impl $crate::utils::json::JsonDecodable for $t {}
        )+
    };
}
