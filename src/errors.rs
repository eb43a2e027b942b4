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

use thiserror::Error;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Invalid or malformed input. The first field is the position (1..=12) of the offending
    /// parameter in the operation signature.
    #[error("Invalid parameter {0}: {1}")]
    InvalidParam(u8, String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Invalid structure: {0}")]
    InvalidStructure(String),
    #[error("IO error: {0}")]
    IOError(String),
    #[error("Revocation accumulator is full (max_cred_num = {0})")]
    RevocationAccumulatorIsFull(u32),
    #[error("Invalid revocation accumulator index {0}")]
    InvalidRevocationAccumulatorIndex(u32),
    #[error("Credential {0} is revoked")]
    CredentialRevoked(u32),
    #[error("Proof rejected: {0}")]
    ProofRejected(String),
}

/// Numeric status codes exposed at the interchange boundary.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    CommonInvalidParam1 = 100,
    CommonInvalidParam2 = 101,
    CommonInvalidParam3 = 102,
    CommonInvalidParam4 = 103,
    CommonInvalidParam5 = 104,
    CommonInvalidParam6 = 105,
    CommonInvalidParam7 = 106,
    CommonInvalidParam8 = 107,
    CommonInvalidParam9 = 108,
    CommonInvalidParam10 = 109,
    CommonInvalidParam11 = 110,
    CommonInvalidParam12 = 111,
    CommonInvalidState = 112,
    CommonInvalidStructure = 113,
    CommonIOError = 114,
    AnoncredsRevocationAccumulatorIsFull = 115,
    AnoncredsInvalidRevocationAccumulatorIndex = 116,
    AnoncredsCredentialRevoked = 117,
    AnoncredsProofRejected = 118,
}

impl Error {
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::InvalidParam(pos, _) => match pos {
                0 | 1 => ErrorCode::CommonInvalidParam1,
                2 => ErrorCode::CommonInvalidParam2,
                3 => ErrorCode::CommonInvalidParam3,
                4 => ErrorCode::CommonInvalidParam4,
                5 => ErrorCode::CommonInvalidParam5,
                6 => ErrorCode::CommonInvalidParam6,
                7 => ErrorCode::CommonInvalidParam7,
                8 => ErrorCode::CommonInvalidParam8,
                9 => ErrorCode::CommonInvalidParam9,
                10 => ErrorCode::CommonInvalidParam10,
                11 => ErrorCode::CommonInvalidParam11,
                _ => ErrorCode::CommonInvalidParam12,
            },
            Error::InvalidState(_) => ErrorCode::CommonInvalidState,
            Error::InvalidStructure(_) => ErrorCode::CommonInvalidStructure,
            Error::IOError(_) => ErrorCode::CommonIOError,
            Error::RevocationAccumulatorIsFull(_) => ErrorCode::AnoncredsRevocationAccumulatorIsFull,
            Error::InvalidRevocationAccumulatorIndex(_) => {
                ErrorCode::AnoncredsInvalidRevocationAccumulatorIndex
            }
            Error::CredentialRevoked(_) => ErrorCode::AnoncredsCredentialRevoked,
            Error::ProofRejected(_) => ErrorCode::AnoncredsProofRejected,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidStructure(format!("Invalid json: {err}"))
    }
}
