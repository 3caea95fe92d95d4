// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Error taxonomy shared by every DocShare operation.

use thiserror::Error;

/// Failure kinds surfaced to callers of the repository.
///
/// Each variant carries a human-readable message; for `StoreTransient` this is
/// the store's raw message with an operation prefix. `StoreTransient` means
/// nothing was written. `OutcomeUnknown` means a write was handed to the store
/// but not confirmed in time, so it may still be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Malformed: {0}")]
    Malformed(String),

    #[error("Store error: {0}")]
    StoreTransient(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Outcome unknown: {0}")]
    OutcomeUnknown(String),
}

impl DocError {
    /// Stable lowercase name of the kind.
    pub fn kind(&self) -> &'static str {
        match self {
            DocError::NotFound(_) => "not_found",
            DocError::Forbidden(_) => "forbidden",
            DocError::Malformed(_) => "malformed",
            DocError::StoreTransient(_) => "store_transient",
            DocError::InvalidArgument(_) => "invalid_argument",
            DocError::OutcomeUnknown(_) => "outcome_unknown",
        }
    }

    /// The message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            DocError::NotFound(m)
            | DocError::Forbidden(m)
            | DocError::Malformed(m)
            | DocError::StoreTransient(m)
            | DocError::InvalidArgument(m)
            | DocError::OutcomeUnknown(m) => m,
        }
    }
}

impl From<serde_json::Error> for DocError {
    fn from(err: serde_json::Error) -> Self {
        DocError::Malformed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DocError>;
