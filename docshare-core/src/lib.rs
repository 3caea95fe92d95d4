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

//! DocShare Core
//!
//! Data model for the multi-user document repository: document records and
//! their version history, access chains, content encoding, reports, error
//! taxonomy and configuration. Nothing in this crate touches a store.

pub mod access;
pub mod config;
pub mod encoding;
pub mod error;
pub mod ids;
pub mod record;
pub mod report;

pub use access::{AccessChain, AccessMatching, CHAIN_SEPARATOR};
pub use config::{BridgeConfig, RepositoryConfig};
pub use error::{DocError, Result};
pub use ids::{generate_document_id, generate_network_id, validate_network_id};
pub use record::{count_words, DocumentRecord, VersionSnapshot};
pub use report::{compare, usage_statistics};
