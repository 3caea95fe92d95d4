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

//! DocShare Storage Layer
//!
//! Async document repository over a callback-driven hierarchical store.
//!
//! ## Architecture
//!
//! - **CallbackStore**: the store seam; one completion callback per request
//! - **StoreBridge**: turns completions into futures and adds title search
//! - **VersionChain**: decides whether an upload creates, versions or no-ops
//! - **DocumentRepository**: every caller-facing operation
//! - **MemoryStore**: in-process store with fault injection
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docshare_core::RepositoryConfig;
//! use docshare_storage::{DocumentRepository, MemoryStore};
//! use std::sync::Arc;
//!
//! let repo = DocumentRepository::new(Arc::new(MemoryStore::new()), RepositoryConfig::default());
//! let network = repo.register_network().await?;
//! repo.upload(&network, "hello", "alice", b"hi there").await?;
//! ```

pub mod bridge;
pub mod memory;
pub mod repository;
pub mod store;
pub mod versioning;

pub use bridge::StoreBridge;
pub use memory::{MemoryStore, MemoryStoreStats};
pub use repository::{DocumentRepository, ShareOutcome};
pub use store::{
    join_path, CallbackStore, ChildrenListener, CompletionCallback, StoreFault, ValueListener,
};
pub use versioning::{UploadOutcome, UploadRequest, VersionChain};
