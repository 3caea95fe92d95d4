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

//! Callback Store - the seam to the hierarchical key-value store
//!
//! Nodes are addressed by slash-separated paths (`"NET1/docABC1/userId"`).
//! Every call takes exactly one completion callback; callbacks are `FnOnce`,
//! so an implementation can complete a request at most once. Nothing here is
//! async: the [`StoreBridge`](crate::bridge::StoreBridge) turns completions
//! into futures.

use serde_json::{Map, Value};
use thiserror::Error;

/// Error reported by the store through a completion callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StoreFault {
    pub message: String,
}

impl StoreFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Completion for writes.
pub type CompletionCallback = Box<dyn FnOnce(Result<(), StoreFault>) + Send + 'static>;

/// One-shot listener for a single node; `None` when nothing is stored there.
pub type ValueListener = Box<dyn FnOnce(Result<Option<Value>, StoreFault>) + Send + 'static>;

/// One-shot listener for the direct children of a node, in store order.
pub type ChildrenListener =
    Box<dyn FnOnce(Result<Vec<(String, Value)>, StoreFault>) + Send + 'static>;

/// Push-style hierarchical store.
pub trait CallbackStore: Send + Sync {
    /// Replace the node at `path` with `value`.
    fn set(&self, path: &str, value: Value, on_complete: CompletionCallback);

    /// Merge `children` into the node at `path`, leaving other keys alone.
    fn update_children(&self, path: &str, children: Map<String, Value>, on_complete: CompletionCallback);

    /// Delete the node at `path` and everything below it.
    fn remove(&self, path: &str, on_complete: CompletionCallback);

    /// Read the node at `path` once.
    fn read_once(&self, path: &str, listener: ValueListener);

    /// Read the direct children of `path` once.
    fn read_children_once(&self, path: &str, listener: ChildrenListener);
}

/// Join path segments with `/`, skipping empty ones.
pub fn join_path(segments: &[&str]) -> String {
    segments
        .iter()
        .flat_map(|s| s.split('/'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Split a path into its non-empty segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}
