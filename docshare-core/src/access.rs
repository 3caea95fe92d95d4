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

//! Access chains
//!
//! The users allowed to see a document are kept as one `/`-joined string.
//! The first segment is the creator; later segments were added by sharing,
//! in the order they were shared.
//!
//! Membership is historically a *substring* test: `"user1"` is considered
//! present in `"user10"`. [`AccessChain::contains`] keeps that rule and
//! [`AccessChain::contains_exact`] offers segment equality. Which one the
//! repository applies is chosen by [`AccessMatching`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between user ids in a chain.
pub const CHAIN_SEPARATOR: char = '/';

/// Rule used to decide whether a user appears in a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMatching {
    /// The id occurs anywhere in the chain string.
    #[default]
    Substring,
    /// The id equals one of the chain's segments.
    Exact,
}

impl std::str::FromStr for AccessMatching {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "substring" => Ok(AccessMatching::Substring),
            "exact" => Ok(AccessMatching::Exact),
            other => Err(format!("unknown access matching rule: {}", other)),
        }
    }
}

/// Ordered, `/`-delimited list of user ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessChain(String);

impl AccessChain {
    /// Chain containing only the creator.
    pub fn new(creator: impl Into<String>) -> Self {
        Self(creator.into())
    }

    /// Wrap an already-encoded chain.
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// The text before the first separator, or the whole chain.
    pub fn creator(&self) -> &str {
        match self.0.find(CHAIN_SEPARATOR) {
            Some(idx) => &self.0[..idx],
            None => &self.0,
        }
    }

    /// Substring membership.
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// Segment-equality membership.
    pub fn contains_exact(&self, id: &str) -> bool {
        self.members().any(|member| member == id)
    }

    /// Membership under the given rule.
    pub fn permits(&self, id: &str, matching: AccessMatching) -> bool {
        match matching {
            AccessMatching::Substring => self.contains(id),
            AccessMatching::Exact => self.contains_exact(id),
        }
    }

    /// Chain with `id` appended, or an unchanged copy when `id` is already
    /// contained (substring rule).
    pub fn append(&self, id: &str) -> AccessChain {
        self.append_with(id, AccessMatching::Substring)
    }

    /// Like [`append`](Self::append), deciding presence with `matching`.
    pub fn append_with(&self, id: &str, matching: AccessMatching) -> AccessChain {
        if self.permits(id, matching) {
            return self.clone();
        }
        AccessChain(format!("{}{}{}", self.0, CHAIN_SEPARATOR, id))
    }

    /// Number of segments: separator count plus one.
    pub fn count(&self) -> usize {
        self.0.matches(CHAIN_SEPARATOR).count() + 1
    }

    /// Segments in chain order.
    pub fn members(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.split(CHAIN_SEPARATOR)
    }
}

impl fmt::Display for AccessChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccessChain {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for AccessChain {
    fn from(value: String) -> Self {
        Self(value)
    }
}
