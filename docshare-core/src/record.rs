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

//! Document records and their version history.
//!
//! ## Wire layout
//!
//! ```text
//! {
//!   "userId":     "<creator>[/<shared-id>]*",
//!   "clientId":   "<networkId>",
//!   "docId":      "doc<3 letters><epoch millis>",
//!   "title":      "<string>",
//!   "wordCount":  <integer>,
//!   "fileString": "#<base64>",
//!   "previousVersions": [ <snapshot>, ... ]   // index 0 is the sentinel
//! }
//! ```
//!
//! History entries are flat [`VersionSnapshot`]s: they carry the scalar
//! fields of the version they replaced and never a history of their own.
//! Older layouts that nest `previousVersions` inside each entry still decode;
//! the nested lists are dropped.

use crate::access::{AccessChain, AccessMatching};
use crate::encoding;
use crate::error::{DocError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Count words line by line: each line is split on runs of whitespace and
/// the token counts are summed. Blank lines contribute nothing.
pub fn count_words(contents: &[u8]) -> u64 {
    String::from_utf8_lossy(contents)
        .lines()
        .map(|line| line.split_whitespace().count() as u64)
        .sum()
}

/// Scalar fields of one recorded version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSnapshot {
    #[serde(rename = "userId")]
    pub owner_chain: AccessChain,
    #[serde(rename = "clientId")]
    pub network_id: String,
    #[serde(rename = "docId")]
    pub document_id: String,
    pub title: String,
    #[serde(rename = "wordCount")]
    pub word_count: u64,
    #[serde(rename = "fileString")]
    pub content: String,
}

impl VersionSnapshot {
    /// The all-empty placeholder seeded at history index 0.
    pub fn sentinel() -> Self {
        Self {
            owner_chain: AccessChain::default(),
            network_id: String::new(),
            document_id: String::new(),
            title: String::new(),
            word_count: 0,
            content: encoding::CONTENT_SENTINEL.to_string(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::sentinel()
    }

    /// Decoded raw bytes of this version.
    pub fn decode_content(&self) -> Result<Vec<u8>> {
        encoding::decode(&self.content)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<VersionSnapshot>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<VersionSnapshot>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A stored document: identity, content, metadata and prior versions.
///
/// Equality covers `(word_count, title, document_id, network_id,
/// owner_chain, content)`. The history is not part of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(rename = "userId")]
    owner_chain: AccessChain,
    #[serde(rename = "clientId")]
    network_id: String,
    #[serde(rename = "docId")]
    document_id: String,
    title: String,
    #[serde(rename = "wordCount")]
    word_count: u64,
    #[serde(rename = "fileString")]
    content: String,
    #[serde(
        rename = "previousVersions",
        default,
        deserialize_with = "null_as_empty"
    )]
    version_history: Vec<VersionSnapshot>,
}

impl DocumentRecord {
    /// Build a record from raw bytes, seeding the history with the sentinel.
    pub fn new(
        owner_chain: AccessChain,
        network_id: impl Into<String>,
        document_id: impl Into<String>,
        title: impl Into<String>,
        contents: &[u8],
    ) -> Self {
        Self::with_history(
            owner_chain,
            network_id,
            document_id,
            title,
            contents,
            vec![VersionSnapshot::sentinel()],
        )
    }

    /// Build a record from raw bytes carrying the supplied history as-is.
    pub fn with_history(
        owner_chain: AccessChain,
        network_id: impl Into<String>,
        document_id: impl Into<String>,
        title: impl Into<String>,
        contents: &[u8],
        version_history: Vec<VersionSnapshot>,
    ) -> Self {
        Self {
            owner_chain,
            network_id: network_id.into(),
            document_id: document_id.into(),
            title: title.into(),
            word_count: count_words(contents),
            content: encoding::encode(contents),
            version_history,
        }
    }

    pub fn owner_chain(&self) -> &AccessChain {
        &self.owner_chain
    }

    pub fn network_id(&self) -> &str {
        &self.network_id
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn word_count(&self) -> u64 {
        self.word_count
    }

    /// Wire-encoded content (`"#"` + base64).
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn version_history(&self) -> &[VersionSnapshot] {
        &self.version_history
    }

    /// Number of recorded previous versions, not counting the sentinel.
    pub fn previous_version_count(&self) -> usize {
        self.version_history.len().saturating_sub(1)
    }

    /// History entry `revision`; revision 0 is the sentinel and is never
    /// returned.
    pub fn previous_version(&self, revision: usize) -> Result<&VersionSnapshot> {
        if revision == 0 || revision >= self.version_history.len() {
            return Err(DocError::InvalidArgument(
                "This is not a valid revision number".to_string(),
            ));
        }
        Ok(&self.version_history[revision])
    }

    /// Decoded raw bytes of the current version.
    pub fn decode_content(&self) -> Result<Vec<u8>> {
        encoding::decode(&self.content)
    }

    /// Scalar fields of the current version.
    pub fn snapshot(&self) -> VersionSnapshot {
        VersionSnapshot {
            owner_chain: self.owner_chain.clone(),
            network_id: self.network_id.clone(),
            document_id: self.document_id.clone(),
            title: self.title.clone(),
            word_count: self.word_count,
            content: self.content.clone(),
        }
    }

    /// Append a prior version to the history.
    pub fn push_version(&mut self, previous: VersionSnapshot) {
        self.version_history.push(previous);
    }

    /// Whether `user` may see this document under `matching`.
    pub fn permits(&self, user: &str, matching: AccessMatching) -> bool {
        self.owner_chain.permits(user, matching)
    }

    /// Add `user` to the owner chain. Returns false when already present.
    pub fn share_with(&mut self, user: &str, matching: AccessMatching) -> bool {
        if self.owner_chain.permits(user, matching) {
            return false;
        }
        self.owner_chain = self.owner_chain.append_with(user, matching);
        true
    }

    // === Wire conversion ===

    /// Decode a persisted record, rejecting undecodable content.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let record: DocumentRecord = serde_json::from_value(value)?;
        record.decode_content()?;
        Ok(record)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl PartialEq for DocumentRecord {
    fn eq(&self, other: &Self) -> bool {
        self.word_count == other.word_count
            && self.title == other.title
            && self.document_id == other.document_id
            && self.network_id == other.network_id
            && self.owner_chain == other.owner_chain
            && self.content == other.content
    }
}

impl Eq for DocumentRecord {}

impl fmt::Display for DocumentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.word_count)
    }
}
