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

//! Version Chain - upload deduplication
//!
//! Decides what an upload does to the stored record for its title:
//!
//! ```text
//! no record ───────────────────────────────► Created   (sentinel history)
//! record ──► candidate == existing ────────► Unchanged (nothing written)
//!        └─► candidate != existing ────────► Versioned (existing snapshot appended)
//! ```
//!
//! The candidate keeps the existing document id and history, takes its
//! content and word count from the uploaded bytes, and inherits the existing
//! owner chain with the uploader appended. Planning is pure; persisting the
//! outcome is the caller's job.

use docshare_core::{
    generate_document_id, AccessChain, AccessMatching, DocumentRecord, Result,
};

/// An incoming upload.
#[derive(Debug, Clone, Copy)]
pub struct UploadRequest<'a> {
    pub network_id: &'a str,
    pub title: &'a str,
    pub uploader: &'a str,
    pub contents: &'a [u8],
}

/// What an upload resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// No record had this title; a fresh one was created.
    Created(DocumentRecord),
    /// Identical to the stored record; nothing changed.
    Unchanged(DocumentRecord),
    /// The stored record was superseded and pushed into the history.
    Versioned(DocumentRecord),
}

impl UploadOutcome {
    pub fn record(&self) -> &DocumentRecord {
        match self {
            UploadOutcome::Created(r) | UploadOutcome::Unchanged(r) | UploadOutcome::Versioned(r) => r,
        }
    }

    pub fn into_record(self) -> DocumentRecord {
        match self {
            UploadOutcome::Created(r) | UploadOutcome::Unchanged(r) | UploadOutcome::Versioned(r) => r,
        }
    }

    /// Whether the record must be written to the store.
    pub fn needs_write(&self) -> bool {
        !matches!(self, UploadOutcome::Unchanged(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            UploadOutcome::Created(_) => "created",
            UploadOutcome::Unchanged(_) => "unchanged",
            UploadOutcome::Versioned(_) => "versioned",
        }
    }
}

/// Upload planner.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionChain {
    matching: AccessMatching,
}

impl VersionChain {
    pub fn new(matching: AccessMatching) -> Self {
        Self { matching }
    }

    /// Plan an upload against the record currently stored for its title.
    pub fn plan(&self, existing: Option<DocumentRecord>, request: &UploadRequest<'_>) -> Result<UploadOutcome> {
        let Some(existing) = existing else {
            return Ok(UploadOutcome::Created(DocumentRecord::new(
                AccessChain::new(request.uploader),
                request.network_id,
                generate_document_id(),
                request.title,
                request.contents,
            )));
        };

        existing.decode_content()?;

        let owner_chain = existing
            .owner_chain()
            .append_with(request.uploader, self.matching);

        let mut candidate = DocumentRecord::with_history(
            owner_chain,
            request.network_id,
            existing.document_id(),
            request.title,
            request.contents,
            existing.version_history().to_vec(),
        );

        if candidate == existing {
            return Ok(UploadOutcome::Unchanged(existing));
        }

        candidate.push_version(existing.snapshot());
        Ok(UploadOutcome::Versioned(candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docshare_core::DocError;
    use serde_json::json;

    fn request<'a>(uploader: &'a str, contents: &'a [u8]) -> UploadRequest<'a> {
        UploadRequest {
            network_id: "NET1",
            title: "hello",
            uploader,
            contents,
        }
    }

    fn created(contents: &[u8]) -> DocumentRecord {
        VersionChain::default()
            .plan(None, &request("alice", contents))
            .unwrap()
            .into_record()
    }

    #[test]
    fn test_fresh_upload_creates_with_sentinel() {
        let outcome = VersionChain::default()
            .plan(None, &request("alice", b"hi there"))
            .unwrap();
        assert!(matches!(outcome, UploadOutcome::Created(_)));
        assert!(outcome.needs_write());

        let doc = outcome.record();
        assert_eq!(doc.word_count(), 2);
        assert_eq!(doc.owner_chain().as_str(), "alice");
        assert!(doc.document_id().starts_with("doc"));
        assert_eq!(doc.version_history().len(), 1);
    }

    #[test]
    fn test_identical_upload_is_unchanged() {
        let existing = created(b"hi there");
        let outcome = VersionChain::default()
            .plan(Some(existing.clone()), &request("alice", b"hi there"))
            .unwrap();

        assert_eq!(outcome.kind(), "unchanged");
        assert!(!outcome.needs_write());
        assert_eq!(outcome.record().version_history().len(), 1);
        assert_eq!(outcome.into_record(), existing);
    }

    #[test]
    fn test_changed_upload_appends_previous() {
        let existing = created(b"hi there");
        let outcome = VersionChain::default()
            .plan(Some(existing.clone()), &request("alice", b"hi there you"))
            .unwrap();

        let UploadOutcome::Versioned(doc) = outcome else {
            panic!("expected a new version");
        };
        assert_eq!(doc.word_count(), 3);
        assert_eq!(doc.document_id(), existing.document_id());
        assert_eq!(doc.version_history().len(), 2);
        assert_eq!(doc.version_history()[1], existing.snapshot());
        assert_eq!(doc.version_history()[1].word_count, 2);
    }

    #[test]
    fn test_shared_users_survive_reupload() {
        let mut existing = created(b"v1");
        existing.share_with("bob", AccessMatching::Substring);

        let doc = VersionChain::default()
            .plan(Some(existing), &request("bob", b"v2"))
            .unwrap()
            .into_record();
        assert_eq!(doc.owner_chain().as_str(), "alice/bob");
    }

    #[test]
    fn test_new_uploader_is_a_metadata_change() {
        let existing = created(b"same");
        let outcome = VersionChain::default()
            .plan(Some(existing), &request("carol", b"same"))
            .unwrap();
        assert_eq!(outcome.kind(), "versioned");
        assert_eq!(outcome.record().owner_chain().as_str(), "alice/carol");
    }

    #[test]
    fn test_undecodable_existing_content_fails() {
        // bypasses from_value validation by deserializing directly
        let existing: DocumentRecord = serde_json::from_value(json!({
            "userId": "alice", "clientId": "NET1", "docId": "docABC1",
            "title": "hello", "wordCount": 1, "fileString": "#***"
        }))
        .unwrap();

        let err = VersionChain::default()
            .plan(Some(existing), &request("alice", b"x"))
            .unwrap_err();
        assert!(matches!(err, DocError::Malformed(_)));
    }
}
