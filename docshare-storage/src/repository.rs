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

//! Document Repository - caller-facing operations
//!
//! Networks, uploads with deduplication, sharing, deletion, reports and
//! listings over any [`CallbackStore`]. Records live at
//! `<network>/<docId>` and are found by title.
//!
//! Uploads, shares and deletes of the same `(network, title)` are serialized
//! inside one repository when `serialize_writes` is on. Writers in other
//! processes can still interleave between the title search and the write.
//!
//! Network ids from callers are checked with [`validate_network_id`] before
//! any guard is taken or path is built.

use crate::bridge::StoreBridge;
use crate::store::{join_path, CallbackStore};
use crate::versioning::{UploadOutcome, UploadRequest, VersionChain};
use dashmap::DashMap;
use docshare_core::{
    compare, encoding, generate_network_id, usage_statistics, validate_network_id, AccessChain,
    DocError, DocumentRecord, RepositoryConfig, Result, VersionSnapshot,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

const NO_SUCH_DOCUMENT: &str = "No such document exists.";
const NO_ACCESS: &str = "Your user does not have access to this document";

/// Result of a share request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    /// The target was appended; carries the new chain.
    Shared(AccessChain),
    /// The target could already see the document; carries the unchanged chain.
    AlreadyShared(AccessChain),
}

impl ShareOutcome {
    pub fn chain(&self) -> &AccessChain {
        match self {
            ShareOutcome::Shared(chain) | ShareOutcome::AlreadyShared(chain) => chain,
        }
    }
}

/// A record together with the store key it was found under.
#[derive(Debug, Clone)]
struct StoredDocument {
    key: String,
    record: DocumentRecord,
}

/// Fields read from a caller-supplied document body.
#[derive(Debug, Deserialize)]
struct SuppliedDocument {
    title: String,
    #[serde(rename = "fileString")]
    content: String,
}

/// Multi-user document repository
pub struct DocumentRepository<S: CallbackStore + ?Sized> {
    bridge: StoreBridge<S>,
    versions: VersionChain,
    config: RepositoryConfig,
    /// Per `(network, title)` write guards
    write_guards: DashMap<(String, String), Arc<Mutex<()>>>,
}

impl<S: CallbackStore + ?Sized> DocumentRepository<S> {
    pub fn new(store: Arc<S>, config: RepositoryConfig) -> Self {
        Self {
            bridge: StoreBridge::new(store, config.bridge.clone()),
            versions: VersionChain::new(config.access_matching),
            config,
            write_guards: DashMap::new(),
        }
    }

    pub fn bridge(&self) -> &StoreBridge<S> {
        &self.bridge
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    // === Networks ===

    /// Create a namespace under a freshly generated network id.
    pub async fn register_network(&self) -> Result<String> {
        let network = self.bridge.create_namespace(&generate_network_id()).await?;
        info!(network = %network, "Network registered");
        Ok(network)
    }

    /// Remove a network with every document in it.
    pub async fn delete_network(&self, network: &str) -> Result<String> {
        validate_network_id(network)?;
        let network = self.bridge.delete_namespace(network).await?;
        self.write_guards
            .retain(|(guarded, _), lock| *guarded != network || Arc::strong_count(lock) > 1);
        info!(network = %network, "Network deleted");
        Ok(network)
    }

    // === Writes ===

    /// Store `contents` under `title`, creating, versioning or leaving the
    /// record alone.
    pub async fn upload(
        &self,
        network: &str,
        title: &str,
        uploader: &str,
        contents: &[u8],
    ) -> Result<UploadOutcome> {
        validate_network_id(network)?;
        let _guard = self.write_guard(network, title).await;

        let existing = self.find(network, title).await?;
        let key = existing.as_ref().map(|doc| doc.key.clone());
        let request = UploadRequest {
            network_id: network,
            title,
            uploader,
            contents,
        };
        let outcome = self
            .versions
            .plan(existing.map(|doc| doc.record), &request)?;

        if outcome.needs_write() {
            let record = outcome.record();
            let key = key.unwrap_or_else(|| record.document_id().to_string());
            self.bridge.put(network, &key, record.to_value()?).await?;
        }

        let record = outcome.record();
        info!(
            network,
            title,
            doc_id = record.document_id(),
            outcome = outcome.kind(),
            versions = record.previous_version_count(),
            "Upload handled"
        );
        Ok(outcome)
    }

    /// Give `target` access to the document `requester` can already see.
    pub async fn share(
        &self,
        network: &str,
        title: &str,
        requester: &str,
        target: &str,
    ) -> Result<ShareOutcome> {
        validate_network_id(network)?;
        let _guard = self.write_guard(network, title).await;
        let doc = self.require_accessible(network, title, requester).await?;

        let matching = self.config.access_matching;
        if doc.record.permits(target, matching) {
            info!(network, title, target, "User already has access");
            return Ok(ShareOutcome::AlreadyShared(doc.record.owner_chain().clone()));
        }

        let chain = doc.record.owner_chain().append_with(target, matching);
        self.bridge
            .update(
                network,
                &join_path(&[&doc.key, "userId"]),
                Value::String(chain.as_str().to_string()),
            )
            .await?;

        info!(network, title, target, chain = %chain, "Document shared");
        Ok(ShareOutcome::Shared(chain))
    }

    /// Delete the document with its whole history.
    pub async fn delete(&self, network: &str, title: &str, requester: &str) -> Result<()> {
        validate_network_id(network)?;
        let _guard = self.write_guard(network, title).await;
        let doc = self.require_accessible(network, title, requester).await?;
        self.bridge.remove(network, &doc.key).await?;
        self.release_guard(network, title);
        info!(network, title, doc_id = doc.record.document_id(), "Document deleted");
        Ok(())
    }

    // === Reads ===

    /// The stored record for `title`.
    pub async fn check(&self, network: &str, title: &str, requester: &str) -> Result<DocumentRecord> {
        Ok(self.require_accessible(network, title, requester).await?.record)
    }

    /// History entry `revision` (1-based; 0 is the sentinel).
    pub async fn previous_version(
        &self,
        network: &str,
        title: &str,
        requester: &str,
        revision: usize,
    ) -> Result<VersionSnapshot> {
        let doc = self.require_accessible(network, title, requester).await?;
        doc.record.previous_version(revision).cloned()
    }

    pub async fn statistics(&self, network: &str, title: &str, requester: &str) -> Result<String> {
        let doc = self.require_accessible(network, title, requester).await?;
        Ok(usage_statistics(&doc.record))
    }

    /// Compare two documents; both lookups run concurrently.
    pub async fn difference(
        &self,
        network: &str,
        first: &str,
        second: &str,
        requester: &str,
    ) -> Result<String> {
        let (a, b) = futures::future::try_join(self.find(network, first), self.find(network, second)).await?;

        let (Some(a), Some(b)) = (a, b) else {
            return Err(DocError::NotFound(
                "One or more of the documents does not exist".to_string(),
            ));
        };

        let matching = self.config.access_matching;
        if !a.record.permits(requester, matching) || !b.record.permits(requester, matching) {
            warn!(network, first, second, requester, "Access denied for comparison");
            return Err(DocError::Forbidden(
                "Your user does not have access to one of the documents".to_string(),
            ));
        }

        Ok(compare(&a.record, &b.record))
    }

    /// Raw bytes of the current version.
    pub async fn download(&self, network: &str, title: &str, requester: &str) -> Result<Vec<u8>> {
        let doc = self.require_accessible(network, title, requester).await?;
        doc.record.decode_content()
    }

    /// Decode a caller-supplied document body into its title and raw bytes.
    pub fn decode_supplied(json: &str) -> Result<(String, Vec<u8>)> {
        let supplied: SuppliedDocument = serde_json::from_str(json)?;
        let bytes = encoding::decode(&supplied.content)?;
        Ok((supplied.title, bytes))
    }

    /// Every document in `network` that `user` may see.
    pub async fn documents(&self, network: &str, user: &str) -> Result<Vec<DocumentRecord>> {
        validate_network_id(network)?;
        self.bridge
            .collect_accessible(network, user, self.config.access_matching)
            .await
    }

    pub async fn titles(&self, network: &str, user: &str) -> Result<Vec<String>> {
        Ok(self
            .documents(network, user)
            .await?
            .iter()
            .map(|doc| doc.title().to_string())
            .collect())
    }

    // === Internals ===

    async fn write_guard(&self, network: &str, title: &str) -> Option<OwnedMutexGuard<()>> {
        if !self.config.serialize_writes {
            return None;
        }
        let lock = self
            .write_guards
            .entry((network.to_string(), title.to_string()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        Some(lock.lock_owned().await)
    }

    /// Forget the guard for `(network, title)` unless another writer holds a
    /// clone of it. Called while the caller's own guard is still held.
    fn release_guard(&self, network: &str, title: &str) {
        self.write_guards
            .remove_if(&(network.to_string(), title.to_string()), |_, lock| {
                Arc::strong_count(lock) <= 2
            });
    }

    async fn find(&self, network: &str, title: &str) -> Result<Option<StoredDocument>> {
        validate_network_id(network)?;
        match self.bridge.search_by_title(network, title).await? {
            Some((key, value)) => Ok(Some(StoredDocument {
                key,
                record: DocumentRecord::from_value(value)?,
            })),
            None => Ok(None),
        }
    }

    async fn require_accessible(&self, network: &str, title: &str, requester: &str) -> Result<StoredDocument> {
        let doc = self
            .find(network, title)
            .await?
            .ok_or_else(|| DocError::NotFound(NO_SUCH_DOCUMENT.to_string()))?;

        if !doc.record.permits(requester, self.config.access_matching) {
            warn!(network, title, requester, "Access denied");
            return Err(DocError::Forbidden(NO_ACCESS.to_string()));
        }
        Ok(doc)
    }
}
