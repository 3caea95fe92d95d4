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

//! Store Bridge - callback completions as futures
//!
//! ```text
//! caller ──► StoreBridge::put ──► CallbackStore::set(path, value, cb)
//!   ▲                                              │
//!   └──────── oneshot::Receiver ◄── cb sends once ─┘
//! ```
//!
//! Every primitive registers exactly one callback holding the sending half
//! of a oneshot channel, so each returned future resolves at most once.
//! There is no retry. Without a configured timeout a request the store never
//! completes stays pending; dropping the future does not cancel the store
//! request. A timed-out read is `StoreTransient`; a timed-out write is
//! `OutcomeUnknown`, since the store may still apply it.
//!
//! Every primitive takes a network id as its namespace and rejects one that
//! is empty or contains `/` before touching the store.

use crate::store::{join_path, CallbackStore, StoreFault};
use docshare_core::{
    validate_network_id, AccessMatching, BridgeConfig, DocError, DocumentRecord, Result,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Awaitable facade over a [`CallbackStore`].
pub struct StoreBridge<S: ?Sized> {
    store: Arc<S>,
    config: BridgeConfig,
}

impl<S: ?Sized> Clone for StoreBridge<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
        }
    }
}

/// Whether a request can change the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Read,
    Write,
}

fn fault_to_error(prefix: &str, fault: StoreFault) -> DocError {
    DocError::StoreTransient(format!("{}{}", prefix, fault.message))
}

impl<S: CallbackStore + ?Sized> StoreBridge<S> {
    pub fn new(store: Arc<S>, config: BridgeConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Wait for the single completion, honoring the configured timeout.
    async fn await_completion<T>(
        &self,
        operation: &'static str,
        kind: RequestKind,
        rx: oneshot::Receiver<T>,
    ) -> Result<T> {
        let received = match self.config.request_timeout() {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(received) => received,
                Err(_) => {
                    let timeout_ms = limit.as_millis() as u64;
                    warn!(operation, timeout_ms, write = kind == RequestKind::Write, "Store request timed out");
                    return Err(match kind {
                        RequestKind::Read => DocError::StoreTransient(format!(
                            "store request timed out after {} ms",
                            timeout_ms
                        )),
                        RequestKind::Write => DocError::OutcomeUnknown(format!(
                            "store write timed out after {} ms and may still be applied",
                            timeout_ms
                        )),
                    });
                }
            },
            None => rx.await,
        };

        received.map_err(|_| {
            warn!(operation, "Store dropped the completion callback");
            DocError::StoreTransient("store dropped the completion callback".to_string())
        })
    }

    // === Primitives ===

    /// Create an empty namespace directly under the root.
    pub async fn create_namespace(&self, name: &str) -> Result<String> {
        validate_network_id(name)?;
        let (tx, rx) = oneshot::channel();
        let mut children = Map::new();
        children.insert(name.to_string(), Value::String(String::new()));
        self.store.update_children(
            "",
            children,
            Box::new(move |r| {
                let _ = tx.send(r);
            }),
        );

        match self.await_completion("create_namespace", RequestKind::Write, rx).await? {
            Ok(()) => {
                debug!(namespace = name, "Collection created successfully");
                Ok(name.to_string())
            }
            Err(fault) => {
                warn!(namespace = name, error = %fault, "Collection could not be created");
                Err(fault_to_error("Collection could not be created: ", fault))
            }
        }
    }

    /// Remove a namespace and everything below it.
    pub async fn delete_namespace(&self, name: &str) -> Result<String> {
        validate_network_id(name)?;
        let (tx, rx) = oneshot::channel();
        self.store.remove(
            &join_path(&[name]),
            Box::new(move |r| {
                let _ = tx.send(r);
            }),
        );

        match self.await_completion("delete_namespace", RequestKind::Write, rx).await? {
            Ok(()) => {
                debug!(namespace = name, "Collection deleted successfully");
                Ok(name.to_string())
            }
            Err(fault) => {
                warn!(namespace = name, error = %fault, "Error deleting documents in collection");
                Err(fault_to_error("Error deleting documents in collection: ", fault))
            }
        }
    }

    /// Store `value` at `namespace/key`, returning it on success.
    pub async fn put(&self, namespace: &str, key: &str, value: Value) -> Result<Value> {
        self.set_value("put", namespace, key, value, "Data could not be added: ")
            .await
    }

    /// Overwrite the value at `namespace/key`, returning it on success.
    pub async fn update(&self, namespace: &str, key: &str, value: Value) -> Result<Value> {
        self.set_value("update", namespace, key, value, "Value could not be changed: ")
            .await
    }

    async fn set_value(
        &self,
        operation: &'static str,
        namespace: &str,
        key: &str,
        value: Value,
        error_prefix: &str,
    ) -> Result<Value> {
        validate_network_id(namespace)?;
        let path = join_path(&[namespace, key]);
        let (tx, rx) = oneshot::channel();
        self.store.set(
            &path,
            value.clone(),
            Box::new(move |r| {
                let _ = tx.send(r);
            }),
        );

        match self.await_completion(operation, RequestKind::Write, rx).await? {
            Ok(()) => {
                debug!(operation, path = %path, "Value written successfully");
                Ok(value)
            }
            Err(fault) => {
                warn!(operation, path = %path, error = %fault, "Value could not be written");
                Err(fault_to_error(error_prefix, fault))
            }
        }
    }

    /// Delete `namespace/key`.
    pub async fn remove(&self, namespace: &str, key: &str) -> Result<()> {
        validate_network_id(namespace)?;
        let path = join_path(&[namespace, key]);
        let (tx, rx) = oneshot::channel();
        self.store.remove(
            &path,
            Box::new(move |r| {
                let _ = tx.send(r);
            }),
        );

        match self.await_completion("remove", RequestKind::Write, rx).await? {
            Ok(()) => {
                debug!(path = %path, "Data removed successfully");
                Ok(())
            }
            Err(fault) => {
                warn!(path = %path, error = %fault, "Data could not be removed");
                Err(fault_to_error("Data could not be removed: ", fault))
            }
        }
    }

    /// Read `namespace/key`; absence is `NotFound`.
    pub async fn get(&self, namespace: &str, key: &str) -> Result<Value> {
        validate_network_id(namespace)?;
        let path = join_path(&[namespace, key]);
        let (tx, rx) = oneshot::channel();
        self.store.read_once(
            &path,
            Box::new(move |r| {
                let _ = tx.send(r);
            }),
        );

        match self.await_completion("get", RequestKind::Read, rx).await? {
            Ok(Some(value)) => {
                debug!(path = %path, "The value has been successfully retrieved");
                Ok(value)
            }
            Ok(None) => Err(DocError::NotFound("Value not found.".to_string())),
            Err(fault) => {
                warn!(path = %path, error = %fault, "Read failed");
                Err(DocError::StoreTransient(fault.message))
            }
        }
    }

    /// Direct children of `namespace` in store order.
    pub async fn scan(&self, namespace: &str) -> Result<Vec<(String, Value)>> {
        validate_network_id(namespace)?;
        let path = join_path(&[namespace]);
        let (tx, rx) = oneshot::channel();
        self.store.read_children_once(
            &path,
            Box::new(move |r| {
                let _ = tx.send(r);
            }),
        );

        self.await_completion("scan", RequestKind::Read, rx).await?.map_err(|fault| {
            warn!(path = %path, error = %fault, "Scan failed");
            DocError::StoreTransient(fault.message)
        })
    }

    // === Layered queries ===

    /// First child of `namespace` whose `title` field equals `title`.
    ///
    /// Linear scan in store order; with duplicate titles the first one wins.
    pub async fn search_by_title(&self, namespace: &str, title: &str) -> Result<Option<(String, Value)>> {
        let children = self.scan(namespace).await?;
        Ok(children.into_iter().find(|(_, value)| {
            value.get("title").and_then(Value::as_str) == Some(title)
        }))
    }

    /// Every record in `namespace` that `user` may see, in scan order.
    ///
    /// Non-object children (such as the namespace placeholder) are skipped;
    /// an object child that does not decode fails the whole collection.
    pub async fn collect_accessible(
        &self,
        namespace: &str,
        user: &str,
        matching: AccessMatching,
    ) -> Result<Vec<DocumentRecord>> {
        let mut accessible = Vec::new();
        for (key, value) in self.scan(namespace).await? {
            if !value.is_object() {
                continue;
            }
            let record = DocumentRecord::from_value(value).map_err(|e| {
                warn!(namespace, key = %key, error = %e, "Undecodable record during collection");
                e
            })?;
            if record.permits(user, matching) {
                accessible.push(record);
            }
        }
        Ok(accessible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use docshare_core::AccessChain;
    use serde_json::json;
    use std::time::Duration;

    fn bridge() -> (Arc<MemoryStore>, StoreBridge<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let bridge = StoreBridge::new(store.clone(), BridgeConfig::default());
        (store, bridge)
    }

    fn record_value(owner: &str, doc_id: &str, title: &str) -> Value {
        DocumentRecord::new(AccessChain::from(owner), "NET1", doc_id, title, b"some words")
            .to_value()
            .unwrap()
    }

    #[tokio::test]
    async fn test_put_get_remove() {
        let (_, bridge) = bridge();
        bridge.create_namespace("NET1").await.unwrap();

        let stored = bridge.put("NET1", "doc1", json!({"title": "a"})).await.unwrap();
        assert_eq!(stored, json!({"title": "a"}));
        assert_eq!(bridge.get("NET1", "doc1").await.unwrap(), json!({"title": "a"}));

        bridge.update("NET1", "doc1/title", json!("b")).await.unwrap();
        assert_eq!(bridge.get("NET1", "doc1/title").await.unwrap(), json!("b"));

        bridge.remove("NET1", "doc1").await.unwrap();
        let err = bridge.get("NET1", "doc1").await.unwrap_err();
        assert_eq!(err, DocError::NotFound("Value not found.".to_string()));
    }

    #[tokio::test]
    async fn test_namespace_lifecycle() {
        let (store, bridge) = bridge();
        assert_eq!(bridge.create_namespace("NET1").await.unwrap(), "NET1");
        assert_eq!(store.peek("NET1"), Some(json!("")));

        bridge.put("NET1", "doc1", json!({"title": "a"})).await.unwrap();
        assert_eq!(bridge.delete_namespace("NET1").await.unwrap(), "NET1");
        assert_eq!(store.peek("NET1"), None);
    }

    #[tokio::test]
    async fn test_faults_carry_prefixed_message() {
        let (store, bridge) = bridge();
        store.inject_fault(Some("Permission denied"));

        let err = bridge.put("NET1", "doc1", json!(1)).await.unwrap_err();
        assert_eq!(
            err,
            DocError::StoreTransient("Data could not be added: Permission denied".to_string())
        );

        let err = bridge.create_namespace("NET1").await.unwrap_err();
        assert_eq!(
            err.message(),
            "Collection could not be created: Permission denied"
        );

        let err = bridge.scan("NET1").await.unwrap_err();
        assert_eq!(err, DocError::StoreTransient("Permission denied".to_string()));
    }

    #[tokio::test]
    async fn test_search_by_title_first_match_in_order() {
        let (_, bridge) = bridge();
        bridge.create_namespace("NET1").await.unwrap();
        bridge.put("NET1", "docA", record_value("alice", "docA", "dup")).await.unwrap();
        bridge.put("NET1", "docB", record_value("alice", "docB", "dup")).await.unwrap();
        bridge.put("NET1", "docC", record_value("alice", "docC", "other")).await.unwrap();

        let (key, _) = bridge.search_by_title("NET1", "dup").await.unwrap().unwrap();
        assert_eq!(key, "docA");
        assert!(bridge.search_by_title("NET1", "missing").await.unwrap().is_none());
        assert!(bridge.search_by_title("EMPTY", "dup").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_collect_accessible() {
        let (_, bridge) = bridge();
        bridge.create_namespace("NET1").await.unwrap();
        bridge.put("NET1", "doc1", record_value("alice/bob", "doc1", "one")).await.unwrap();
        bridge.put("NET1", "doc2", record_value("carol", "doc2", "two")).await.unwrap();
        bridge.put("NET1", "doc3", record_value("bobby", "doc3", "three")).await.unwrap();

        let titles = |docs: Vec<DocumentRecord>| -> Vec<String> {
            docs.iter().map(|d| d.title().to_string()).collect()
        };

        let substring = bridge
            .collect_accessible("NET1", "bob", AccessMatching::Substring)
            .await
            .unwrap();
        assert_eq!(titles(substring), vec!["one", "three"]);

        let exact = bridge
            .collect_accessible("NET1", "bob", AccessMatching::Exact)
            .await
            .unwrap();
        assert_eq!(titles(exact), vec!["one"]);
    }

    #[tokio::test]
    async fn test_collect_rejects_malformed_record() {
        let (_, bridge) = bridge();
        bridge.put("NET1", "doc1", json!({"title": "broken"})).await.unwrap();
        let err = bridge
            .collect_accessible("NET1", "alice", AccessMatching::Substring)
            .await
            .unwrap_err();
        assert!(matches!(err, DocError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_stalled_request_times_out_when_configured() {
        let store = Arc::new(MemoryStore::new());
        store.stall();
        let bridge = StoreBridge::new(
            store.clone(),
            BridgeConfig {
                request_timeout_ms: Some(20),
            },
        );

        let err = bridge.get("NET1", "doc1").await.unwrap_err();
        assert_eq!(
            err,
            DocError::StoreTransient("store request timed out after 20 ms".to_string())
        );

        // the abandoned callback is still registered and completes harmlessly
        assert_eq!(store.parked_count(), 1);
        store.resume();
    }

    #[tokio::test]
    async fn test_stalled_write_times_out_as_unknown() {
        let store = Arc::new(MemoryStore::new());
        store.stall();
        let bridge = StoreBridge::new(
            store.clone(),
            BridgeConfig {
                request_timeout_ms: Some(20),
            },
        );

        let err = bridge.put("NET1", "doc1", json!(1)).await.unwrap_err();
        assert_eq!(
            err,
            DocError::OutcomeUnknown(
                "store write timed out after 20 ms and may still be applied".to_string()
            )
        );

        // the write lands after the caller gave up on it
        store.resume();
        assert_eq!(store.peek("NET1/doc1"), Some(json!(1)));
    }

    #[tokio::test]
    async fn test_invalid_namespace_never_reaches_store() {
        let (store, bridge) = bridge();
        bridge.put("NET1", "doc1", json!({"title": "a"})).await.unwrap();
        let before = store.stats();

        for bad in ["", "NET1/doc1"] {
            assert!(matches!(
                bridge.delete_namespace(bad).await,
                Err(DocError::InvalidArgument(_))
            ));
            assert!(matches!(
                bridge.create_namespace(bad).await,
                Err(DocError::InvalidArgument(_))
            ));
            assert!(matches!(
                bridge.put(bad, "x", json!(1)).await,
                Err(DocError::InvalidArgument(_))
            ));
            assert!(matches!(bridge.scan(bad).await, Err(DocError::InvalidArgument(_))));
            assert!(matches!(bridge.get(bad, "x").await, Err(DocError::InvalidArgument(_))));
            assert!(matches!(bridge.remove(bad, "x").await, Err(DocError::InvalidArgument(_))));
        }

        assert_eq!(store.stats(), before);
        assert_eq!(store.peek("NET1/doc1/title"), Some(json!("a")));
    }

    #[tokio::test]
    async fn test_stalled_request_stays_pending_without_timeout() {
        let store = Arc::new(MemoryStore::new());
        store.stall();
        let bridge = StoreBridge::new(store.clone(), BridgeConfig::default());

        let pending = bridge.put("NET1", "doc1", json!(1));
        let waited = tokio::time::timeout(Duration::from_millis(30), pending).await;
        assert!(waited.is_err());
    }

    struct DroppingStore;

    impl CallbackStore for DroppingStore {
        fn set(&self, _: &str, _: Value, _: crate::store::CompletionCallback) {}
        fn update_children(&self, _: &str, _: Map<String, Value>, _: crate::store::CompletionCallback) {}
        fn remove(&self, _: &str, _: crate::store::CompletionCallback) {}
        fn read_once(&self, _: &str, _: crate::store::ValueListener) {}
        fn read_children_once(&self, _: &str, _: crate::store::ChildrenListener) {}
    }

    #[tokio::test]
    async fn test_dropped_callback_resolves_with_error() {
        let bridge = StoreBridge::new(Arc::new(DroppingStore), BridgeConfig::default());
        let err = bridge.remove("NET1", "doc1").await.unwrap_err();
        assert_eq!(
            err,
            DocError::StoreTransient("store dropped the completion callback".to_string())
        );
    }
}
