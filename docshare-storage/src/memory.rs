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

//! In-memory hierarchical store
//!
//! A JSON tree behind a lock, implementing [`CallbackStore`]. Writing `null`
//! removes a node, as in realtime-database style stores. Children are
//! reported in key order.
//!
//! Two hooks exist for exercising failure paths:
//! - [`MemoryStore::inject_fault`] fails every request with a message
//! - [`MemoryStore::stall`] parks requests until [`MemoryStore::resume`]

use crate::store::{
    segments, CallbackStore, ChildrenListener, CompletionCallback, StoreFault, ValueListener,
};
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};

type PendingOp = Box<dyn FnOnce(&MemoryStore) + Send + 'static>;

/// Request counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStoreStats {
    pub reads: u64,
    pub writes: u64,
    pub faults: u64,
}

/// In-memory [`CallbackStore`]
pub struct MemoryStore {
    root: RwLock<Value>,
    fault: RwLock<Option<String>>,
    /// Some while stalled; holds parked requests in arrival order.
    parked: Mutex<Option<Vec<PendingOp>>>,
    reads: AtomicU64,
    writes: AtomicU64,
    faults: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            root: RwLock::new(Value::Object(Map::new())),
            fault: RwLock::new(None),
            parked: Mutex::new(None),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            faults: AtomicU64::new(0),
        }
    }

    /// Fail every following request with `message`; `None` clears the fault.
    pub fn inject_fault(&self, message: Option<&str>) {
        *self.fault.write() = message.map(str::to_string);
    }

    /// Park every following request without applying or completing it.
    pub fn stall(&self) {
        let mut parked = self.parked.lock();
        if parked.is_none() {
            *parked = Some(Vec::new());
        }
    }

    /// Stop stalling and apply parked requests in arrival order.
    pub fn resume(&self) {
        let pending = self.parked.lock().take().unwrap_or_default();
        for op in pending {
            op(self);
        }
    }

    /// Number of requests currently parked.
    pub fn parked_count(&self) -> usize {
        self.parked.lock().as_ref().map_or(0, Vec::len)
    }

    pub fn stats(&self) -> MemoryStoreStats {
        MemoryStoreStats {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            faults: self.faults.load(Ordering::Relaxed),
        }
    }

    /// Synchronous read of a node, bypassing faults and stalls.
    pub fn peek(&self, path: &str) -> Option<Value> {
        let root = self.root.read();
        lookup(&root, &segments(path)).cloned()
    }

    fn dispatch(&self, op: PendingOp) {
        {
            let mut parked = self.parked.lock();
            if let Some(queue) = parked.as_mut() {
                queue.push(op);
                return;
            }
        }
        op(self);
    }

    fn check_fault(&self) -> Result<(), StoreFault> {
        match self.fault.read().as_ref() {
            Some(message) => {
                self.faults.fetch_add(1, Ordering::Relaxed);
                Err(StoreFault::new(message.clone()))
            }
            None => Ok(()),
        }
    }

    fn apply_set(&self, path: &str, value: Value) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        let segs = segments(path);
        let mut root = self.root.write();

        let Some((last, parents)) = segs.split_last() else {
            *root = if value.is_null() {
                Value::Object(Map::new())
            } else {
                value
            };
            return;
        };

        if value.is_null() {
            if let Some(Value::Object(parent)) = lookup_mut(&mut root, parents) {
                parent.remove(*last);
            }
            return;
        }

        object_at(&mut root, parents).insert((*last).to_string(), value);
    }

    fn apply_update(&self, path: &str, children: Map<String, Value>) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        let segs = segments(path);
        let mut root = self.root.write();
        let node = object_at(&mut root, &segs);
        for (key, value) in children {
            if value.is_null() {
                node.remove(&key);
            } else {
                node.insert(key, value);
            }
        }
    }

    fn apply_read(&self, path: &str) -> Option<Value> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let root = self.root.read();
        lookup(&root, &segments(path))
            .filter(|v| !v.is_null())
            .cloned()
    }

    fn apply_children(&self, path: &str) -> Vec<(String, Value)> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let root = self.root.read();
        match lookup(&root, &segments(path)) {
            Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            _ => Vec::new(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lookup<'a>(root: &'a Value, segs: &[&str]) -> Option<&'a Value> {
    segs.iter().try_fold(root, |node, seg| node.as_object()?.get(*seg))
}

fn lookup_mut<'a>(root: &'a mut Value, segs: &[&str]) -> Option<&'a mut Value> {
    segs.iter()
        .try_fold(root, |node, seg| node.as_object_mut()?.get_mut(*seg))
}

/// Object node at `segs`, creating intermediate objects and replacing any
/// scalar found on the way.
fn object_at<'a>(root: &'a mut Value, segs: &[&str]) -> &'a mut Map<String, Value> {
    let mut node = root;
    for seg in segs {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node = match node {
            Value::Object(map) => map
                .entry((*seg).to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            _ => unreachable!("node was just made an object"),
        };
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just made an object"),
    }
}

impl CallbackStore for MemoryStore {
    fn set(&self, path: &str, value: Value, on_complete: CompletionCallback) {
        let path = path.to_string();
        self.dispatch(Box::new(move |store: &MemoryStore| {
            let result = store.check_fault().map(|()| store.apply_set(&path, value));
            on_complete(result);
        }));
    }

    fn update_children(&self, path: &str, children: Map<String, Value>, on_complete: CompletionCallback) {
        let path = path.to_string();
        self.dispatch(Box::new(move |store: &MemoryStore| {
            let result = store
                .check_fault()
                .map(|()| store.apply_update(&path, children));
            on_complete(result);
        }));
    }

    fn remove(&self, path: &str, on_complete: CompletionCallback) {
        let path = path.to_string();
        self.dispatch(Box::new(move |store: &MemoryStore| {
            let result = store
                .check_fault()
                .map(|()| store.apply_set(&path, Value::Null));
            on_complete(result);
        }));
    }

    fn read_once(&self, path: &str, listener: ValueListener) {
        let path = path.to_string();
        self.dispatch(Box::new(move |store: &MemoryStore| {
            let result = store.check_fault().map(|()| store.apply_read(&path));
            listener(result);
        }));
    }

    fn read_children_once(&self, path: &str, listener: ChildrenListener) {
        let path = path.to_string();
        self.dispatch(Box::new(move |store: &MemoryStore| {
            let result = store.check_fault().map(|()| store.apply_children(&path));
            listener(result);
        }));
    }
}
