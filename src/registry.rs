//! UUID-keyed connection registry.
//!
//! A plain hashed map behind a single mutex, used in place of a 256-way
//! UUID trie: lookup is O(1) amortized in the key length either way, and a
//! hashed map needs no pointer-graph bookkeeping at all.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::connection::Connection;

#[derive(Default)]
pub struct Registry {
    connections: Mutex<HashMap<Uuid, Arc<Connection>>>,
}

impl Registry {
    pub fn new() -> Arc<Self> {
        Arc::new(Registry::default())
    }

    /// Insert `conn`, serialized under the registry lock. Overwrites any
    /// existing entry under the same UUID (UUIDs are expected unique).
    pub fn register(&self, conn: Arc<Connection>) {
        let mut guard = self.connections.lock().unwrap_or_else(|e| e.into_inner());
        guard.insert(conn.id, conn);
    }

    /// Look up a connection by UUID. Returns a strong `Arc` clone rather
    /// than a borrow, so the caller can hold it past any subsequent
    /// registry mutation.
    pub fn find(&self, id: Uuid) -> Option<Arc<Connection>> {
        let guard = self.connections.lock().unwrap_or_else(|e| e.into_inner());
        guard.get(&id).cloned()
    }

    /// Remove a connection. A no-op if it's already gone.
    pub fn remove(&self, id: Uuid) {
        let mut guard = self.connections.lock().unwrap_or_else(|e| e.into_inner());
        guard.remove(&id);
    }

    /// Number of currently-registered connections. Exposed for tests and
    /// diagnostics only.
    pub fn len(&self) -> usize {
        let guard = self.connections.lock().unwrap_or_else(|e| e.into_inner());
        guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every registered connection.
    pub fn cleanup(&self) {
        let mut guard = self.connections.lock().unwrap_or_else(|e| e.into_inner());
        guard.clear();
    }
}
