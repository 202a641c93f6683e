//! Topology storage trait and the in-memory implementation.

use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::server::ServerRecord;

/// Address-keyed snapshot of every server discovered so far.
pub type Snapshot = BTreeMap<String, ServerRecord>;

/// Trait for topology storage backends.
///
/// Methods take `&self` so a store can be shared between the walker and
/// whatever renders it.
pub trait TopologyStore: Send + Sync {
    /// Insert or replace the record for `address`.
    fn upsert(&self, address: &str, record: ServerRecord);

    /// Look up a single record.
    fn get(&self, address: &str) -> Option<ServerRecord>;

    /// Copy out every record, sorted by address.
    fn all(&self) -> Snapshot;

    /// Number of stored records.
    fn len(&self) -> usize {
        self.all().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every record.
    fn clear(&self);
}

/// In-memory store guarded by a read/write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    servers: RwLock<Snapshot>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TopologyStore for MemoryStore {
    fn upsert(&self, address: &str, record: ServerRecord) {
        self.servers.write().insert(address.to_string(), record);
    }

    fn get(&self, address: &str) -> Option<ServerRecord> {
        self.servers.read().get(address).cloned()
    }

    fn all(&self) -> Snapshot {
        self.servers.read().clone()
    }

    fn len(&self) -> usize {
        self.servers.read().len()
    }

    fn clear(&self) {
        self.servers.write().clear();
    }
}

/// Return the records whose upstream is not a key of the snapshot.
///
/// Renderers draw edges by looking the upstream up, so an empty result
/// means every edge has both endpoints.
pub fn dangling_upstreams(snapshot: &Snapshot) -> Vec<&ServerRecord> {
    snapshot
        .values()
        .filter(|r| match &r.upstream {
            Some(up) => !snapshot.contains_key(up),
            None => false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::Role;
    use chrono::Utc;

    fn record(address: &str, upstream: Option<&str>, in_recovery: bool) -> ServerRecord {
        ServerRecord::from_probe(address, upstream, in_recovery, &[], Utc::now())
    }

    #[test]
    fn test_upsert_and_get() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.upsert("a", record("a", None, false));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().role, Role::Master);
        assert!(store.get("b").is_none());
    }

    #[test]
    fn test_upsert_overwrites() {
        let store = MemoryStore::new();
        store.upsert("a", record("a", None, false));
        store.upsert("a", record("a", Some("b"), true));

        assert_eq!(store.len(), 1);
        let a = store.get("a").unwrap();
        assert_eq!(a.role, Role::Replica);
        assert_eq!(a.upstream.as_deref(), Some("b"));
    }

    #[test]
    fn test_all_is_sorted_and_clear_empties() {
        let store = MemoryStore::new();
        store.upsert("c", record("c", Some("a"), true));
        store.upsert("a", record("a", None, false));
        store.upsert("b", record("b", Some("a"), true));

        let keys: Vec<_> = store.all().into_keys().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_dangling_upstreams() {
        let store = MemoryStore::new();
        store.upsert("a", record("a", None, false));
        store.upsert("b", record("b", Some("a"), true));
        store.upsert("c", record("c", Some("gone"), true));

        let snapshot = store.all();
        let dangling = dangling_upstreams(&snapshot);
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].address, "c");
    }
}
