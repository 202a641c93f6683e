//! Tests for walking replication trees against a scripted prober.

use chrono::{DateTime, TimeZone, Utc};
use pgtopo::{
    dangling_upstreams, Clock, MemoryStore, Role, ScriptedProber, TopologyStore, WalkerBuilder,
};
use std::sync::Arc;

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

fn fixed() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2015, 9, 6, 2, 58, 3).unwrap())
}

#[tokio::test]
async fn test_lone_master() {
    let prober = ScriptedProber::new().master("10.0.0.1", &[]);
    let walker = WalkerBuilder::new(prober, MemoryStore::new())
        .clock(fixed())
        .build();

    let report = walker.walk("10.0.0.1").await.unwrap();
    assert!(report.is_complete());
    assert_eq!(report.visited, vec!["10.0.0.1"]);

    let store = walker.store();
    assert_eq!(store.len(), 1);
    let master = store.get("10.0.0.1").unwrap();
    assert_eq!(master.role, Role::Master);
    assert!(master.upstream.is_none());
    assert!(master.clients.is_empty());
    assert_eq!(master.last_seen, fixed().0);
}

#[tokio::test]
async fn test_master_with_two_replicas() {
    let prober = ScriptedProber::new()
        .master("10.0.0.1", &["10.0.0.2", "10.0.0.3"])
        .standby("10.0.0.2", &[])
        .standby("10.0.0.3", &[]);
    let walker = WalkerBuilder::new(prober, MemoryStore::new()).build();

    walker.walk("10.0.0.1").await.unwrap();

    let snapshot = walker.store().all();
    assert_eq!(snapshot.len(), 3);
    assert_eq!(snapshot["10.0.0.1"].role, Role::Master);
    assert_eq!(snapshot["10.0.0.1"].clients.len(), 2);
    for child in ["10.0.0.2", "10.0.0.3"] {
        assert_eq!(snapshot[child].role, Role::Replica);
        assert_eq!(snapshot[child].upstream.as_deref(), Some("10.0.0.1"));
    }
}

#[tokio::test]
async fn test_cascading_standby_is_relay() {
    let prober = ScriptedProber::new()
        .master("10.0.0.1", &["10.0.0.2"])
        .standby("10.0.0.2", &["10.0.0.3"])
        .standby("10.0.0.3", &[]);
    let walker = WalkerBuilder::new(prober, MemoryStore::new()).build();

    walker.walk("10.0.0.1").await.unwrap();

    let snapshot = walker.store().all();
    assert_eq!(snapshot["10.0.0.1"].role, Role::Master);
    assert_eq!(snapshot["10.0.0.2"].role, Role::Relay);
    assert_eq!(snapshot["10.0.0.2"].upstream.as_deref(), Some("10.0.0.1"));
    assert_eq!(snapshot["10.0.0.3"].role, Role::Replica);
    assert_eq!(snapshot["10.0.0.3"].upstream.as_deref(), Some("10.0.0.2"));
}

#[tokio::test]
async fn test_single_master_and_no_dangling_upstreams() {
    let prober = ScriptedProber::new()
        .master("m", &["r1", "r2"])
        .standby("r1", &["l1", "l2"])
        .standby("r2", &[])
        .standby("l1", &["l3"])
        .standby("l2", &[])
        .standby("l3", &[]);
    let walker = WalkerBuilder::new(prober, MemoryStore::new()).build();

    walker.walk("m").await.unwrap();

    let snapshot = walker.store().all();
    assert_eq!(snapshot.len(), 6);

    let masters: Vec<_> = snapshot
        .values()
        .filter(|r| r.role == Role::Master)
        .collect();
    assert_eq!(masters.len(), 1);
    assert!(masters[0].is_root());

    assert!(dangling_upstreams(&snapshot).is_empty());
    assert_eq!(snapshot["l1"].role, Role::Relay);
}

#[tokio::test]
async fn test_parent_recorded_before_children_visited() {
    let prober = Arc::new(
        ScriptedProber::new()
            .master("m", &["a", "b"])
            .standby("a", &["c"])
            .standby("b", &[])
            .standby("c", &[]),
    );
    let walker = WalkerBuilder::new(prober.clone(), MemoryStore::new()).build();

    let report = walker.walk("m").await.unwrap();

    assert_eq!(prober.calls(), vec!["m", "a", "c", "b"]);
    assert_eq!(report.visited, vec!["m", "a", "c", "b"]);
}

#[tokio::test]
async fn test_walk_twice_gives_same_roles() {
    let prober = ScriptedProber::new()
        .master("m", &["a"])
        .standby("a", &["b"])
        .standby("b", &[]);
    let walker = WalkerBuilder::new(prober, MemoryStore::new()).build();

    walker.walk("m").await.unwrap();
    let first = walker.store().all();
    walker.walk("m").await.unwrap();
    let second = walker.store().all();

    assert_eq!(first.len(), second.len());
    for (address, record) in &first {
        assert_eq!(record.role, second[address].role);
        assert_eq!(record.upstream, second[address].upstream);
    }
}

#[tokio::test]
async fn test_discover_single_node_returns_clients() {
    let prober = ScriptedProber::new().standby("a", &["b", "c"]);
    let walker = WalkerBuilder::new(prober, MemoryStore::new()).build();

    let clients = walker.discover("a", Some("m")).await.unwrap();
    assert_eq!(clients, vec!["b", "c"]);

    // Only the probed node is written; children are left to the caller.
    let store = walker.store();
    assert_eq!(store.len(), 1);
    let a = store.get("a").unwrap();
    assert_eq!(a.role, Role::Relay);
    assert_eq!(a.upstream.as_deref(), Some("m"));
}

#[tokio::test]
async fn test_stale_entries_survive_later_walks() {
    let store = Arc::new(MemoryStore::new());

    let before = ScriptedProber::new()
        .master("m", &["a"])
        .standby("a", &[]);
    WalkerBuilder::with_shared_store(before, store.clone())
        .build()
        .walk("m")
        .await
        .unwrap();

    // "a" has gone away and "m" no longer lists it.
    let after = ScriptedProber::new().master("m", &[]);
    WalkerBuilder::with_shared_store(after, store.clone())
        .build()
        .walk("m")
        .await
        .unwrap();

    assert!(store.get("m").unwrap().clients.is_empty());
    assert!(store.get("a").is_some());
}
