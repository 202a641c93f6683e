//! Probing interface for replication state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::DiscoveryError;

/// What a single server reports about its replication state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplicationState {
    /// True when the server is a standby receiving a replication stream.
    pub in_recovery: bool,
    /// Addresses of the replication clients currently connected to it.
    pub clients: Vec<String>,
}

/// Connects to a server and reads its replication state.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe `address`. Connection and query failures come back as errors;
    /// the walker decides what to do with them.
    async fn probe(&self, address: &str) -> Result<ReplicationState, DiscoveryError>;
}

#[async_trait]
impl<P: Prober + ?Sized> Prober for Arc<P> {
    async fn probe(&self, address: &str) -> Result<ReplicationState, DiscoveryError> {
        (**self).probe(address).await
    }
}

/// Source of the timestamps stamped on discovered records.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A prober that answers from a fixed table instead of a database.
///
/// Useful for testing or for demos without a replication cluster.
/// Addresses missing from the table fail as unreachable.
#[derive(Debug, Default)]
pub struct ScriptedProber {
    servers: HashMap<String, Scripted>,
    calls: Mutex<Vec<String>>,
}

#[derive(Debug, Clone)]
enum Scripted {
    Up(ReplicationState),
    QueryFails(String),
    TimesOut(&'static str),
}

impl ScriptedProber {
    /// Create an empty prober.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a server that is not in recovery.
    pub fn master(self, address: &str, clients: &[&str]) -> Self {
        self.server(address, false, clients)
    }

    /// Add a standby server.
    pub fn standby(self, address: &str, clients: &[&str]) -> Self {
        self.server(address, true, clients)
    }

    /// Add a server with an explicit recovery flag.
    pub fn server(mut self, address: &str, in_recovery: bool, clients: &[&str]) -> Self {
        let state = ReplicationState {
            in_recovery,
            clients: clients.iter().map(|c| c.to_string()).collect(),
        };
        self.servers.insert(address.to_string(), Scripted::Up(state));
        self
    }

    /// Add a server that accepts connections but fails its queries.
    pub fn failing_queries(mut self, address: &str, message: &str) -> Self {
        self.servers
            .insert(address.to_string(), Scripted::QueryFails(message.to_string()));
        self
    }

    /// Add a server whose `stage` never finishes before its deadline.
    pub fn timing_out(mut self, address: &str, stage: &'static str) -> Self {
        self.servers
            .insert(address.to_string(), Scripted::TimesOut(stage));
        self
    }

    /// Addresses probed so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, address: &str) -> Result<ReplicationState, DiscoveryError> {
        self.calls.lock().push(address.to_string());

        match self.servers.get(address) {
            Some(Scripted::Up(state)) => Ok(state.clone()),
            Some(Scripted::QueryFails(message)) => Err(DiscoveryError::query(
                address,
                anyhow::anyhow!("{}", message),
            )),
            Some(Scripted::TimesOut(stage)) => Err(DiscoveryError::Timeout {
                address: address.to_string(),
                stage: *stage,
            }),
            None => Err(DiscoveryError::connection(
                address,
                anyhow::anyhow!("no route to host"),
            )),
        }
    }
}
