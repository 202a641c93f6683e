//! Discovered server records and replication roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Replication role of a discovered server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Not in recovery: the root of the tree.
    Master,
    /// A standby that has its own replication clients.
    Relay,
    /// A standby with no replication clients.
    Replica,
}

impl Role {
    /// Classify a server from its recovery flag and number of connected clients.
    pub fn classify(in_recovery: bool, client_count: usize) -> Self {
        if !in_recovery {
            Self::Master
        } else if client_count > 0 {
            Self::Relay
        } else {
            Self::Replica
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Relay => "relay",
            Self::Replica => "replica",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One discovered server, keyed by its address in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRecord {
    #[serde(rename = "type")]
    pub role: Role,
    pub address: String,
    /// Address this server replicates from. `None` for the root.
    #[serde(rename = "follows", default, skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,
    pub last_seen: DateTime<Utc>,
    /// Replication clients seen on this server, stamped with the probe time.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub clients: BTreeMap<String, DateTime<Utc>>,
}

impl ServerRecord {
    /// Build a record from a single probe taken at `seen`.
    pub fn from_probe(
        address: &str,
        upstream: Option<&str>,
        in_recovery: bool,
        clients: &[String],
        seen: DateTime<Utc>,
    ) -> Self {
        let clients: BTreeMap<String, DateTime<Utc>> =
            clients.iter().map(|c| (c.clone(), seen)).collect();

        Self {
            role: Role::classify(in_recovery, clients.len()),
            address: address.to_string(),
            upstream: upstream.filter(|u| !u.is_empty()).map(str::to_string),
            last_seen: seen,
            clients,
        }
    }

    /// True when this server was the starting point of a walk.
    pub fn is_root(&self) -> bool {
        self.upstream.is_none()
    }
}
