//! Error types for topology discovery.

use thiserror::Error;

/// Error returned while discovering a single server or walking a tree.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// The server could not be reached or refused the connection.
    #[error("cannot connect to {address}: {source}")]
    Connection {
        address: String,
        #[source]
        source: anyhow::Error,
    },

    /// The connection was established but a replication query failed.
    #[error("query against {address} failed: {source}")]
    Query {
        address: String,
        #[source]
        source: anyhow::Error,
    },

    /// A connection attempt or query ran past its deadline.
    #[error("{stage} on {address} timed out")]
    Timeout { address: String, stage: &'static str },

    /// The address is already on the active traversal path.
    #[error("replication cycle at {address} (path: {})", .path.join(" -> "))]
    CycleDetected { address: String, path: Vec<String> },

    /// The traversal went deeper than the configured limit.
    #[error("{address} is deeper than the maximum depth of {depth}")]
    DepthExceeded { address: String, depth: usize },
}

impl DiscoveryError {
    /// Create a connection error.
    pub fn connection(address: &str, err: impl Into<anyhow::Error>) -> Self {
        Self::Connection {
            address: address.to_string(),
            source: err.into(),
        }
    }

    /// Create a query error.
    pub fn query(address: &str, err: impl Into<anyhow::Error>) -> Self {
        Self::Query {
            address: address.to_string(),
            source: err.into(),
        }
    }

    /// The address of the server this error is about.
    pub fn address(&self) -> &str {
        match self {
            Self::Connection { address, .. }
            | Self::Query { address, .. }
            | Self::Timeout { address, .. }
            | Self::CycleDetected { address, .. }
            | Self::DepthExceeded { address, .. } => address,
        }
    }
}
