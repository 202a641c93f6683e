//! # pgtopo
//!
//! Discover a PostgreSQL streaming-replication topology from a single host.
//!
//! Starting at a known server, the walker asks each server whether it is in
//! recovery and which replication clients are connected to it, records the
//! answer, and then walks every client the same way.
//!
//! ## Roles
//!
//! - **master** - not in recovery
//! - **relay** - in recovery, with replication clients of its own
//! - **replica** - in recovery, no replication clients
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pgtopo::{MemoryStore, PgProber, ProbeConfig, TopologyStore, WalkerBuilder};
//!
//! let walker = WalkerBuilder::new(PgProber::new(ProbeConfig::default()), MemoryStore::new())
//!     .build();
//!
//! let report = walker.walk("192.168.50.101").await?;
//! for (address, server) in walker.store().all() {
//!     println!("{address} {} follows {:?}", server.role, server.upstream);
//! }
//! ```
//!
//! ## Failure handling
//!
//! By default a server that cannot be reached only costs its own branch;
//! the failure is listed in the [`WalkReport`]. Use
//! [`FailurePolicy::Abort`] to stop at the first failure instead. A client
//! address that is already on the path being walked is reported as a
//! cycle rather than followed.
//!
//! ## Feature Flags
//!
//! - `postgres` (default) - Enable the sqlx-backed [`PgProber`]

pub mod error;
pub mod probe;
pub mod server;
pub mod store;
pub mod walker;

pub use error::DiscoveryError;
pub use probe::{Clock, Prober, ReplicationState, ScriptedProber, SystemClock};
pub use server::{Role, ServerRecord};
pub use store::{dangling_upstreams, MemoryStore, Snapshot, TopologyStore};
pub use walker::{BranchFailure, FailurePolicy, WalkReport, Walker, WalkerBuilder};

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::{PgProber, ProbeConfig};
