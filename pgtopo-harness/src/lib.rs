//! HTTP front end for pgtopo.
//!
//! Serves `/data?host=<addr>&r=<json|dot|svg>`: each request walks the
//! replication tree from `host` and renders everything discovered so far.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use pgtopo::{MemoryStore, PgProber, ProbeConfig, WalkerBuilder};
//! use pgtopo_harness::{run_server, AppState};
//!
//! let walker = WalkerBuilder::new(PgProber::new(ProbeConfig::default()), MemoryStore::new())
//!     .build();
//! let state = Arc::new(AppState::new(walker, "192.168.50.101"));
//!
//! run_server(state, "0.0.0.0:8080".parse()?, None).await?;
//! // curl 'http://localhost:8080/data?r=dot' | dot -Tpng > replication.png
//! ```
//!
//! Records are never evicted, so a server that drops out of the tree keeps
//! its last entry until the process restarts.

pub mod config;
pub mod render;
pub mod server;
pub mod telemetry;

pub use render::Format;
pub use server::{create_router, run_server, AppState, ABORTED_HEADER, FAILURES_HEADER};
