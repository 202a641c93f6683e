//! Command-line and environment configuration.

use clap::{Parser, ValueEnum};
use pgtopo::{FailurePolicy, ProbeConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "pgtopo")]
#[command(about = "Discover and render PostgreSQL replication topologies")]
pub struct Args {
    /// Address the HTTP server listens on
    #[arg(long, env = "PGTOPO_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Host walked when a request does not pass `host`
    #[arg(long, env = "PGTOPO_DEFAULT_HOST", default_value = "192.168.50.101")]
    pub default_host: String,

    /// Port used for addresses that do not carry one
    #[arg(long, env = "PGTOPO_PG_PORT", default_value = "5432")]
    pub pg_port: u16,

    #[arg(long, env = "PGTOPO_PG_USER", default_value = "postgres")]
    pub pg_user: String,

    #[arg(long, env = "PGTOPO_PG_DATABASE", default_value = "postgres")]
    pub pg_database: String,

    /// Seconds allowed for each connection attempt
    #[arg(long, env = "PGTOPO_CONNECT_TIMEOUT_SECS", default_value = "5")]
    pub connect_timeout_secs: u64,

    /// Seconds allowed for each replication query
    #[arg(long, env = "PGTOPO_QUERY_TIMEOUT_SECS", default_value = "5")]
    pub query_timeout_secs: u64,

    /// What to do when a server cannot be probed
    #[arg(long, env = "PGTOPO_FAILURE_POLICY", value_enum, default_value = "isolate")]
    pub failure_policy: PolicyArg,

    /// Maximum number of hops below the starting host
    #[arg(long, env = "PGTOPO_MAX_DEPTH", default_value = "64")]
    pub max_depth: usize,

    /// Directory served under /static
    #[arg(long, env = "PGTOPO_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyArg {
    /// Skip failed branches and keep walking
    Isolate,
    /// Stop at the first failure
    Abort,
}

impl From<PolicyArg> for FailurePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Isolate => FailurePolicy::Isolate,
            PolicyArg::Abort => FailurePolicy::Abort,
        }
    }
}

impl Args {
    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            port: self.pg_port,
            user: self.pg_user.clone(),
            database: self.pg_database.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            query_timeout: Duration::from_secs(self.query_timeout_secs),
        }
    }
}
