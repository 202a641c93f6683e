//! PostgreSQL implementation of Prober.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use sqlx::{Connection, PgConnection};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::error::DiscoveryError;
use crate::probe::{Prober, ReplicationState};

const IN_RECOVERY_QUERY: &str = "SELECT pg_is_in_recovery()";

// host() drops the netmask that a plain ::text cast of inet would keep.
// client_addr is NULL for walsenders connected over a unix socket.
const CLIENTS_QUERY: &str = "SELECT host(client_addr) FROM pg_stat_replication";

/// Connection settings shared by every probe.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Port used when an address does not carry one.
    pub port: u16,
    pub user: String,
    pub database: String,
    pub connect_timeout: Duration,
    pub query_timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            port: 5432,
            user: "postgres".to_string(),
            database: "postgres".to_string(),
            connect_timeout: Duration::from_secs(5),
            query_timeout: Duration::from_secs(5),
        }
    }
}

/// Prober that opens a fresh trust-authenticated connection per server.
#[derive(Debug, Clone, Default)]
pub struct PgProber {
    config: ProbeConfig,
}

impl PgProber {
    /// Create a new PgProber.
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    fn connect_options(&self, address: &str) -> Result<PgConnectOptions, DiscoveryError> {
        let (host, port) = split_address(address, self.config.port)?;
        Ok(PgConnectOptions::new()
            .host(&host)
            .port(port)
            .username(&self.config.user)
            .database(&self.config.database)
            .ssl_mode(PgSslMode::Disable))
    }

    async fn read_state(
        &self,
        address: &str,
        conn: &mut PgConnection,
    ) -> Result<ReplicationState, DiscoveryError> {
        let in_recovery = deadline(
            address,
            "recovery query",
            self.config.query_timeout,
            sqlx::query_scalar::<_, bool>(IN_RECOVERY_QUERY).fetch_one(&mut *conn),
        )
        .await?
        .map_err(|e| DiscoveryError::query(address, e))?;

        let rows = deadline(
            address,
            "replication query",
            self.config.query_timeout,
            sqlx::query_scalar::<_, Option<String>>(CLIENTS_QUERY).fetch_all(&mut *conn),
        )
        .await?
        .map_err(|e| DiscoveryError::query(address, e))?;

        Ok(ReplicationState {
            in_recovery,
            clients: rows.into_iter().flatten().collect(),
        })
    }
}

#[async_trait]
impl Prober for PgProber {
    async fn probe(&self, address: &str) -> Result<ReplicationState, DiscoveryError> {
        let options = self.connect_options(address)?;

        let mut conn = deadline(
            address,
            "connect",
            self.config.connect_timeout,
            PgConnection::connect_with(&options),
        )
        .await?
        .map_err(|e| DiscoveryError::connection(address, e))?;

        let state = self.read_state(address, &mut conn).await;

        if let Err(e) = conn.close().await {
            debug!(address = %address, error = %e, "Failed to close probe connection");
        }

        state
    }
}

async fn deadline<F: Future>(
    address: &str,
    stage: &'static str,
    limit: Duration,
    fut: F,
) -> Result<F::Output, DiscoveryError> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| DiscoveryError::Timeout {
            address: address.to_string(),
            stage,
        })
}

/// Split `host`, `host:port`, `[v6]:port` or a bare IPv6 address.
pub fn split_address(address: &str, default_port: u16) -> Result<(String, u16), DiscoveryError> {
    let bad_port = |port: &str| {
        DiscoveryError::connection(address, anyhow::anyhow!("invalid port '{}'", port))
    };

    if let Some(rest) = address.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(|| {
            DiscoveryError::connection(address, anyhow::anyhow!("unclosed '[' in address"))
        })?;
        return match tail.strip_prefix(':') {
            Some(port) => Ok((host.to_string(), port.parse().map_err(|_| bad_port(port))?)),
            None if tail.is_empty() => Ok((host.to_string(), default_port)),
            None => Err(bad_port(tail)),
        };
    }

    match address.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => {
            Ok((host.to_string(), port.parse().map_err(|_| bad_port(port))?))
        }
        _ => Ok((address.to_string(), default_port)),
    }
}
