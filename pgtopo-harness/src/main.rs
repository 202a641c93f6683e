//! pgtopo service entry point.

use clap::Parser;
use pgtopo::{MemoryStore, PgProber, WalkerBuilder};
use pgtopo_harness::config::Args;
use pgtopo_harness::{run_server, telemetry, AppState};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    telemetry::init(&args.log_level)?;

    let probe_config = args.probe_config();
    info!(
        listen = %args.listen,
        default_host = %args.default_host,
        pg_port = probe_config.port,
        pg_user = %probe_config.user,
        policy = ?args.failure_policy,
        "Starting pgtopo"
    );

    let walker = WalkerBuilder::new(PgProber::new(probe_config), MemoryStore::new())
        .failure_policy(args.failure_policy.into())
        .max_depth(args.max_depth)
        .build();
    let state = Arc::new(AppState::new(walker, args.default_host.clone()));

    run_server(state, args.listen, args.static_dir.clone()).await
}
