//! Recursive discovery of a replication tree.

use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::DiscoveryError;
use crate::probe::{Clock, Prober, SystemClock};
use crate::server::ServerRecord;
use crate::store::TopologyStore;

/// What the walker does when a branch fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record the failure, skip the branch, keep walking its siblings.
    #[default]
    Isolate,
    /// Stop the whole walk at the first failure.
    Abort,
}

/// A branch that could not be discovered.
#[derive(Debug)]
pub struct BranchFailure {
    pub address: String,
    /// The server that reported `address` as a client. `None` for the root.
    pub upstream: Option<String>,
    pub error: DiscoveryError,
}

/// Outcome of a single walk.
#[derive(Debug)]
pub struct WalkReport {
    pub root: String,
    /// Addresses written to the store, in visit order.
    pub visited: Vec<String>,
    pub failures: Vec<BranchFailure>,
}

impl WalkReport {
    fn new(root: &str) -> Self {
        Self {
            root: root.to_string(),
            visited: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// True when every branch was discovered.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Walks a replication tree, recording each server in a topology store.
pub struct Walker<S: TopologyStore> {
    prober: Arc<dyn Prober>,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    policy: FailurePolicy,
    max_depth: usize,
}

impl<S: TopologyStore> Walker<S> {
    /// The store this walker writes to.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Probe one server, record it, and return its replication clients.
    ///
    /// Nothing is written for `address` when the probe fails.
    pub async fn discover(
        &self,
        address: &str,
        upstream: Option<&str>,
    ) -> Result<Vec<String>, DiscoveryError> {
        let state = self.prober.probe(address).await?;
        let record = ServerRecord::from_probe(
            address,
            upstream,
            state.in_recovery,
            &state.clients,
            self.clock.now(),
        );

        debug!(
            address = %address,
            role = %record.role,
            clients = state.clients.len(),
            "Discovered server"
        );

        self.store.upsert(address, record);
        Ok(state.clients)
    }

    /// Discover `root` and everything replicating from it, depth first.
    ///
    /// With [`FailurePolicy::Isolate`] this only returns `Ok`; failed
    /// branches are listed in the report instead.
    pub async fn walk(&self, root: &str) -> Result<WalkReport, DiscoveryError> {
        info!(root = %root, policy = ?self.policy, "Starting topology walk");

        let mut report = WalkReport::new(root);
        let mut path = Vec::new();
        self.visit(root.to_string(), None, &mut path, &mut report)
            .await?;

        info!(
            root = %root,
            visited = report.visited.len(),
            failures = report.failures.len(),
            "Topology walk finished"
        );

        Ok(report)
    }

    fn visit<'a>(
        &'a self,
        address: String,
        upstream: Option<String>,
        path: &'a mut Vec<String>,
        report: &'a mut WalkReport,
    ) -> BoxFuture<'a, Result<(), DiscoveryError>> {
        Box::pin(async move {
            if path.contains(&address) {
                let mut cycle = path.clone();
                cycle.push(address.clone());
                let err = DiscoveryError::CycleDetected {
                    address: address.clone(),
                    path: cycle,
                };
                return self.branch_failed(report, address, upstream, err);
            }

            if path.len() > self.max_depth {
                let err = DiscoveryError::DepthExceeded {
                    address: address.clone(),
                    depth: self.max_depth,
                };
                return self.branch_failed(report, address, upstream, err);
            }

            let clients = match self.discover(&address, upstream.as_deref()).await {
                Ok(clients) => clients,
                Err(e) => return self.branch_failed(report, address, upstream, e),
            };
            report.visited.push(address.clone());

            path.push(address.clone());
            for client in clients {
                self.visit(client, Some(address.clone()), path, report)
                    .await?;
            }
            path.pop();

            Ok(())
        })
    }

    fn branch_failed(
        &self,
        report: &mut WalkReport,
        address: String,
        upstream: Option<String>,
        err: DiscoveryError,
    ) -> Result<(), DiscoveryError> {
        match self.policy {
            FailurePolicy::Isolate => {
                warn!(
                    address = %address,
                    upstream = upstream.as_deref().unwrap_or(""),
                    error = %err,
                    "Skipping branch"
                );
                report.failures.push(BranchFailure {
                    address,
                    upstream,
                    error: err,
                });
                Ok(())
            }
            FailurePolicy::Abort => {
                error!(address = %address, error = %err, "Aborting topology walk");
                Err(err)
            }
        }
    }
}

/// Builder for constructing a Walker.
pub struct WalkerBuilder<S: TopologyStore> {
    prober: Arc<dyn Prober>,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    policy: FailurePolicy,
    max_depth: usize,
}

impl<S: TopologyStore> WalkerBuilder<S> {
    /// Create a new builder with the given prober and store.
    pub fn new(prober: impl Prober + 'static, store: S) -> Self {
        Self::with_shared_store(prober, Arc::new(store))
    }

    /// Create a builder that writes into a store owned elsewhere.
    pub fn with_shared_store(prober: impl Prober + 'static, store: Arc<S>) -> Self {
        Self {
            prober: Arc::new(prober),
            store,
            clock: Arc::new(SystemClock),
            policy: FailurePolicy::default(),
            max_depth: 64,
        }
    }

    /// Set the clock used to stamp records.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Set the failure policy.
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set how many hops below the root the walk may go.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Build the walker.
    pub fn build(self) -> Walker<S> {
        Walker {
            prober: self.prober,
            store: self.store,
            clock: self.clock,
            policy: self.policy,
            max_depth: self.max_depth,
        }
    }
}
