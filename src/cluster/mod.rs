//! Cluster control-plane access.
//!
//! Everything swarmctl does to a cluster goes through [`ClusterAdapter`]:
//! three read-only queries and one mutation. The shipped implementation,
//! [`DockerCli`], shells out to the Docker CLI; tests use an in-memory fake.

pub mod docker;
pub mod executor;

#[cfg(test)]
pub(crate) mod fake;

pub use docker::DockerCli;
pub use executor::CommandExecutor;

use crate::error::{Result, SwarmError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;

/// Capability interface over a Swarm-style control plane.
///
/// Calls are not retried and no call verifies that a mutation converged.
#[async_trait]
pub trait ClusterAdapter: Send + Sync {
    /// Names of all deployed services, in the order the control plane lists them.
    async fn list_services(&self) -> Result<Vec<String>>;

    /// Configured replica count of a single service.
    async fn get_scale(&self, service: &str) -> Result<ReplicaCount>;

    /// `(name, replicas)` for every deployed service in one call.
    async fn list_scale_snapshot(&self) -> Result<Vec<(String, ReplicaCount)>>;

    /// Sets the desired replica count of a service.
    async fn set_scale(&self, service: &str, replicas: u64) -> Result<()>;
}

/// Replica count as reported by the cluster.
///
/// Live listings report `running/desired` (e.g. `3/3`); only the first
/// component is used when scaling. The raw text is kept so backups store
/// exactly what the cluster reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaCount(String);

impl ReplicaCount {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Scale to apply: the first `/`-separated component as an integer.
    pub fn scale(&self) -> Result<u64> {
        let first = self.0.split('/').next().unwrap_or_default().trim();
        if first.is_empty() || !first.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SwarmError::InvalidReplicas(self.0.clone()));
        }
        first
            .parse()
            .map_err(|_| SwarmError::InvalidReplicas(self.0.clone()))
    }
}

impl From<u64> for ReplicaCount {
    fn from(replicas: u64) -> Self {
        Self(replicas.to_string())
    }
}

impl fmt::Display for ReplicaCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Desired scale of a set of services at a point in time.
///
/// Keys are unique; inserting an existing name replaces its count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceSnapshot {
    services: BTreeMap<String, ReplicaCount>,
}

impl ServiceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, replicas: ReplicaCount) {
        self.services.insert(name.into(), replicas);
    }

    pub fn get(&self, name: &str) -> Option<&ReplicaCount> {
        self.services.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ReplicaCount)> {
        self.services.iter()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, ReplicaCount)> for ServiceSnapshot {
    fn from_iter<T: IntoIterator<Item = (N, ReplicaCount)>>(iter: T) -> Self {
        let mut snapshot = Self::new();
        for (name, replicas) in iter {
            snapshot.insert(name, replicas);
        }
        snapshot
    }
}
