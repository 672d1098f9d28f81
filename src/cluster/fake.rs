use super::{ClusterAdapter, ReplicaCount};
use crate::error::{Result, SwarmError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    ListServices,
    GetScale(String),
    ListScaleSnapshot,
    SetScale(String, u64),
}

/// In-memory cluster that records every call and fails on demand.
pub(crate) struct FakeCluster {
    services: Mutex<Vec<(String, u64)>>,
    calls: Mutex<Vec<Call>>,
    failing: Vec<Call>,
    yielding: bool,
    scale_reads: AtomicUsize,
}

impl FakeCluster {
    pub(crate) fn new(services: &[(&str, u64)]) -> Self {
        Self {
            services: Mutex::new(
                services
                    .iter()
                    .map(|(name, replicas)| (name.to_string(), *replicas))
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
            failing: Vec::new(),
            yielding: false,
            scale_reads: AtomicUsize::new(0),
        }
    }

    /// Makes the given call return an adapter error.
    pub(crate) fn failing(mut self, call: Call) -> Self {
        self.failing.push(call);
        self
    }

    /// Yields to the scheduler inside every scale call; each later scale read
    /// waits longer than the one before it.
    pub(crate) fn yielding(mut self) -> Self {
        self.yielding = true;
        self
    }

    async fn pause(&self, rounds: usize) {
        if self.yielding {
            for _ in 0..rounds {
                tokio::task::yield_now().await;
            }
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::SetScale(..)))
            .collect()
    }

    pub(crate) fn scale_of(&self, name: &str) -> Option<u64> {
        self.services
            .lock()
            .unwrap()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| *r)
    }

    fn record(&self, call: Call) -> Result<()> {
        self.calls.lock().unwrap().push(call.clone());
        if self.failing.contains(&call) {
            return Err(SwarmError::adapter(format!("{call:?}"), "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl ClusterAdapter for FakeCluster {
    async fn list_services(&self) -> Result<Vec<String>> {
        self.record(Call::ListServices)?;
        Ok(self
            .services
            .lock()
            .unwrap()
            .iter()
            .map(|(n, _)| n.clone())
            .collect())
    }

    async fn get_scale(&self, service: &str) -> Result<ReplicaCount> {
        let nth = self.scale_reads.fetch_add(1, Ordering::SeqCst);
        self.pause(1 + nth * 3).await;
        self.record(Call::GetScale(service.to_string()))?;
        self.scale_of(service)
            .map(ReplicaCount::from)
            .ok_or_else(|| SwarmError::adapter("getting service scale", "no such service"))
    }

    async fn list_scale_snapshot(&self) -> Result<Vec<(String, ReplicaCount)>> {
        self.record(Call::ListScaleSnapshot)?;
        Ok(self
            .services
            .lock()
            .unwrap()
            .iter()
            .map(|(n, r)| (n.clone(), ReplicaCount::new(format!("{r}/{r}"))))
            .collect())
    }

    async fn set_scale(&self, service: &str, replicas: u64) -> Result<()> {
        self.pause(1).await;
        self.record(Call::SetScale(service.to_string(), replicas))?;
        let mut services = self.services.lock().unwrap();
        match services.iter_mut().find(|(n, _)| n == service) {
            Some(entry) => entry.1 = replicas,
            None => services.push((service.to_string(), replicas)),
        }
        Ok(())
    }
}
