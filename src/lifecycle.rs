//! Stop, start and restart services while keeping their replica counts.
//!
//! Each operation walks its services with at most `parallelism` in flight
//! (one by default, i.e. strictly in input order). The first failure stops
//! the walk: services not yet reached are left alone and nothing already done
//! is rolled back.

use crate::cluster::{ClusterAdapter, ReplicaCount, ServiceSnapshot};
use crate::error::{Result, SwarmError};
use futures::stream::{self, TryStreamExt};
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, info};

pub struct Lifecycle {
    cluster: Arc<dyn ClusterAdapter>,
    parallelism: NonZeroUsize,
}

impl Lifecycle {
    pub fn new(cluster: Arc<dyn ClusterAdapter>) -> Self {
        Self {
            cluster,
            parallelism: NonZeroUsize::MIN,
        }
    }

    /// Number of services worked on at once.
    pub fn with_parallelism(mut self, parallelism: NonZeroUsize) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn cluster(&self) -> &Arc<dyn ClusterAdapter> {
        &self.cluster
    }

    /// Scales every service to zero.
    pub async fn stop(&self, services: &[String]) -> Result<()> {
        if self.parallelism.get() == 1 {
            return self
                .for_each(services, |service| self.stop_one(service))
                .await;
        }
        self.for_each(group_by_name(services), |(service, _)| self.stop_one(service))
            .await
    }

    /// Scales every service in the snapshot to its recorded count.
    pub async fn start(&self, snapshot: &ServiceSnapshot) -> Result<()> {
        self.for_each(snapshot.iter(), |(service, replicas)| {
            self.start_one(service, replicas)
        })
        .await
    }

    /// Captures each service's scale, stops it, then starts it at the captured scale.
    ///
    /// A name listed more than once is restarted that many times, never
    /// concurrently with itself.
    pub async fn restart(&self, services: &[String]) -> Result<()> {
        if self.parallelism.get() == 1 {
            return self
                .for_each(services, |service| self.restart_one(service))
                .await;
        }
        self.for_each(group_by_name(services), |(service, times)| async move {
            for _ in 0..times {
                self.restart_one(service).await?;
            }
            Ok(())
        })
        .await
    }

    async fn stop_one(&self, service: &str) -> Result<()> {
        self.cluster.set_scale(service, 0).await?;
        info!("Service {} stopped successfully", service);
        Ok(())
    }

    async fn start_one(&self, service: &str, replicas: &ReplicaCount) -> Result<()> {
        let scale = replicas.scale()?;
        self.cluster.set_scale(service, scale).await?;
        info!("Service {} started successfully ({} replicas)", service, scale);
        Ok(())
    }

    async fn restart_one(&self, service: &str) -> Result<()> {
        let steps = async {
            let captured = self.cluster.get_scale(service).await?;
            // An unusable count must fail before the service is touched
            captured.scale()?;
            debug!(service = %service, replicas = %captured, "Captured scale");

            self.stop_one(service).await?;
            self.start_one(service, &captured).await
        };

        steps.await.map_err(|e| SwarmError::Restart {
            service: service.to_string(),
            source: Box::new(e),
        })?;
        info!("Service {} restarted successfully", service);
        Ok(())
    }

    async fn for_each<I, F, Fut>(&self, items: I, f: F) -> Result<()>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        stream::iter(items.into_iter().map(Ok::<_, SwarmError>))
            .try_for_each_concurrent(self.parallelism.get(), f)
            .await
    }
}

/// Distinct names in first-occurrence order, with how often each was listed.
fn group_by_name(services: &[String]) -> Vec<(&str, usize)> {
    let mut groups: Vec<(&str, usize)> = Vec::new();
    for service in services {
        match groups.iter_mut().find(|(name, _)| *name == service.as_str()) {
            Some((_, times)) => *times += 1,
            None => groups.push((service.as_str(), 1)),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::fake::{Call, FakeCluster};

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn lifecycle(cluster: &Arc<FakeCluster>) -> Lifecycle {
        Lifecycle::new(cluster.clone())
    }

    #[tokio::test]
    async fn stop_scales_to_zero_in_order() {
        let cluster = Arc::new(FakeCluster::new(&[("api", 2), ("worker", 3)]));
        lifecycle(&cluster)
            .stop(&names(&["worker", "api"]))
            .await
            .unwrap();

        assert_eq!(
            cluster.calls(),
            vec![
                Call::SetScale("worker".into(), 0),
                Call::SetScale("api".into(), 0),
            ]
        );
    }

    #[tokio::test]
    async fn stop_aborts_on_first_failure() {
        let cluster = Arc::new(
            FakeCluster::new(&[("a", 1), ("b", 1), ("c", 1)])
                .failing(Call::SetScale("b".into(), 0)),
        );
        let result = lifecycle(&cluster).stop(&names(&["a", "b", "c"])).await;

        assert!(result.is_err());
        assert_eq!(cluster.scale_of("a"), Some(0));
        assert_eq!(cluster.scale_of("c"), Some(1));
        assert!(!cluster.calls().contains(&Call::SetScale("c".into(), 0)));
    }

    #[tokio::test]
    async fn start_uses_first_component_of_compound_count() {
        let cluster = Arc::new(FakeCluster::new(&[("api", 0)]));
        let snapshot: ServiceSnapshot = [("api", ReplicaCount::new("3/3"))].into_iter().collect();

        lifecycle(&cluster).start(&snapshot).await.unwrap();

        assert_eq!(cluster.calls(), vec![Call::SetScale("api".into(), 3)]);
    }

    #[tokio::test]
    async fn start_rejects_invalid_count_without_scaling() {
        let cluster = Arc::new(FakeCluster::new(&[("api", 0)]));
        let snapshot: ServiceSnapshot = [("api", ReplicaCount::new("n/a"))].into_iter().collect();

        let err = lifecycle(&cluster).start(&snapshot).await.unwrap_err();

        assert!(matches!(err, SwarmError::InvalidReplicas(_)));
        assert!(cluster.calls().is_empty());
    }

    #[tokio::test]
    async fn restart_reads_stops_then_starts() {
        let cluster = Arc::new(FakeCluster::new(&[("api", 4)]));
        lifecycle(&cluster).restart(&names(&["api"])).await.unwrap();

        assert_eq!(
            cluster.calls(),
            vec![
                Call::GetScale("api".into()),
                Call::SetScale("api".into(), 0),
                Call::SetScale("api".into(), 4),
            ]
        );
        assert_eq!(cluster.scale_of("api"), Some(4));
    }

    #[tokio::test]
    async fn restart_leaves_service_untouched_when_capture_fails() {
        let cluster = Arc::new(
            FakeCluster::new(&[("api", 2), ("worker", 1)]).failing(Call::GetScale("api".into())),
        );
        let err = lifecycle(&cluster)
            .restart(&names(&["api", "worker"]))
            .await
            .unwrap_err();

        assert!(matches!(err, SwarmError::Restart { ref service, .. } if service == "api"));
        assert!(cluster.mutations().is_empty());
        assert_eq!(cluster.scale_of("api"), Some(2));
    }

    #[tokio::test]
    async fn restart_stops_processing_after_failed_start() {
        let cluster = Arc::new(
            FakeCluster::new(&[("api", 2), ("worker", 1)])
                .failing(Call::SetScale("api".into(), 2)),
        );
        let result = lifecycle(&cluster).restart(&names(&["api", "worker"])).await;

        assert!(result.is_err());
        assert_eq!(cluster.scale_of("api"), Some(0));
        assert!(!cluster.calls().contains(&Call::GetScale("worker".into())));
    }

    #[tokio::test]
    async fn parallel_restart_keeps_per_service_order() {
        let cluster = Arc::new(FakeCluster::new(&[("a", 1), ("b", 2), ("c", 3)]));
        Lifecycle::new(cluster.clone())
            .with_parallelism(NonZeroUsize::new(3).unwrap())
            .restart(&names(&["a", "b", "c"]))
            .await
            .unwrap();

        let calls = cluster.calls();
        for (service, scale) in [("a", 1), ("b", 2), ("c", 3)] {
            let per_service: Vec<&Call> = calls
                .iter()
                .filter(|c| match c {
                    Call::GetScale(n) | Call::SetScale(n, _) => n == service,
                    _ => false,
                })
                .collect();
            assert_eq!(
                per_service,
                vec![
                    &Call::GetScale(service.into()),
                    &Call::SetScale(service.into(), 0),
                    &Call::SetScale(service.into(), scale),
                ]
            );
            assert_eq!(cluster.scale_of(service), Some(scale));
        }
    }

    #[test]
    fn grouping_keeps_first_occurrence_order() {
        let services = names(&["b", "a", "b", "c", "a", "b"]);
        assert_eq!(group_by_name(&services), vec![("b", 3), ("a", 2), ("c", 1)]);
    }

    #[tokio::test]
    async fn parallel_restart_of_repeated_name_keeps_its_scale() {
        let cluster = Arc::new(FakeCluster::new(&[("api", 3)]).yielding());
        Lifecycle::new(cluster.clone())
            .with_parallelism(NonZeroUsize::new(2).unwrap())
            .restart(&names(&["api", "api"]))
            .await
            .unwrap();

        assert_eq!(cluster.scale_of("api"), Some(3));
        assert_eq!(
            cluster.calls(),
            vec![
                Call::GetScale("api".into()),
                Call::SetScale("api".into(), 0),
                Call::SetScale("api".into(), 3),
                Call::GetScale("api".into()),
                Call::SetScale("api".into(), 0),
                Call::SetScale("api".into(), 3),
            ]
        );
    }

    #[tokio::test]
    async fn restart_stops_processing_after_failed_stop() {
        let cluster = Arc::new(
            FakeCluster::new(&[("api", 2), ("worker", 1)])
                .failing(Call::SetScale("api".into(), 0)),
        );
        let err = lifecycle(&cluster)
            .restart(&names(&["api", "worker"]))
            .await
            .unwrap_err();

        assert!(matches!(err, SwarmError::Restart { ref service, .. } if service == "api"));
        assert_eq!(
            cluster.calls(),
            vec![
                Call::GetScale("api".into()),
                Call::SetScale("api".into(), 0),
            ]
        );
        assert_eq!(cluster.scale_of("api"), Some(2));
        assert_eq!(cluster.scale_of("worker"), Some(1));
    }

    #[tokio::test]
    async fn parallel_stop_returns_first_error_and_starts_nothing_new() {
        let cluster = Arc::new(
            FakeCluster::new(&[("a", 1), ("b", 1), ("c", 1), ("d", 1)])
                .failing(Call::SetScale("b".into(), 0)),
        );
        let err = Lifecycle::new(cluster.clone())
            .with_parallelism(NonZeroUsize::new(2).unwrap())
            .stop(&names(&["a", "b", "c", "d"]))
            .await
            .unwrap_err();

        assert!(matches!(err, SwarmError::Adapter { ref reason, .. } if reason == "injected failure"));
        assert!(!cluster.calls().contains(&Call::SetScale("d".into(), 0)));
        assert_eq!(cluster.scale_of("d"), Some(1));
    }
}
