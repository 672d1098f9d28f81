use super::{ClusterAdapter, CommandExecutor, ReplicaCount};
use crate::error::{Result, SwarmError};
use async_trait::async_trait;
use serde::Deserialize;

/// [`ClusterAdapter`] backed by the `docker service` CLI.
#[derive(Default)]
pub struct DockerCli {
    executor: CommandExecutor,
}

impl DockerCli {
    pub fn new(docker_bin: impl Into<String>) -> Self {
        Self {
            executor: CommandExecutor::new(docker_bin),
        }
    }
}

#[async_trait]
impl ClusterAdapter for DockerCli {
    async fn list_services(&self) -> Result<Vec<String>> {
        let out = self
            .executor
            .run(
                "getting running services",
                &["service", "ls", "--format", "{{.Name}}"],
            )
            .await?;
        Ok(parse_names(&out))
    }

    async fn get_scale(&self, service: &str) -> Result<ReplicaCount> {
        let out = self
            .executor
            .run("getting service scale", &["service", "inspect", service])
            .await?;
        parse_inspect(service, &out)
    }

    async fn list_scale_snapshot(&self) -> Result<Vec<(String, ReplicaCount)>> {
        let out = self
            .executor
            .run(
                "listing service replicas",
                &["service", "ls", "--format", "{{.Name}} {{.Replicas}}"],
            )
            .await?;
        parse_pairs(&out)
    }

    async fn set_scale(&self, service: &str, replicas: u64) -> Result<()> {
        let target = format!("{service}={replicas}");
        self.executor
            .run(
                &format!("scaling service {service}"),
                &["service", "scale", &target],
            )
            .await?;
        Ok(())
    }
}

fn parse_names(out: &str) -> Vec<String> {
    out.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_pairs(out: &str) -> Result<Vec<(String, ReplicaCount)>> {
    let mut pairs = Vec::new();
    for line in out.lines() {
        let mut fields = line.split_whitespace();
        let Some(name) = fields.next() else {
            continue;
        };
        // `{{.Replicas}}` may carry a suffix such as "(max 1 per node)"
        let replicas = fields.next().ok_or_else(|| {
            SwarmError::adapter(
                "listing service replicas",
                format!("no replica count for service {name}"),
            )
        })?;
        pairs.push((name.to_string(), ReplicaCount::new(replicas)));
    }
    Ok(pairs)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectedService {
    spec: ServiceSpec,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceSpec {
    mode: ServiceMode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceMode {
    replicated: Option<ReplicatedMode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ReplicatedMode {
    replicas: Option<u64>,
}

fn parse_inspect(service: &str, out: &str) -> Result<ReplicaCount> {
    let inspected: Vec<InspectedService> = serde_json::from_str(out)?;
    let spec = inspected.into_iter().next().ok_or_else(|| {
        SwarmError::adapter("getting service scale", format!("no such service: {service}"))
    })?;
    let replicated = spec.spec.mode.replicated.ok_or_else(|| {
        SwarmError::adapter(
            "getting service scale",
            format!("service {service} is not in replicated mode"),
        )
    })?;
    let replicas = replicated.replicas.ok_or_else(|| {
        SwarmError::adapter(
            "getting service scale",
            format!("service {service} has no replica count"),
        )
    })?;
    Ok(ReplicaCount::from(replicas))
}
