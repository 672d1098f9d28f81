//! Backup file of service scales.
//!
//! One service per line, `<name> <replicas>`, no header. The replica field is
//! written as the cluster reported it (e.g. `2/2`); restore uses its first
//! component.

use crate::cluster::{ClusterAdapter, ReplicaCount, ServiceSnapshot};
use crate::error::{Result, SwarmError};
use crate::lifecycle::Lifecycle;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct BackupStore {
    path: PathBuf,
}

impl BackupStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the scale of every deployed service, replacing any previous backup.
    ///
    /// Returns the number of services written.
    pub async fn backup(&self, cluster: &dyn ClusterAdapter) -> Result<usize> {
        let entries = cluster.list_scale_snapshot().await?;
        let (content, written) = render(&entries);

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|source| SwarmError::BackupIo {
                path: self.path.clone(),
                source,
            })?;

        info!(path = %self.path.display(), services = written, "Services backed up successfully");
        Ok(written)
    }

    /// Reads and validates the backup file without touching the cluster.
    pub async fn load(&self) -> Result<ServiceSnapshot> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SwarmError::BackupIo {
                path: self.path.clone(),
                source,
            })?;
        parse(&self.path, &content)
    }

    /// Scales every service in the backup back to its recorded count.
    ///
    /// The whole file is validated first; a malformed line aborts the restore
    /// before any service is scaled. Returns the number of services restored.
    pub async fn restore(&self, lifecycle: &Lifecycle) -> Result<usize> {
        let snapshot = self.load().await?;
        debug!(path = %self.path.display(), services = snapshot.len(), "Loaded backup");

        lifecycle.start(&snapshot).await?;

        info!(path = %self.path.display(), services = snapshot.len(), "Services restored successfully");
        Ok(snapshot.len())
    }
}

fn render(entries: &[(String, ReplicaCount)]) -> (String, usize) {
    let mut content = String::new();
    let mut written = 0;
    for (name, replicas) in entries {
        if name.is_empty() {
            continue;
        }
        content.push_str(name);
        content.push(' ');
        content.push_str(replicas.as_str());
        content.push('\n');
        written += 1;
    }
    (content, written)
}

/// Parses backup text. Blank lines are skipped; fields past the second are ignored.
pub fn parse(path: &Path, content: &str) -> Result<ServiceSnapshot> {
    let malformed = |line: usize, reason: String| SwarmError::MalformedBackup {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut snapshot = ServiceSnapshot::new();
    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let mut fields = line.split_whitespace();
        let Some(name) = fields.next() else {
            continue;
        };
        let replicas = fields
            .next()
            .map(ReplicaCount::new)
            .ok_or_else(|| malformed(line_no, format!("missing replica count for service {name}")))?;
        if replicas.scale().is_err() {
            return Err(malformed(
                line_no,
                format!("invalid replica count '{replicas}' for service {name}"),
            ));
        }
        snapshot.insert(name, replicas);
    }
    Ok(snapshot)
}
