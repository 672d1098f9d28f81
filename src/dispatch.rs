//! Turns a parsed invocation into exactly one cluster action.

use crate::backup::BackupStore;
use crate::cluster::ClusterAdapter;
use crate::error::{Result, SwarmError};
use crate::lifecycle::Lifecycle;
use crate::matcher::{self, UnmatchedPolicy};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Restart,
    Stop,
    Backup,
    Restore,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Restart => "restart",
            Self::Stop => "stop",
            Self::Backup => "backup",
            Self::Restore => "restore",
        }
    }
}

/// Flags as given by the user, before validation.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub services: Vec<String>,
    pub restart: bool,
    pub stop: bool,
    pub backup: bool,
    pub restore: bool,
    /// Operate on every deployed service instead of `services`
    pub all: bool,
    pub unmatched: UnmatchedPolicy,
}

impl Invocation {
    /// The single selected action; none or several is a configuration error.
    pub fn action(&self) -> Result<Action> {
        let selected: Vec<Action> = [
            (self.restart, Action::Restart),
            (self.stop, Action::Stop),
            (self.backup, Action::Backup),
            (self.restore, Action::Restore),
        ]
        .into_iter()
        .filter_map(|(set, action)| set.then_some(action))
        .collect();

        match selected.as_slice() {
            [] => Err(SwarmError::NoAction),
            [action] => Ok(*action),
            many => Err(SwarmError::ConflictingActions(
                many.iter().map(Action::as_str).collect(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Restarted(Vec<String>),
    Stopped(Vec<String>),
    BackedUp { services: usize, path: PathBuf },
    Restored { services: usize, path: PathBuf },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Restarted(s) if s.is_empty() => write!(f, "No matching services to restart"),
            Self::Stopped(s) if s.is_empty() => write!(f, "No matching services to stop"),
            Self::Restarted(s) => write!(f, "Restarted {}", s.join(", ")),
            Self::Stopped(s) => write!(f, "Stopped {}", s.join(", ")),
            Self::BackedUp { services, path } => {
                write!(f, "Backed up {} services to {}", services, path.display())
            }
            Self::Restored { services, path } => {
                write!(f, "Restored {} services from {}", services, path.display())
            }
        }
    }
}

pub struct Dispatcher {
    lifecycle: Lifecycle,
    store: BackupStore,
}

impl Dispatcher {
    pub fn new(lifecycle: Lifecycle, store: BackupStore) -> Self {
        Self { lifecycle, store }
    }

    /// Validates the action selection, then runs it.
    ///
    /// No cluster call is made when the selection is invalid.
    pub async fn dispatch(&self, invocation: &Invocation) -> Result<Outcome> {
        let action = invocation.action()?;
        debug!(action = action.as_str(), "Dispatching");

        match action {
            Action::Restart => {
                let services = self.select(invocation).await?;
                self.lifecycle.restart(&services).await?;
                Ok(Outcome::Restarted(services))
            }
            Action::Stop => {
                let services = self.select(invocation).await?;
                self.lifecycle.stop(&services).await?;
                Ok(Outcome::Stopped(services))
            }
            Action::Backup => {
                let services = self.store.backup(self.cluster()).await?;
                Ok(Outcome::BackedUp {
                    services,
                    path: self.store.path().to_path_buf(),
                })
            }
            Action::Restore => {
                let services = self.store.restore(&self.lifecycle).await?;
                Ok(Outcome::Restored {
                    services,
                    path: self.store.path().to_path_buf(),
                })
            }
        }
    }

    fn cluster(&self) -> &dyn ClusterAdapter {
        self.lifecycle.cluster().as_ref()
    }

    async fn select(&self, invocation: &Invocation) -> Result<Vec<String>> {
        if invocation.all {
            let services = self.cluster().list_services().await?;
            info!(count = services.len(), "Operating on all deployed services");
            return Ok(services);
        }

        let outcome =
            matcher::filter_services(self.cluster(), &invocation.services, invocation.unmatched)
                .await?;
        info!(services = ?outcome.matched, "Filtered services");
        Ok(outcome.matched)
    }
}
