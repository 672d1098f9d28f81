use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwarmError {
    /// The control plane answered with a non-success status.
    #[error("error {operation}: {reason}")]
    Adapter { operation: String, reason: String },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Please specify an action to perform (restart, stop, backup, restore)")]
    NoAction,

    #[error("Please specify only one action to perform (got: {})", .0.join(", "))]
    ConflictingActions(Vec<&'static str>),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no deployed service matches: {}", .0.join(", "))]
    UnmatchedServices(Vec<String>),

    #[error("invalid replica count '{0}'")]
    InvalidReplicas(String),

    #[error("{}:{line}: {reason}", path.display())]
    MalformedBackup {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("error restarting service {service}")]
    Restart {
        service: String,
        #[source]
        source: Box<SwarmError>,
    },

    #[error("error reading service spec: {0}")]
    Inspect(#[from] serde_json::Error),

    #[error("backup file {}: {source}", path.display())]
    BackupIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SwarmError {
    pub fn adapter(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Adapter {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Configuration errors are raised before any cluster call is made.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::NoAction | Self::ConflictingActions(_) | Self::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SwarmError>;
