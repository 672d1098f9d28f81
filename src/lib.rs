pub mod backup;
pub mod clienv;
pub mod cluster;
pub mod dispatch;
pub mod error;
pub mod lifecycle;
pub mod matcher;
pub mod user_config;

pub use backup::BackupStore;
pub use cluster::{ClusterAdapter, DockerCli, ReplicaCount, ServiceSnapshot};
pub use dispatch::{Action, Dispatcher, Invocation, Outcome};
pub use error::{Result, SwarmError};
pub use lifecycle::Lifecycle;
pub use matcher::{MatchOutcome, UnmatchedPolicy};
pub use user_config::{Overrides, Settings, UserConfig};
