use std::path::PathBuf;

const ENV_CONFIG_DIR: &str = "SWARMCTL_CONFIG_DIR";
const ENV_BACKUP_FILE: &str = "SWARMCTL_BACKUP_FILE";
const ENV_DOCKER_BIN: &str = "SWARMCTL_DOCKER_BIN";
const ENV_PARALLEL: &str = "SWARMCTL_PARALLEL";

const FALLBACK_CONFIG_DIR: &str = "~/.config";
const SWARMCTL_SUBDIR: &str = "swarmctl";

/// Backup file used when nothing else is configured (relative to the working directory)
pub const DEFAULT_BACKUP_FILE: &str = "swarm-service-backup.txt";
pub const DEFAULT_DOCKER_BIN: &str = "docker";

/// Non-empty value of an environment variable
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// swarmctl config directory ($SWARMCTL_CONFIG_DIR or ~/.config/swarmctl)
pub fn config_dir() -> PathBuf {
    let dir = env_opt(ENV_CONFIG_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from(FALLBACK_CONFIG_DIR))
                .join(SWARMCTL_SUBDIR)
        });
    tracing::trace!(dir = %dir.display(), "Resolved config directory");
    dir
}

/// Backup file override ($SWARMCTL_BACKUP_FILE)
pub fn backup_file() -> Option<PathBuf> {
    let path = env_opt(ENV_BACKUP_FILE).map(PathBuf::from);
    tracing::trace!(value = ?path, "SWARMCTL_BACKUP_FILE env var");
    path
}

/// Docker binary override ($SWARMCTL_DOCKER_BIN)
pub fn docker_bin() -> Option<String> {
    let val = env_opt(ENV_DOCKER_BIN);
    tracing::trace!(value = ?val, "SWARMCTL_DOCKER_BIN env var");
    val
}

/// Concurrency override ($SWARMCTL_PARALLEL); unparseable or zero values are ignored
pub fn parallel() -> Option<usize> {
    let val = env_opt(ENV_PARALLEL)
        .and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|n| *n > 0);
    tracing::trace!(value = ?val, "SWARMCTL_PARALLEL env var");
    val
}
