use crate::clienv;
use crate::error::{Result, SwarmError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct UserConfig {
    /// Where backups are written and restored from
    pub backup_file: Option<PathBuf>,
    /// Docker CLI to invoke (e.g. "docker", "/usr/local/bin/docker")
    pub docker_bin: Option<String>,
    /// How many services to operate on at once
    pub parallel: Option<usize>,
}

impl UserConfig {
    /// $SWARMCTL_CONFIG_DIR/config.toml or ~/.config/swarmctl/config.toml
    pub fn config_path() -> PathBuf {
        clienv::config_dir().join("config.toml")
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::trace!(path = %path.display(), "Loading user config");

        if !path.exists() {
            tracing::trace!("Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            SwarmError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            SwarmError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;

        if config.parallel == Some(0) {
            return Err(SwarmError::Config(format!(
                "{}: parallel must be at least 1",
                path.display()
            )));
        }

        tracing::trace!(backup_file = ?config.backup_file, docker_bin = ?config.docker_bin, parallel = ?config.parallel, "User config loaded");
        Ok(config)
    }
}

/// Effective settings after layering flag > env > config file > default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backup_file: PathBuf,
    pub docker_bin: String,
    pub parallel: NonZeroUsize,
}

/// Values given on the command line; `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub backup_file: Option<PathBuf>,
    pub parallel: Option<NonZeroUsize>,
}

impl Settings {
    pub fn resolve(flags: Overrides) -> Result<Self> {
        let config = UserConfig::load()?;
        let env = Overrides {
            backup_file: clienv::backup_file(),
            parallel: clienv::parallel().and_then(NonZeroUsize::new),
        };
        Ok(Self::layer(flags, env, clienv::docker_bin(), config))
    }

    fn layer(
        flags: Overrides,
        env: Overrides,
        env_docker: Option<String>,
        config: UserConfig,
    ) -> Self {
        let backup_file = flags
            .backup_file
            .or(env.backup_file)
            .or(config.backup_file)
            .unwrap_or_else(|| PathBuf::from(clienv::DEFAULT_BACKUP_FILE));
        let parallel = flags
            .parallel
            .or(env.parallel)
            .or(config.parallel.and_then(NonZeroUsize::new))
            .unwrap_or(NonZeroUsize::MIN);
        let docker_bin = env_docker
            .or(config.docker_bin)
            .unwrap_or_else(|| clienv::DEFAULT_DOCKER_BIN.to_string());

        let settings = Self {
            backup_file,
            docker_bin,
            parallel,
        };
        tracing::trace!(?settings, "Resolved settings");
        settings
    }
}
