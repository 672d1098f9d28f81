use crate::error::{Result, SwarmError};
use tokio::process::Command;
use tracing::debug;

/// Runs control-plane commands and captures their output
pub struct CommandExecutor {
    program: String,
}

impl CommandExecutor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    #[cfg(test)]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Runs `program args...` and returns its stdout.
    ///
    /// A non-zero exit becomes [`SwarmError::Adapter`] tagged with `operation`,
    /// carrying stderr (or stdout when stderr is empty).
    pub async fn run(&self, operation: &str, args: &[&str]) -> Result<String> {
        debug!("Running command: {} {:?}", self.program, args);

        let output = Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|source| SwarmError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        debug!(
            "Command finished with exit code: {:?}",
            output.status.code()
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = if stderr.trim().is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            let reason = if reason.is_empty() {
                format!("{} exited with {}", self.program, output.status)
            } else {
                reason
            };
            return Err(SwarmError::adapter(operation, reason));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new(crate::clienv::DEFAULT_DOCKER_BIN)
    }
}
