//! Process-backed [`CommandRunner`].

use async_trait::async_trait;
use tokio::process::Command;

use crate::contract::{CommandOutput, CommandRunner};

/// Runs commands as child processes and waits for them to exit.
#[derive(Debug, Default, Clone)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, args: &[String]) -> CommandOutput {
        let Some((program, rest)) = args.split_first() else {
            return CommandOutput::failure("empty command");
        };

        tracing::debug!(program = %program, args = ?rest, "Running external command");
        let output = Command::new(program)
            .args(rest)
            .kill_on_drop(true)
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => {
                CommandOutput::success(String::from_utf8_lossy(&out.stdout).trim())
            }
            Ok(out) => {
                tracing::debug!(
                    program = %program,
                    status = ?out.status,
                    "External command exited with non-zero code"
                );
                CommandOutput::failure(String::from_utf8_lossy(&out.stderr).trim())
            }
            Err(e) => {
                tracing::error!(error = ?e, program = %program, "Failed to launch process");
                CommandOutput::failure(format!("failed to launch {program}: {e}"))
            }
        }
    }
}
