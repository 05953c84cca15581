use crate::traits::{CommandOutput, CommandRunner, CommandSpec, ProcessError};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Runs commands as real child processes.
///
/// The child is killed if the returned future is dropped, so callers can bound
/// a run with `tokio::time::timeout`.
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessExecutor {
    #[instrument(skip(self, command), fields(program = %command.program))]
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, ProcessError> {
        debug!(command = %command.display(), "Spawning");

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &command.current_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().await.map_err(|source| ProcessError::Spawn {
            program: command.program.clone(),
            source,
        })?;

        debug!(code = ?output.status.code(), "Finished");

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
