//! Scripted [`CommandRunner`] for unit tests.

use crate::traits::{CommandOutput, CommandRunner, CommandSpec, ProcessError};
use async_trait::async_trait;
use std::sync::Mutex;

type Responder = Box<dyn Fn(&CommandSpec) -> Result<CommandOutput, ProcessError> + Send + Sync>;

/// Records every command and answers with a test-supplied closure.
///
/// The closure may also perform side effects (e.g. write the JSON artifact a
/// real compiler would have produced).
pub(crate) struct ScriptedRunner {
    calls: Mutex<Vec<CommandSpec>>,
    respond: Responder,
}

impl ScriptedRunner {
    pub(crate) fn new<F>(respond: F) -> Self
    where
        F: Fn(&CommandSpec) -> Result<CommandOutput, ProcessError> + Send + Sync + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        }
    }

    /// Every command succeeds with empty output.
    pub(crate) fn succeeding() -> Self {
        Self::new(|_| Ok(exit(0)))
    }

    pub(crate) fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, ProcessError> {
        self.calls.lock().unwrap().push(command.clone());
        (self.respond)(command)
    }
}

pub(crate) fn exit(code: i32) -> CommandOutput {
    CommandOutput {
        code: Some(code),
        ..Default::default()
    }
}

pub(crate) fn stdout(body: &str) -> CommandOutput {
    CommandOutput {
        code: Some(0),
        stdout: body.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

pub(crate) fn not_found(program: &str) -> ProcessError {
    ProcessError::Spawn {
        program: program.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
    }
}
