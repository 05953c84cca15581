//! HTTP fetches through the command-line transfer tool (`curl`).

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::TransferConfig;
use crate::harvest::download::DownloadTarget;
use crate::harvest::traits::FetchError;
use crate::traits::{CommandOutput, CommandRunner, CommandSpec, ProcessError};

#[derive(Clone)]
pub struct Transfer {
    runner: Arc<dyn CommandRunner>,
    program: String,
    workdir: PathBuf,
}

impl Transfer {
    pub fn new(runner: Arc<dyn CommandRunner>, config: &TransferConfig, workdir: PathBuf) -> Self {
        Self {
            runner,
            program: config.program.clone(),
            workdir,
        }
    }

    /// Fetches a page body. Any failure is fatal to the caller.
    pub async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let command = CommandSpec::new(&self.program).args(["-s", "-f", "-L", url]);
        let output = self.runner.run(&command).await?;

        if !output.success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                code: output.code,
                stderr: output.stderr_lossy(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Saves `target.url` as `target.file_name` in the working directory,
    /// overwriting any existing file. The exit status is left to the caller.
    pub async fn download(&self, target: &DownloadTarget) -> Result<CommandOutput, ProcessError> {
        let command = CommandSpec::new(&self.program)
            .args([target.url.as_str(), "-s", "-o", target.file_name.as_str()])
            .current_dir(&self.workdir);
        self.runner.run(&command).await
    }
}
