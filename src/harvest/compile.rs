//! Batch invocation of the external MIB compiler.

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::config::CompilerConfig;
use crate::harvest::traits::{CompileError, HarvestStage};
use crate::harvest::workdir::{file_name, files_with_extension};
use crate::traits::{CommandRunner, CommandSpec};

/// Per-file compilation results, in the order files were compiled.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CompileSummary {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

impl fmt::Display for CompileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_section(f, "Successfully Compiled MIBs:", &self.succeeded)?;
        writeln!(f)?;
        write_section(f, "Failed Compiling MIBs:", &self.failed)
    }
}

fn write_section(f: &mut fmt::Formatter<'_>, title: &str, files: &[String]) -> fmt::Result {
    writeln!(f, "{title}")?;
    writeln!(f, "-------------------------")?;
    if files.is_empty() {
        writeln!(f, "None")?;
    }
    for file in files {
        writeln!(f, "{file}")?;
    }
    Ok(())
}

/// Runs the compiler once per `*.txt` file in the working directory.
///
/// A compiler exit status other than zero marks that file failed and the batch
/// carries on. Only a compiler that cannot be launched aborts the stage.
pub struct CompilerInvoker {
    runner: Arc<dyn CommandRunner>,
    config: CompilerConfig,
    workdir: PathBuf,
}

impl CompilerInvoker {
    pub fn new(runner: Arc<dyn CommandRunner>, config: CompilerConfig, workdir: PathBuf) -> Self {
        Self {
            runner,
            config,
            workdir,
        }
    }

    /// `<program> --mib-source=<system>... --mib-source=<workdir>
    /// --generate-mib-texts --destination-format json <file>`
    pub fn command_for(&self, file: &str, workdir: &Path) -> CommandSpec {
        let local = workdir.to_string_lossy();
        let sources = self
            .config
            .mib_sources
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(local.as_ref()))
            .map(|source| format!("--mib-source={source}"));

        CommandSpec::new(&self.config.program)
            .args(sources)
            .args(["--generate-mib-texts", "--destination-format", "json", file])
            .current_dir(&self.workdir)
    }

    fn scan_error(&self, source: std::io::Error) -> CompileError {
        CompileError::Scan {
            path: self.workdir.clone(),
            source,
        }
    }
}

#[async_trait]
impl HarvestStage for CompilerInvoker {
    type Input = ();
    type Output = CompileSummary;
    type Error = CompileError;

    #[instrument(skip_all, fields(compiler = %self.config.program))]
    async fn execute(&self, _input: ()) -> Result<CompileSummary, CompileError> {
        let sources =
            files_with_extension(&self.workdir, "txt").map_err(|e| self.scan_error(e))?;
        let workdir = self.workdir.canonicalize().map_err(|e| self.scan_error(e))?;
        let mut summary = CompileSummary::default();

        for path in sources {
            let file = file_name(&path);
            info!("Running {} on MIB file {}", self.config.program, file);
            let command = self.command_for(&file, &workdir);

            let output = match self.config.timeout() {
                Some(limit) => match timeout(limit, self.runner.run(&command)).await {
                    Ok(result) => Some(result?),
                    Err(_) => {
                        warn!(timeout_secs = limit.as_secs(), "Compiler timed out on {}", file);
                        None
                    }
                },
                None => Some(self.runner.run(&command).await?),
            };

            match output {
                Some(output) if output.success() => summary.succeeded.push(file),
                Some(output) => {
                    debug!(code = ?output.code, stderr = %output.stderr_lossy(), "Compilation failed");
                    warn!("Failed to compile {}", file);
                    summary.failed.push(file);
                }
                None => summary.failed.push(file),
            }
        }

        info!(
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            "Compilation finished"
        );
        Ok(summary)
    }

    fn stage_name(&self) -> &'static str {
        "compiler"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{exit, not_found, ScriptedRunner};
    use crate::traits::CommandOutput;
    use std::time::Duration;
    use tempfile::TempDir;

    fn workdir_with(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in files {
            std::fs::write(dir.path().join(name), b"FOO-MIB DEFINITIONS ::= BEGIN END").unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn test_classifies_by_exit_status() {
        let dir = workdir_with(&["B-MIB.txt", "A-MIB.txt", "ignored.json"]);
        let runner = Arc::new(ScriptedRunner::new(|cmd| {
            let file = cmd.args.last().cloned().unwrap_or_default();
            Ok(exit(if file == "B-MIB.txt" { 1 } else { 0 }))
        }));
        let invoker =
            CompilerInvoker::new(runner.clone(), CompilerConfig::default(), dir.path().into());

        let summary = invoker.execute(()).await.unwrap();

        assert_eq!(summary.succeeded, vec!["A-MIB.txt"]);
        assert_eq!(summary.failed, vec!["B-MIB.txt"]);
        assert_eq!(runner.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_argument_template() {
        let dir = workdir_with(&["IF-MIB.txt"]);
        let runner = Arc::new(ScriptedRunner::succeeding());
        let invoker =
            CompilerInvoker::new(runner.clone(), CompilerConfig::default(), dir.path().into());

        invoker.execute(()).await.unwrap();

        let abs = dir.path().canonicalize().unwrap();
        let call = &runner.calls()[0];
        assert_eq!(call.program, "mibdump.py");
        assert_eq!(
            call.args,
            vec![
                "--mib-source=/usr/share/snmp".to_string(),
                format!("--mib-source={}", abs.display()),
                "--generate-mib-texts".to_string(),
                "--destination-format".to_string(),
                "json".to_string(),
                "IF-MIB.txt".to_string(),
            ]
        );
        assert_eq!(call.current_dir.as_deref(), Some(dir.path()));
    }

    #[tokio::test]
    async fn test_empty_workdir_runs_nothing() {
        let dir = workdir_with(&[]);
        let runner = Arc::new(ScriptedRunner::succeeding());
        let invoker =
            CompilerInvoker::new(runner.clone(), CompilerConfig::default(), dir.path().into());

        let summary = invoker.execute(()).await.unwrap();

        assert_eq!(summary, CompileSummary::default());
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_compiler_is_fatal() {
        let dir = workdir_with(&["IF-MIB.txt"]);
        let runner = Arc::new(ScriptedRunner::new(|_| Err(not_found("mibdump.py"))));
        let invoker = CompilerInvoker::new(runner, CompilerConfig::default(), dir.path().into());

        let err = invoker.execute(()).await.unwrap_err();
        assert!(matches!(err, CompileError::CompilerUnavailable(_)));
    }

    #[tokio::test]
    async fn test_timeout_marks_file_failed() {
        struct SlowRunner;

        #[async_trait]
        impl CommandRunner for SlowRunner {
            async fn run(
                &self,
                _command: &CommandSpec,
            ) -> Result<CommandOutput, crate::traits::ProcessError> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(exit(0))
            }
        }

        let dir = workdir_with(&["SLOW-MIB.txt"]);
        let config = CompilerConfig {
            timeout_secs: Some(0),
            ..CompilerConfig::default()
        };
        let invoker = CompilerInvoker::new(Arc::new(SlowRunner), config, dir.path().into());

        let summary = invoker.execute(()).await.unwrap();
        assert_eq!(summary.failed, vec!["SLOW-MIB.txt"]);
    }

    #[test]
    fn test_summary_display() {
        let summary = CompileSummary {
            succeeded: vec!["IF-MIB.txt".into(), "IP-MIB.txt".into()],
            failed: vec![],
        };
        assert_eq!(
            summary.to_string(),
            "Successfully Compiled MIBs:\n\
             -------------------------\n\
             IF-MIB.txt\n\
             IP-MIB.txt\n\
             \n\
             Failed Compiling MIBs:\n\
             -------------------------\n\
             None\n"
        );
    }
}
