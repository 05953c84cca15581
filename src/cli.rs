//! Command line interface.

use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, HarvestConfig};
use crate::executor::ProcessExecutor;
use crate::harvest::{MibPipeline, PipelineError, PipelineOutcome, RunOptions};
use crate::model::ReportMode;

/// Fetch vendor and standard MIBs, compile them to JSON and write a CSV of
/// OIDs and descriptions.
#[derive(Parser, Debug)]
#[command(name = "mib-harvester", version, disable_version_flag = true)]
pub struct Cli {
    /// Output file name (CSV)
    #[arg(short = 'o', long = "outputfile", value_name = "PATH")]
    pub outputfile: PathBuf,

    /// Generate a trap (notification) report only
    #[arg(short = 't', long = "trapsonly")]
    pub trapsonly: bool,

    /// Also download the IETF, IEEE and IANA MIBs
    #[arg(short = 'a', long = "allmibs")]
    pub allmibs: bool,

    /// Working directory holding *.txt sources and *.json artifacts
    #[arg(short = 'C', long, value_name = "DIR", default_value = ".")]
    pub workdir: PathBuf,

    /// JSON file overriding the built-in sources and tool settings
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Skip downloads; compile and report only what is already on disk
    #[arg(long)]
    pub offline: bool,

    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl Cli {
    pub fn report_mode(&self) -> ReportMode {
        if self.trapsonly {
            ReportMode::TrapsOnly
        } else {
            ReportMode::AllRecords
        }
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            output: self.outputfile.clone(),
            mode: self.report_mode(),
            include_standard_mibs: self.allmibs,
            offline: self.offline,
        }
    }

    pub fn load_config(&self) -> Result<HarvestConfig, ConfigError> {
        match &self.config {
            Some(path) => {
                info!(path = %path.display(), "Loading configuration");
                HarvestConfig::from_file(path)
            }
            None => Ok(HarvestConfig::default()),
        }
    }
}

/// Runs the whole pipeline with real external processes.
pub async fn run(cli: &Cli) -> Result<PipelineOutcome, CliError> {
    let config = cli.load_config()?;
    let pipeline = MibPipeline::new(
        config,
        cli.workdir.clone(),
        Arc::new(ProcessExecutor::new()),
    );
    Ok(pipeline.execute(cli.run_options()).await?)
}
