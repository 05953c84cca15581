//! End-to-end MIB pipeline.
//!
//! [`MibPipeline`] runs the stages strictly one after another:
//! 1. **Vendor links**: scrape the vendor page and download every matching file
//! 2. **Standard MIBs** (optional): download the configured IETF/IEEE/IANA sets
//! 3. **Compile**: run the MIB compiler on every `*.txt` in the working directory
//! 4. **Report**: flatten every `*.json` in the working directory into one CSV
//!
//! Stages hand nothing to each other except files in the working directory.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{HarvestConfig, MibSet, VendorSource};
use crate::harvest::compile::{CompileSummary, CompilerInvoker};
use crate::harvest::download::{BulkDownloader, DownloadReport, DownloadTarget};
use crate::harvest::links::LinkHarvester;
use crate::harvest::report::{ReportGenerator, ReportRequest, ReportStats};
use crate::harvest::traits::{CompileError, FetchError, HarvestStage, ReportError};
use crate::harvest::transfer::Transfer;
use crate::model::ReportMode;
use crate::traits::CommandRunner;

// ============================================================================
// Pipeline Types
// ============================================================================

/// Operator choices for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Destination CSV
    pub output: PathBuf,
    pub mode: ReportMode,
    /// Also download the standard MIB sets
    pub include_standard_mibs: bool,
    /// Skip every download; compile and report what is already on disk
    pub offline: bool,
}

/// Everything a run produced.
#[derive(Debug, Default)]
pub struct PipelineOutcome {
    pub vendor_links: usize,
    pub downloads: DownloadReport,
    pub compile: CompileSummary,
    pub report: ReportStats,
    pub stats: PipelineStats,
}

/// Wall-clock time per phase.
#[derive(Debug, Default, Clone)]
pub struct PipelineStats {
    pub total_duration_ms: u64,
    pub download_duration_ms: u64,
    pub compile_duration_ms: u64,
    pub report_duration_ms: u64,
}

// ============================================================================
// Pipeline Errors
// ============================================================================

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Compilation failed: {0}")]
    Compile(#[from] CompileError),

    #[error("Report generation failed: {0}")]
    Report(#[from] ReportError),
}

// ============================================================================
// Pipeline Executor
// ============================================================================

pub struct MibPipeline {
    harvester: LinkHarvester,
    downloader: BulkDownloader,
    compiler: CompilerInvoker,
    reporter: ReportGenerator,
    mib_sets: Vec<MibSet>,
}

impl MibPipeline {
    /// Builds every stage against `workdir`, running external commands
    /// through `runner`.
    pub fn new(config: HarvestConfig, workdir: PathBuf, runner: Arc<dyn CommandRunner>) -> Self {
        let transfer = Transfer::new(runner.clone(), &config.transfer, workdir.clone());

        Self {
            harvester: LinkHarvester::new(transfer.clone(), config.vendor),
            downloader: BulkDownloader::new(transfer),
            compiler: CompilerInvoker::new(runner, config.compiler, workdir.clone()),
            reporter: ReportGenerator::new(workdir),
            mib_sets: config.mib_sets,
        }
    }

    /// Executes the complete pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if:
    /// - The vendor page cannot be fetched, or the transfer tool is missing
    /// - The MIB compiler cannot be launched
    /// - Any JSON artifact or selected record is malformed
    ///
    /// Individual failed downloads and failed compilations are not errors;
    /// they are listed in the returned [`PipelineOutcome`].
    pub async fn execute(&self, options: RunOptions) -> Result<PipelineOutcome, PipelineError> {
        let start = Instant::now();
        let mut outcome = PipelineOutcome::default();

        // ====================================================================
        // Stage 1 + 2: Downloads
        // ====================================================================

        let download_start = Instant::now();
        if options.offline {
            info!("Offline mode, using MIB files already in the working directory");
        } else {
            info!("Retrieving vendor proprietary MIBs");
            let links = run_stage(&self.harvester, ()).await?;
            outcome.vendor_links = links.len();

            let targets = vendor_targets(self.harvester.source(), &links);
            outcome.downloads = run_stage(&self.downloader, targets).await?;

            if options.include_standard_mibs {
                for set in &self.mib_sets {
                    info!("Downloading {} MIB files...", set.label);
                    let report =
                        run_stage(&self.downloader, DownloadTarget::for_mib_set(set)).await?;
                    outcome.downloads.merge(report);
                }
            }

            if !outcome.downloads.failed.is_empty() {
                warn!(
                    failed = outcome.downloads.failed.len(),
                    total = outcome.downloads.total(),
                    "Some downloads failed"
                );
            }
        }
        outcome.stats.download_duration_ms = download_start.elapsed().as_millis() as u64;

        // ====================================================================
        // Stage 3: Compile
        // ====================================================================

        let compile_start = Instant::now();
        outcome.compile = run_stage(&self.compiler, ()).await?;
        outcome.stats.compile_duration_ms = compile_start.elapsed().as_millis() as u64;

        // Operator summary; must precede stage 4
        println!();
        println!("{}", outcome.compile);

        // ====================================================================
        // Stage 4: Report
        // ====================================================================

        let report_start = Instant::now();
        let request = ReportRequest {
            output: options.output,
            mode: options.mode,
        };
        outcome.report = run_stage(&self.reporter, request).await?;
        outcome.stats.report_duration_ms = report_start.elapsed().as_millis() as u64;

        outcome.stats.total_duration_ms = start.elapsed().as_millis() as u64;
        info!(
            duration_ms = outcome.stats.total_duration_ms,
            download_ms = outcome.stats.download_duration_ms,
            compile_ms = outcome.stats.compile_duration_ms,
            report_ms = outcome.stats.report_duration_ms,
            rows = outcome.report.rows,
            "Pipeline complete"
        );

        Ok(outcome)
    }
}

async fn run_stage<S: HarvestStage>(stage: &S, input: S::Input) -> Result<S::Output, S::Error> {
    debug!(stage = stage.stage_name(), "Starting stage");
    let result = stage.execute(input).await;
    debug!(stage = stage.stage_name(), ok = result.is_ok(), "Stage finished");
    result
}

fn vendor_targets(source: &VendorSource, links: &[String]) -> Vec<DownloadTarget> {
    links
        .iter()
        .filter_map(|href| {
            let target = DownloadTarget::for_link(&source.download_prefix, href);
            if target.is_none() {
                warn!(href = %href, "Link has no file name, skipped");
            }
            target
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
