//! Harvest module - the MIB fetch, compile and report pipeline.
//!
//! This module provides:
//! - **Traits**: [`HarvestStage`] implemented by every stage, plus per-stage errors
//! - **Stages**: [`LinkHarvester`], [`BulkDownloader`], [`CompilerInvoker`], [`ReportGenerator`]
//! - **Pipeline**: sequential executor via [`pipeline::MibPipeline`]

pub mod compile;
pub mod download;
pub mod links;
pub mod pipeline;
pub mod report;
pub mod traits;
pub mod transfer;
pub mod workdir;

// Re-export commonly used types
pub use traits::{CompileError, FetchError, HarvestStage, ReportError};

pub use compile::{CompileSummary, CompilerInvoker};
pub use download::{BulkDownloader, DownloadReport, DownloadTarget};
pub use links::{extract_links, LinkHarvester};
pub use pipeline::{MibPipeline, PipelineError, PipelineOutcome, PipelineStats, RunOptions};
pub use report::{ReportGenerator, ReportRequest, ReportStats};
pub use transfer::Transfer;
