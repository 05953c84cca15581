//! Core traits and types for the MIB harvest stages.
//!
//! This module defines:
//! - The stage abstraction via [`HarvestStage`]
//! - One error enum per stage ([`FetchError`], [`CompileError`], [`ReportError`])

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::traits::ProcessError;

// ============================================================================
// Pipeline Trait
// ============================================================================

/// Generic pipeline stage that transforms Input → Output.
///
/// Each stage of the MIB pipeline (link harvesting, downloading, compiling,
/// reporting) implements this trait so the pipeline can run and log them
/// uniformly.
///
/// # Examples
///
/// ```ignore
/// struct CountStage;
///
/// #[async_trait]
/// impl HarvestStage for CountStage {
///     type Input = Vec<String>;
///     type Output = usize;
///     type Error = ReportError;
///
///     async fn execute(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
///         Ok(input.len())
///     }
///
///     fn stage_name(&self) -> &'static str {
///         "count"
///     }
/// }
/// ```
#[async_trait]
pub trait HarvestStage: Send + Sync {
    /// Input type consumed by this stage
    type Input: Send;

    /// Output type produced by this stage
    type Output;

    /// Error type for stage failures
    type Error: std::error::Error + Send + Sync + 'static;

    /// Executes the stage.
    ///
    /// # Errors
    ///
    /// Returns `Err` only for failures that must abort the run. Per-item
    /// failures the stage tolerates (a failed download, a MIB that does not
    /// compile) are reported in the output instead.
    async fn execute(&self, input: Self::Input) -> Result<Self::Output, Self::Error>;

    /// Returns a human-readable name for this stage, used in logs.
    fn stage_name(&self) -> &'static str;
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised while fetching the vendor page or downloading files.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The transfer tool could not be launched
    #[error(transparent)]
    Transfer(#[from] ProcessError),

    /// The transfer tool ran but reported failure
    #[error("Failed to fetch {url} (exit status {code:?}): {stderr}")]
    Http {
        url: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The fetched document could not be interpreted
    #[error("Failed to parse page: {0}")]
    Parse(String),
}

/// Errors that abort the compilation stage.
#[derive(Error, Debug)]
pub enum CompileError {
    /// The working directory could not be listed or resolved
    #[error("Failed to scan working directory '{}': {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The compiler binary could not be launched
    #[error("MIB compiler unavailable: {0}")]
    CompilerUnavailable(#[from] ProcessError),
}

/// Errors that abort report generation. Any of these leaves no output file.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Generic I/O error on an artifact, the directory or the output
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An artifact is not valid JSON
    #[error("Malformed JSON artifact '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An artifact's top level is not an object
    #[error("JSON artifact '{}' is not an object", path.display())]
    NotAnObject { path: PathBuf },

    /// A selected record lacks `name`/`oid` or has mistyped fields
    #[error("Malformed record '{key}' in '{artifact}': {source}")]
    MalformedRecord {
        artifact: String,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// CSV serialization failed
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The blocking report task panicked or was cancelled
    #[error("Report task failed: {0}")]
    Task(String),
}

// ============================================================================
// Tests
// ============================================================================
