//! Bulk downloads into the working directory.

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::config::MibSet;
use crate::harvest::traits::{FetchError, HarvestStage};
use crate::harvest::transfer::Transfer;

/// One file to fetch: remote URL and local file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub url: String,
    pub file_name: String,
}

impl DownloadTarget {
    /// `base_url + name`, saved as `name.txt`.
    pub fn for_mib_set(set: &MibSet) -> Vec<DownloadTarget> {
        set.files
            .iter()
            .map(|name| DownloadTarget {
                url: format!("{}{}", set.base_url, name),
                file_name: format!("{name}.txt"),
            })
            .collect()
    }

    /// Target for a harvested vendor link, named after the last URL path
    /// segment. Absolute links are used as-is; anything else gets `prefix`.
    /// Returns `None` when the link has no file name to save under.
    pub fn for_link(prefix: &str, href: &str) -> Option<DownloadTarget> {
        let url = if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            format!("{prefix}{href}")
        };

        let path = href.split(['?', '#']).next().unwrap_or_default();
        let file_name = path.rsplit('/').next().unwrap_or_default();
        if file_name.is_empty() {
            return None;
        }

        Some(DownloadTarget {
            url,
            file_name: file_name.to_string(),
        })
    }
}

/// Outcome of a batch of downloads.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub fetched: Vec<String>,
    /// Files whose transfer exited non-zero; they may exist but hold garbage
    pub failed: Vec<String>,
}

impl DownloadReport {
    pub fn merge(&mut self, other: DownloadReport) {
        self.fetched.extend(other.fetched);
        self.failed.extend(other.failed);
    }

    pub fn total(&self) -> usize {
        self.fetched.len() + self.failed.len()
    }
}

pub struct BulkDownloader {
    transfer: Transfer,
}

impl BulkDownloader {
    pub fn new(transfer: Transfer) -> Self {
        Self { transfer }
    }
}

#[async_trait]
impl HarvestStage for BulkDownloader {
    type Input = Vec<DownloadTarget>;
    type Output = DownloadReport;
    type Error = FetchError;

    #[instrument(skip_all, fields(count = targets.len()))]
    async fn execute(&self, targets: Vec<DownloadTarget>) -> Result<DownloadReport, FetchError> {
        let mut report = DownloadReport::default();

        for target in targets {
            info!("Downloading file {}", target.file_name);
            let output = self.transfer.download(&target).await?;

            if output.success() {
                report.fetched.push(target.file_name);
            } else {
                warn!(
                    url = %target.url,
                    code = ?output.code,
                    "Download failed, {} will likely not compile",
                    target.file_name
                );
                report.failed.push(target.file_name);
            }
        }

        Ok(report)
    }

    fn stage_name(&self) -> &'static str {
        "bulk_downloader"
    }
}
