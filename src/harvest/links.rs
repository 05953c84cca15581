//! Vendor page scraping.

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};

use crate::config::VendorSource;
use crate::harvest::traits::{FetchError, HarvestStage};
use crate::harvest::transfer::Transfer;

/// Collects MIB download links from the vendor's documentation page.
pub struct LinkHarvester {
    transfer: Transfer,
    source: VendorSource,
}

impl LinkHarvester {
    pub fn new(transfer: Transfer, source: VendorSource) -> Self {
        Self { transfer, source }
    }

    pub fn source(&self) -> &VendorSource {
        &self.source
    }
}

#[async_trait]
impl HarvestStage for LinkHarvester {
    type Input = ();
    type Output = Vec<String>;
    type Error = FetchError;

    #[instrument(skip_all, fields(url = %self.source.page_url))]
    async fn execute(&self, _input: ()) -> Result<Vec<String>, FetchError> {
        let body = self.transfer.fetch_page(&self.source.page_url).await?;
        let links = extract_links(&body, &self.source.link_filter)?;
        info!(count = links.len(), "Harvested vendor MIB links");
        Ok(links)
    }

    fn stage_name(&self) -> &'static str {
        "link_harvester"
    }
}

/// Returns the `href` of every anchor whose serialized element contains
/// `filter`, in document order. Duplicates are kept.
pub fn extract_links(html: &str, filter: &str) -> Result<Vec<String>, FetchError> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a").map_err(|e| FetchError::Parse(format!("{e:?}")))?;

    let mut links = Vec::new();
    for anchor in document.select(&anchors) {
        if !anchor.html().contains(filter) {
            continue;
        }
        match anchor.value().attr("href") {
            Some(href) => links.push(href.to_string()),
            None => debug!(element = %anchor.html(), "Matching anchor has no href, skipped"),
        }
    }
    Ok(links)
}
