//! Profile-scrape provider contract.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::profile::ScrapedProfile;

/// Batch profile scraper.
///
/// Partial success within a batch is expected and normal: the returned
/// vector carries one outcome per scraped URL, failed URLs included. A
/// URL missing from the output entirely is treated as not attempted and
/// stays pending for the next run.
#[async_trait]
pub trait ProfileScraper: Send + Sync {
    async fn scrape_batch(&self, urls: &[String]) -> Result<Vec<ScrapedProfile>>;
}
