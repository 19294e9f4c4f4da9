//! Pipeline tuning knobs.

use std::time::Duration;

/// Configuration for one pipeline execution.
///
/// Defaults encode the operational trade-offs each stage was tuned for:
/// parse batches are half the size of scrape/save batches because model
/// calls are slower and costlier, and enrichment is paced to the
/// provider's hard per-minute quota.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Search variants attempted before giving up on a short candidate pool
    pub max_search_iterations: u32,

    /// Result cap requested per search call
    pub search_page_size: usize,

    pub scrape_batch_size: usize,
    pub parse_batch_size: usize,
    pub save_batch_size: usize,
    /// Unscored candidates pulled per scoring pass
    pub score_batch_size: usize,

    /// Worker limit for concurrent model calls (parse, score)
    pub ai_concurrency: usize,

    /// Mandatory spacing between enrichment calls
    pub enrich_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_search_iterations: 3,
            search_page_size: 50,
            scrape_batch_size: 20,
            parse_batch_size: 10,
            save_batch_size: 20,
            score_batch_size: 20,
            ai_concurrency: 5,
            enrich_interval: Duration::from_secs(2),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_search_iterations(mut self, iterations: u32) -> Self {
        self.max_search_iterations = iterations;
        self
    }

    pub fn with_search_page_size(mut self, size: usize) -> Self {
        self.search_page_size = size;
        self
    }

    pub fn with_scrape_batch_size(mut self, size: usize) -> Self {
        self.scrape_batch_size = size.max(1);
        self
    }

    pub fn with_parse_batch_size(mut self, size: usize) -> Self {
        self.parse_batch_size = size.max(1);
        self
    }

    pub fn with_save_batch_size(mut self, size: usize) -> Self {
        self.save_batch_size = size.max(1);
        self
    }

    pub fn with_score_batch_size(mut self, size: usize) -> Self {
        self.score_batch_size = size.max(1);
        self
    }

    pub fn with_ai_concurrency(mut self, concurrency: usize) -> Self {
        self.ai_concurrency = concurrency.max(1);
        self
    }

    pub fn with_enrich_interval(mut self, interval: Duration) -> Self {
        self.enrich_interval = interval;
        self
    }
}
