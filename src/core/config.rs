use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::edgar::parsing::types::{Item, DEFAULT_OUTPUT_ITEMS};

// The thresholds below were tuned by hand on real filings. They are kept as
// named defaults until they can be recalibrated against a labeled corpus.

/// Longest text (in characters) that may still be read as an item heading.
pub const MAX_HEADING_CHARS: usize = 500;
/// Share of located items that must repeat before the TOC heuristic runs.
pub const AMBIGUITY_RATIO: f64 = 0.5;
/// Number of leading item headings measured by the TOC heuristic.
pub const TOC_LEADING_ITEMS: usize = 3;
/// Average gap (in characters) below which leading headings form a table of contents.
pub const MAX_TOC_GAP: usize = 1000;
/// Candidates kept per item after TOC pruning.
pub const TOC_KEEP: usize = 2;
pub const TOC_TIMEOUT: Duration = Duration::from_secs(60);
/// Sibling-walk content at or below this length is treated as a bare heading.
pub const MIN_CONTENT_CHARS: usize = 500;
/// Largest tolerated length difference between sibling-walk and offset-sliced content.
pub const MAX_CONTENT_DIVERGENCE: usize = 2000;

pub const DEFAULT_USER_AGENT: &str = "edgar-items software@example.com";
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

#[derive(Clone, Debug)]
pub struct ExtractorConfig {
    pub max_heading_chars: usize,
    pub ambiguity_ratio: f64,
    pub toc_leading_items: usize,
    pub max_toc_gap: usize,
    pub toc_keep: usize,
    pub toc_timeout: Duration,
    pub min_content_chars: usize,
    pub max_content_divergence: usize,
    pub output_items: Vec<Item>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_heading_chars: MAX_HEADING_CHARS,
            ambiguity_ratio: AMBIGUITY_RATIO,
            toc_leading_items: TOC_LEADING_ITEMS,
            max_toc_gap: MAX_TOC_GAP,
            toc_keep: TOC_KEEP,
            toc_timeout: TOC_TIMEOUT,
            min_content_chars: MIN_CONTENT_CHARS,
            max_content_divergence: MAX_CONTENT_DIVERGENCE,
            output_items: DEFAULT_OUTPUT_ITEMS.to_vec(),
        }
    }
}

/// Settings for talking to EDGAR and caching results.
#[derive(Clone, Debug)]
pub struct FetchConfig {
    pub user_agent: String,
    pub data_dir: PathBuf,
    pub max_concurrent: usize,
}

impl FetchConfig {
    pub fn from_env() -> Result<Self> {
        let user_agent = std::env::var("SEC_USER_AGENT")
            .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());

        let data_dir = PathBuf::from(
            std::env::var("EDGAR_ITEMS_DATA_DIR").unwrap_or_else(|_| "data".to_string()),
        );

        let max_concurrent = match std::env::var("EDGAR_ITEMS_MAX_CONCURRENT") {
            Ok(value) => value.parse::<usize>().map_err(|_| {
                anyhow!("EDGAR_ITEMS_MAX_CONCURRENT must be a positive integer, got {}", value)
            })?,
            Err(_) => DEFAULT_MAX_CONCURRENT,
        };
        if max_concurrent == 0 {
            return Err(anyhow!("EDGAR_ITEMS_MAX_CONCURRENT must be greater than zero"));
        }

        Ok(Self {
            user_agent,
            data_dir,
            max_concurrent,
        })
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            data_dir: PathBuf::from("data"),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}
