pub mod cache;
pub mod filing;
pub mod parsing;
pub mod rate_limiter;
pub mod report;
pub mod utils;

use anyhow::Result;

use crate::core::config::FetchConfig;
use filing::Edgar;
use parsing::{ExtractedItems, ItemExtractor};
use report::ReportType;

/// Item 1, 1A and 7 text of the newest `form` filing for `ticker`.
pub async fn get_latest_items(ticker: &str, form: &ReportType) -> Result<ExtractedItems> {
    let edgar = Edgar::new(FetchConfig::from_env()?);
    edgar
        .fetch_filing_items(ticker, form, &ItemExtractor::default())
        .await
}
