pub mod core;
pub mod edgar;
pub mod utils;

// Re-exports
pub use crate::core::config::{ExtractorConfig, FetchConfig};
pub use edgar::parsing::{extract_items, ExtractError, ExtractedItems, Item, ItemExtractor};
pub use edgar::report::ReportType;
