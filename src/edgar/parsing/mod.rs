pub mod ancestor;
pub mod combination;
pub mod document;
pub mod error;
pub mod locator;
pub mod section;
pub mod text;
pub mod toc;
pub mod types;

#[cfg(test)]
pub(crate) mod tests;

pub use document::{Document, NodeId};
pub use error::ExtractError;
pub use section::{extract_items, ItemExtractor, Selection};
pub use types::{ExtractedItems, Item, Part, TagMatch, TocPosition};
