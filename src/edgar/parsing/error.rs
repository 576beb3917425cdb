use thiserror::Error;

use super::document::NodeId;
use super::types::{Item, Part};

/// Failures of a single extraction pass.
///
/// A missing item is not an error: it is simply absent from the result.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("document has no <body> element")]
    MissingBody,

    #[error("node {0} has no ancestor chain reaching <body>")]
    OutsideBody(NodeId),

    #[error("no common ancestor for {0} nodes")]
    NoCommonAncestor(usize),

    /// Candidates existed for the part but no combination won. Indicates a bug.
    #[error("combination search for {0} selected nothing despite non-empty candidates")]
    EmptyCombination(Part),

    #[error("invalid item key: {0}")]
    InvalidItem(String),

    #[error("{0} has no selected heading in the combination")]
    ItemNotSelected(Item),
}

pub type Result<T> = std::result::Result<T, ExtractError>;
