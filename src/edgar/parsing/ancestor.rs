use super::document::{Document, NodeId};
use super::error::{ExtractError, Result};
use super::types::TagMatch;

/// Deepest node that is a strict ancestor of every match, with its depth below `<body>`.
///
/// A single match resolves to its parent. When one match encloses the others
/// the enclosing match's parent is returned, since a node is never its own ancestor.
pub fn find_common_ancestor(doc: &Document, matches: &[TagMatch]) -> Result<(NodeId, usize)> {
    let (first, rest) = matches
        .split_first()
        .ok_or(ExtractError::NoCommonAncestor(0))?;

    for tag_match in matches {
        if doc.depth_from_body(tag_match.node).is_none() {
            return Err(ExtractError::OutsideBody(tag_match.node));
        }
    }

    let lowest = rest
        .iter()
        .fold(first.node, |acc, tag_match| doc.common_ancestor(acc, tag_match.node));

    let ancestor = if matches.iter().any(|tag_match| tag_match.node == lowest) {
        doc.parent(lowest)
            .ok_or(ExtractError::NoCommonAncestor(matches.len()))?
    } else {
        lowest
    };

    let depth = doc
        .depth_from_body(ancestor)
        .ok_or(ExtractError::OutsideBody(ancestor))?;

    Ok((ancestor, depth))
}
