use itertools::Itertools;
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

use super::ancestor::find_common_ancestor;
use super::document::{Document, NodeId};
use super::error::{ExtractError, Result};
use super::types::{Combination, Item, ItemMatches, Part, TagMatch};

/// Winning headings for one part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartSelection {
    pub combination: Combination,
    pub ancestor: Option<NodeId>,
    /// Depth of the ancestor's children, i.e. the level at which the part's
    /// headings sit as siblings. `None` when no item of the part was located.
    pub depth: Option<usize>,
}

pub type PartSelections = BTreeMap<Part, PartSelection>;

/// Picks the candidate combination whose headings share the deepest common ancestor.
///
/// Combinations are visited in lexicographic index order and the first one
/// reaching the maximum depth wins.
pub fn select_part(doc: &Document, part: Part, matches: &ItemMatches) -> Result<PartSelection> {
    let candidates: Vec<(Item, &Vec<TagMatch>)> = part
        .items()
        .iter()
        .filter_map(|item| {
            matches
                .get(item)
                .filter(|tags| !tags.is_empty())
                .map(|tags| (*item, tags))
        })
        .collect();

    if candidates.is_empty() {
        return Ok(PartSelection::default());
    }

    let mut best: Option<(usize, NodeId, Vec<usize>)> = None;
    for indices in candidates
        .iter()
        .map(|(_, tags)| 0..tags.len())
        .multi_cartesian_product()
    {
        let combination: Vec<TagMatch> = indices
            .iter()
            .zip(&candidates)
            .map(|(index, (_, tags))| tags[*index])
            .collect();
        let (ancestor, depth) = find_common_ancestor(doc, &combination)?;
        if best.as_ref().map_or(true, |(best_depth, _, _)| depth > *best_depth) {
            best = Some((depth, ancestor, indices));
        }
    }

    let (depth, ancestor, indices) = best.ok_or(ExtractError::EmptyCombination(part))?;
    if indices.len() != candidates.len() {
        return Err(ExtractError::EmptyCombination(part));
    }

    let combination = candidates
        .iter()
        .zip(indices)
        .map(|((item, tags), index)| (*item, tags[index]))
        .collect();

    Ok(PartSelection {
        combination,
        ancestor: Some(ancestor),
        depth: Some(depth + 1),
    })
}

pub fn select_combinations(doc: &Document, matches: &ItemMatches) -> Result<PartSelections> {
    Part::iter()
        .map(|part| {
            let selection = select_part(doc, part, matches)?;
            log::debug!(
                "{}: depth {:?}, combination {:?}",
                part,
                selection.depth,
                selection.combination
            );
            Ok((part, selection))
        })
        .collect()
}

/// All parts' combinations merged into one item → heading map.
pub fn merge_combinations(selections: &PartSelections) -> Combination {
    selections
        .values()
        .flat_map(|selection| selection.combination.iter().map(|(item, tag)| (*item, *tag)))
        .collect()
}
