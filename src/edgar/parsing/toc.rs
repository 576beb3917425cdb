use std::time::{Duration, Instant};

use super::ancestor::find_common_ancestor;
use super::document::Document;
use super::error::Result;
use super::types::{ItemMatches, TagMatch, TocPosition};
use crate::core::config::ExtractorConfig;

// Nodes visited between two deadline checks.
const DEADLINE_CHECK_INTERVAL: usize = 1024;

/// Cooperative wall-clock bound for the distance walk.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Option<Instant>,
    now: fn() -> Instant,
}

impl Deadline {
    pub fn after(timeout: Duration) -> Self {
        Self::with_clock(timeout, Instant::now)
    }

    /// A deadline read from `now` instead of the system clock.
    pub fn with_clock(timeout: Duration, now: fn() -> Instant) -> Self {
        Deadline {
            at: now().checked_add(timeout),
            now,
        }
    }

    pub fn never() -> Self {
        Deadline {
            at: None,
            now: Instant::now,
        }
    }

    pub fn expired(&self) -> bool {
        self.at.is_some_and(|deadline| (self.now)() >= deadline)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Distances {
    Measured(Vec<usize>),
    /// The walk was abandoned after visiting `visited` nodes.
    TimedOut { visited: usize },
}

/// Visible characters between each adjacent pair of `tags`.
///
/// For each pair the walk covers their common ancestor's descendants in order,
/// counting text that starts after the first tag's subtree and stopping at the
/// second tag.
pub fn tag_distances(doc: &Document, tags: &[TagMatch], deadline: Deadline) -> Result<Distances> {
    let mut distances = Vec::with_capacity(tags.len().saturating_sub(1));
    let mut visited = 0;

    for pair in tags.windows(2) {
        let (first, second) = (pair[0], pair[1]);
        let (ancestor, _) = find_common_ancestor(doc, &[first, second])?;
        let first_end = doc.subtree_end(first.node);

        let mut chars = 0;
        for (step, node) in doc.descendants(ancestor).enumerate() {
            if step % DEADLINE_CHECK_INTERVAL == 0 && deadline.expired() {
                return Ok(Distances::TimedOut { visited });
            }
            visited += 1;
            if node == second.node {
                break;
            }
            if node > first_end {
                if let Some(text) = doc.text(node) {
                    chars += text.chars().count();
                }
            }
        }
        distances.push(chars);
    }

    Ok(Distances::Measured(distances))
}

/// Decides where repeated headings cluster and prunes candidates accordingly.
///
/// Skipped (keeping every match, position `Beginning`) unless more than
/// `ambiguity_ratio` of the located items have several matches.
pub fn prune_toc_matches(
    doc: &Document,
    matches: ItemMatches,
    config: &ExtractorConfig,
) -> Result<(TocPosition, ItemMatches)> {
    let located: Vec<&Vec<TagMatch>> = matches.values().filter(|tags| !tags.is_empty()).collect();
    if located.is_empty() {
        return Ok((TocPosition::Beginning, matches));
    }

    let repeated = located.iter().filter(|tags| tags.len() > 1).count();
    let ratio = repeated as f64 / located.len() as f64;
    if ratio <= config.ambiguity_ratio {
        log::debug!("TOC heuristic skipped, repeated ratio {:.2}", ratio);
        return Ok((TocPosition::Beginning, matches));
    }

    let leading: Vec<TagMatch> = located
        .iter()
        .map(|tags| tags[0])
        .take(config.toc_leading_items)
        .collect();

    let position = match tag_distances(doc, &leading, Deadline::after(config.toc_timeout))? {
        Distances::Measured(distances) if !distances.is_empty() => {
            let average = distances.iter().sum::<usize>() as f64 / distances.len() as f64;
            log::debug!("Leading heading distances {:?}, average {:.1}", distances, average);
            if average <= config.max_toc_gap as f64 {
                TocPosition::Beginning
            } else {
                TocPosition::End
            }
        }
        Distances::Measured(_) => TocPosition::End,
        Distances::TimedOut { visited } => {
            log::warn!(
                "TOC distance measurement exceeded {:?} after {} nodes, assuming the table of contents comes first",
                config.toc_timeout,
                visited
            );
            TocPosition::Beginning
        }
    };
    log::debug!("Table of contents position: {:?}", position);

    let keep = config.toc_keep;
    let pruned = matches
        .into_iter()
        .map(|(item, tags)| {
            let kept = match position {
                _ if tags.is_empty() => tags,
                TocPosition::Beginning => tags.into_iter().skip(1).take(keep).collect(),
                TocPosition::End if tags.len() > keep => tags.into_iter().take(keep).collect(),
                TocPosition::End => {
                    let last = tags.len() - 1;
                    tags.into_iter().take(last).collect()
                }
            };
            (item, kept)
        })
        .collect();

    Ok((position, pruned))
}
