use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use strum::IntoEnumIterator;

use super::combination::{merge_combinations, select_combinations, PartSelections};
use super::document::{Document, NodeId};
use super::error::{ExtractError, Result};
use super::locator::locate_items;
use super::text::html_to_text;
use super::toc::prune_toc_matches;
use super::types::{
    Combination, ExtractedItems, Item, ItemMatches, TagMatch, TocPosition, NON_SYMBOL_TERMINATORS,
    SYMBOL_TERMINATORS,
};
use crate::core::config::ExtractorConfig;

/// Raw-HTML patterns locating an item label right after a tag, tried in order.
struct LabelPatterns {
    symbol: Regex,
    plain: Regex,
    bare: Regex,
}

impl LabelPatterns {
    fn new(label: &str) -> std::result::Result<Self, regex::Error> {
        // "Item 1A" matches "item 1a", "item1a" and "item&nbsp;1a" in any case.
        let label = label
            .to_lowercase()
            .split_whitespace()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"(?:\s|&nbsp;|&#160;|&#xa0;)?");
        let alternatives = |terminators: &[&str]| {
            terminators
                .iter()
                .map(|t| regex::escape(t))
                .collect::<Vec<_>>()
                .join("|")
        };

        Ok(Self {
            symbol: Regex::new(&format!(
                r"(?i)>\s*({})(?:{})",
                label,
                alternatives(SYMBOL_TERMINATORS)
            ))?,
            plain: Regex::new(&format!(
                r"(?i)>\s*({})(?:{})",
                label,
                alternatives(NON_SYMBOL_TERMINATORS)
            ))?,
            bare: Regex::new(&format!(r"(?i)>\s*({})(?:[^a-z0-9]|$)", label))?,
        })
    }
}

static LABEL_PATTERNS: Lazy<HashMap<Item, LabelPatterns>> = Lazy::new(|| {
    Item::iter()
        .map(|item| {
            let patterns = LabelPatterns::new(item.label()).unwrap();
            (item, patterns)
        })
        .collect()
});

/// Byte offset of `item`'s label in the raw HTML, searching from `start`.
///
/// Symbol-terminated labels are preferred; plain-space and bare labels are
/// only added while fewer than two candidates were found. On the first search
/// of a document whose table of contents comes first, the second occurrence wins.
pub fn find_label_offset(
    html: &str,
    item: Item,
    toc_position: TocPosition,
    start: usize,
) -> Option<usize> {
    let patterns = LABEL_PATTERNS.get(&item)?;
    let haystack = html.get(start..)?;
    let offsets_for = |re: &Regex| {
        re.captures_iter(haystack)
            .filter_map(|caps| caps.get(1))
            .map(|label| start + label.start())
            .collect::<Vec<_>>()
    };

    let mut offsets = offsets_for(&patterns.symbol);
    if offsets.len() < 2 {
        offsets.extend(offsets_for(&patterns.plain));
    }
    if offsets.len() < 2 {
        offsets.extend(offsets_for(&patterns.bare));
    }
    offsets.sort_unstable();
    offsets.dedup();

    let pick = if toc_position == TocPosition::Beginning && start == 0 && offsets.len() > 1 {
        1
    } else {
        0
    };
    offsets.get(pick).copied()
}

/// Everything decided about a document before any content is sliced.
#[derive(Debug, Clone)]
pub struct Selection {
    pub toc_position: TocPosition,
    /// Candidates per item after TOC pruning.
    pub matches: ItemMatches,
    pub parts: PartSelections,
    pub combination: Combination,
}

#[derive(Debug, Clone, Default)]
pub struct ItemExtractor {
    config: ExtractorConfig,
}

impl ItemExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn with_items(mut self, items: &[Item]) -> Self {
        self.config.output_items = items.to_vec();
        self
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn select(&self, doc: &Document) -> Result<Selection> {
        let located = locate_items(doc, self.config.max_heading_chars);
        let (toc_position, matches) = prune_toc_matches(doc, located, &self.config)?;
        let parts = select_combinations(doc, &matches)?;
        let combination = merge_combinations(&parts);
        log::debug!("Item combination: {:?}", combination);

        Ok(Selection {
            toc_position,
            matches,
            parts,
            combination,
        })
    }

    /// Raw HTML of each requested item that could be located.
    pub fn extract_raw(&self, html: &str) -> Result<ExtractedItems> {
        let doc = Document::parse(html)?;
        let selection = self.select(&doc)?;

        let mut items = ExtractedItems::new();
        for item in &self.config.output_items {
            if !selection.combination.contains_key(item) {
                log::debug!("{} not located", item);
                continue;
            }
            let content = self.extract_item(&doc, html, &selection, *item)?;
            items.insert(*item, content);
        }
        Ok(items)
    }

    /// Visible text of each requested item that could be located.
    pub fn extract(&self, html: &str) -> Result<ExtractedItems> {
        Ok(self
            .extract_raw(html)?
            .into_iter()
            .map(|(item, content)| (item, html_to_text(&content)))
            .collect())
    }

    /// Raw content of `item`, bounded by the next selected item's heading.
    pub fn extract_item(
        &self,
        doc: &Document,
        html: &str,
        selection: &Selection,
        item: Item,
    ) -> Result<String> {
        let start = *selection
            .combination
            .get(&item)
            .ok_or(ExtractError::ItemNotSelected(item))?;
        let part_depth = self
            .part_depth(selection, item)
            .ok_or(ExtractError::ItemNotSelected(item))?;

        let end = std::iter::successors(item.next(), |next| next.next())
            .find_map(|next| selection.combination.get(&next).map(|tag| (next, *tag)));

        let start_node = lift(doc, start, part_depth);
        let end_node = end.map(|(end_item, end_tag)| {
            if end_item.part() == item.part()
                || self.part_depth(selection, end_item) == Some(part_depth)
            {
                lift(doc, end_tag, part_depth)
            } else {
                end_tag.node
            }
        });

        let mut content = doc.outer_html(start_node);
        for sibling in doc.following_siblings(start_node) {
            if Some(*sibling) == end_node {
                break;
            }
            content.push_str(&doc.outer_html(*sibling));
        }

        let direct_content = find_label_offset(html, item, selection.toc_position, 0).map(|from| {
            // With no following item, a later "Item 1" marks a trailing index or signature block.
            let end_item = end.map_or(Item::Item1, |(end_item, _)| end_item);
            let to = find_label_offset(html, end_item, selection.toc_position, from)
                .unwrap_or(html.len());
            log::debug!("{}: offsets {}..{} (end label {})", item, from, to, end_item);
            &html[from..to]
        });

        Ok(self.reconcile(item, content, direct_content, end.is_none()))
    }

    fn part_depth(&self, selection: &Selection, item: Item) -> Option<usize> {
        selection
            .parts
            .get(&item.part())
            .and_then(|part| part.depth)
    }

    /// Chooses between the sibling walk and the offset slice.
    fn reconcile(
        &self,
        item: Item,
        content: String,
        direct_content: Option<&str>,
        is_last: bool,
    ) -> String {
        let Some(direct_content) = direct_content else {
            log::debug!("{}: label offset not found, keeping sibling content", item);
            return content;
        };

        let content_len = content.chars().count();
        let direct_len = direct_content.chars().count();
        let min = self.config.min_content_chars;

        let reason = if is_last {
            Some("last selected item")
        } else if content_len <= min && direct_len > min {
            Some("sibling content holds only a heading")
        } else if content_len.abs_diff(direct_len) > self.config.max_content_divergence {
            Some("sibling content diverges from offsets")
        } else {
            None
        };

        match reason {
            Some(reason) => {
                log::debug!(
                    "{}: using offset content ({} chars) over sibling content ({} chars): {}",
                    item,
                    direct_len,
                    content_len,
                    reason
                );
                direct_content.to_string()
            }
            None => content,
        }
    }
}

/// Walks `tag` up to `depth`, coarsening a text container to its heading block.
fn lift(doc: &Document, tag: TagMatch, depth: usize) -> NodeId {
    let mut node = tag.node;
    let mut current = tag.depth;
    while current > depth {
        match doc.parent(node) {
            Some(parent) => node = parent,
            None => break,
        }
        current -= 1;
    }
    node
}

/// Plain text of item 1, 1A and 7, keyed by item. Items not found are absent.
pub fn extract_items(html: &str) -> Result<ExtractedItems> {
    ItemExtractor::default().extract(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edgar::parsing::tests::{
        filler, normalize, sectioned_filing, toc_filing, BUSINESS, MDNA, RISK,
    };

    #[test]
    fn test_label_offset_prefers_symbol_terminators() {
        let html = "<p>Item 7 overview</p><p>Item 7. MD&amp;A</p><p>Item 7. continued</p>";
        let offset = find_label_offset(html, Item::Item7, TocPosition::End, 0).unwrap();
        assert_eq!(&html[offset..offset + 7], "Item 7.");
    }

    #[test]
    fn test_label_offset_falls_back_to_bare_label() {
        let html = "<td>ITEM&nbsp;7</td>";
        let offset = find_label_offset(html, Item::Item7, TocPosition::End, 0).unwrap();
        assert_eq!(offset, 4);
        assert_eq!(find_label_offset("<p>Item 7A. Market</p>", Item::Item7, TocPosition::End, 0), None);
    }

    #[test]
    fn test_label_offset_skips_leading_toc_on_first_search() {
        let html = "<td>Item 1.</td><p>Item 1. Business</p><p>Item 1. Again</p>";
        let first = find_label_offset(html, Item::Item1, TocPosition::Beginning, 0).unwrap();
        assert_eq!(first, html.find("Item 1. Business").unwrap());

        let from_first = find_label_offset(html, Item::Item1, TocPosition::Beginning, first).unwrap();
        assert_eq!(from_first, html.find("Item 1. Again").unwrap());

        let at_end = find_label_offset(html, Item::Item1, TocPosition::End, 0).unwrap();
        assert_eq!(at_end, 4);
    }

    #[test]
    fn test_items_are_bounded_by_the_next_heading() {
        let items = extract_items(&sectioned_filing(800)).unwrap();
        assert_eq!(
            items.keys().copied().collect::<Vec<_>>(),
            vec![Item::Item1, Item::Item1A, Item::Item7]
        );
        assert_eq!(
            normalize(&items[&Item::Item1]),
            normalize(&format!("Item 1. Business {} {}", BUSINESS, filler(800)))
        );
        assert_eq!(
            normalize(&items[&Item::Item1A]),
            normalize(&format!("Item 1A. Risk Factors {} {}", RISK, filler(800)))
        );
        assert!(items[&Item::Item7].starts_with("Item 7. Management"));
        assert!(items[&Item::Item7].contains(MDNA));
    }

    #[test]
    fn test_short_sibling_content_falls_back_to_offsets() {
        // The heading is wrapped on its own, so the sibling walk only sees the heading.
        let body = filler(900);
        let html = format!(
            "<body><div><div><p>Item 1. Business</p></div><p>{body}</p>\
             <p>Item 7. Management's Discussion</p><p>{MDNA}</p></div></body>"
        );
        let doc = Document::parse(&html).unwrap();
        let extractor = ItemExtractor::default();
        let selection = extractor.select(&doc).unwrap();
        assert_ne!(
            selection.parts[&Item::Item1.part()].depth,
            selection.parts[&Item::Item7.part()].depth
        );

        let raw = extractor
            .extract_item(&doc, &html, &selection, Item::Item1)
            .unwrap();
        assert!(raw.starts_with("Item 1. Business"));
        assert!(raw.contains(&body));
        assert!(!raw.contains("Management"));
    }

    #[test]
    fn test_divergent_sibling_content_falls_back_to_offsets() {
        // Item 7 sits two levels deeper, so the sibling walk from item 1 runs past it.
        let business = "A".repeat(300);
        let mdna = "C".repeat(5000);
        let html = format!(
            "<body><div><p>Item 1. Business</p><p>{business}</p>\
             <div><div><p>Item 7. MD</p><p>{mdna}</p></div></div></div></body>"
        );
        let doc = Document::parse(&html).unwrap();
        let extractor = ItemExtractor::default();
        let selection = extractor.select(&doc).unwrap();
        assert_eq!(selection.parts[&Item::Item1.part()].depth, Some(2));
        assert_eq!(selection.parts[&Item::Item7.part()].depth, Some(4));

        let raw = extractor
            .extract_item(&doc, &html, &selection, Item::Item1)
            .unwrap();
        assert!(raw.starts_with("Item 1. Business"));
        assert!(!raw.contains("Item 7"));

        let items = extract_items(&html).unwrap();
        assert_eq!(items[&Item::Item1], format!("Item 1. Business\n{}", business));
        assert!(items[&Item::Item7].contains(&mdna));
    }

    #[test]
    fn test_extract_item_rejects_unselected_items() {
        let html = sectioned_filing(100);
        let doc = Document::parse(&html).unwrap();
        let extractor = ItemExtractor::default();
        let selection = extractor.select(&doc).unwrap();
        assert!(matches!(
            extractor.extract_item(&doc, &html, &selection, Item::Item8),
            Err(ExtractError::ItemNotSelected(Item::Item8))
        ));
    }

    #[test]
    fn test_selection_skips_leading_toc() {
        let html = toc_filing(6000);
        let doc = Document::parse(&html).unwrap();
        let selection = ItemExtractor::default().select(&doc).unwrap();
        assert_eq!(selection.toc_position, TocPosition::Beginning);
        for item in [Item::Item1, Item::Item1A, Item::Item7] {
            let chosen = selection.combination[&item].node;
            assert_eq!(doc.element_name(chosen), Some("p"), "{} picked a TOC cell", item);
        }
    }

    #[test]
    fn test_with_items_limits_output() {
        let items = ItemExtractor::default()
            .with_items(&[Item::Item7])
            .extract(&sectioned_filing(100))
            .unwrap();
        assert_eq!(items.keys().copied().collect::<Vec<_>>(), vec![Item::Item7]);
    }
}
