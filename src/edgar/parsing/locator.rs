use strum::IntoEnumIterator;

use super::document::{Document, NodeId};
use super::types::{Item, ItemMatches, TagMatch, NON_SYMBOL_TERMINATORS, SYMBOL_TERMINATORS};

/// Prefixes and exact texts that identify one item's heading, all lowercase.
struct HeadingPatterns {
    exact: [String; 2],
    symbol_starts: Vec<String>,
    plain_starts: Vec<String>,
}

impl HeadingPatterns {
    fn new(label: &str) -> Self {
        let spaced = label.to_lowercase();
        let compact = spaced.replace(' ', "");
        let starts = |terminators: &[&str]| {
            [&spaced, &compact]
                .iter()
                .flat_map(|label| terminators.iter().map(move |t| format!("{}{}", label, t)))
                .collect::<Vec<_>>()
        };
        let symbol_starts = starts(SYMBOL_TERMINATORS);
        let plain_starts = starts(NON_SYMBOL_TERMINATORS);
        Self {
            exact: [spaced, compact],
            symbol_starts,
            plain_starts,
        }
    }

    fn matches(&self, text: &str) -> bool {
        self.symbol_starts.iter().any(|start| text.starts_with(start.as_str()))
            || self.plain_starts.iter().any(|start| text.starts_with(start.as_str()))
            || self.exact.iter().any(|exact| text == exact)
    }
}

/// Lowercased, trimmed text with non-breaking spaces treated as plain spaces.
fn normalize_heading_text(text: &str) -> String {
    text.trim().replace('\u{a0}', " ").to_lowercase()
}

/// Every element below `<body>` whose own text starts with `label` plus a terminator.
///
/// Only direct text children are inspected so that containers are never matched
/// for their descendants' text. Once a text child matches, the rest of its
/// element's subtree is skipped; element children before that text are still
/// searched. Matches are ordered by the position of the matching text. Texts
/// longer than `max_chars` are ignored.
pub fn search_tags(doc: &Document, label: &str, max_chars: usize) -> Vec<TagMatch> {
    let patterns = HeadingPatterns::new(label);
    let body = doc.body();
    let mut results = Vec::new();
    let mut skip_through: Option<NodeId> = None;

    for id in doc.descendants(body) {
        if skip_through.is_some_and(|end| id <= end) {
            continue;
        }
        let Some(text) = doc.text(id) else {
            continue;
        };
        let Some(element) = doc.parent(id).filter(|parent| *parent != body) else {
            continue;
        };

        let text = normalize_heading_text(text);
        if text.chars().count() <= max_chars && patterns.matches(&text) {
            if let Some(depth) = doc.depth_from_body(element) {
                results.push(TagMatch {
                    node: element,
                    depth,
                });
            }
            skip_through = Some(doc.subtree_end(element));
        }
    }

    results
}

/// Runs [`search_tags`] for every known item.
pub fn locate_items(doc: &Document, max_chars: usize) -> ItemMatches {
    Item::iter()
        .map(|item| {
            let matches = search_tags(doc, item.label(), max_chars);
            log::debug!("{}: {} candidate heading(s)", item, matches.len());
            (item, matches)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 500;

    fn count(html: &str, label: &str) -> usize {
        let doc = Document::parse(html).unwrap();
        search_tags(&doc, label, MAX).len()
    }

    #[test]
    fn test_heading_with_terminator_matches() {
        assert_eq!(count("<div>Item 1A. Risk Factors</div>", "Item 1A"), 1);
        assert_eq!(count("<div>ITEM 1A: RISK FACTORS</div>", "Item 1A"), 1);
        assert_eq!(count("<div>Item 1A — Risk Factors</div>", "Item 1A"), 1);
        assert_eq!(count("<div>Item1A.Risk Factors</div>", "Item 1A"), 1);
        assert_eq!(count("<div>Item&nbsp;7. MD&amp;A</div>", "Item 7"), 1);
        assert_eq!(count("<div> Item 7 </div>", "Item 7"), 1);
        assert_eq!(count("<p>Item 7 continues below</p>", "Item 7"), 1);
    }

    #[test]
    fn test_label_followed_by_letter_does_not_match() {
        assert_eq!(count("<div>Item 1Above average risk</div>", "Item 1A"), 0);
        assert_eq!(count("<div>Item 1Above average risk</div>", "Item 1"), 0);
        assert_eq!(count("<div>Item 1A. Risk Factors</div>", "Item 1"), 0);
        assert_eq!(count("<div>Item 10. Directors</div>", "Item 1"), 0);
    }

    #[test]
    fn test_only_direct_text_is_inspected() {
        let html = "<body><section><div><span>Item 1. Business</span></div></section></body>";
        let doc = Document::parse(html).unwrap();
        let matches = search_tags(&doc, "Item 1", MAX);
        assert_eq!(matches.len(), 1);
        assert_eq!(doc.element_name(matches[0].node), Some("span"));
        assert_eq!(matches[0].depth, 3);
    }

    #[test]
    fn test_node_recorded_once_and_long_text_skipped() {
        let html = "<body><p>Item 2. Properties<br>Item 2. Again</p></body>";
        assert_eq!(count(html, "Item 2"), 1);

        let long = format!("<body><p>Item 2. {}</p></body>", "x".repeat(600));
        assert_eq!(count(&long, "Item 2"), 0);
    }

    #[test]
    fn test_text_after_a_match_is_not_searched() {
        let html = "<body><div>Item 7. <span>Item 7. continued</span></div></body>";
        let doc = Document::parse(html).unwrap();
        let matches = search_tags(&doc, "Item 7", MAX);
        assert_eq!(matches.len(), 1);
        assert_eq!(doc.element_name(matches[0].node), Some("div"));
    }

    #[test]
    fn test_children_before_matching_text_are_searched() {
        let html = "<body><div><span>Item 7.</span> Item 7. MD&amp;A</div></body>";
        let doc = Document::parse(html).unwrap();
        let matches = search_tags(&doc, "Item 7", MAX);
        let names: Vec<_> = matches.iter().map(|m| doc.element_name(m.node)).collect();
        assert_eq!(names, vec![Some("span"), Some("div")]);
        assert_eq!(matches[0].depth, 2);
        assert_eq!(matches[1].depth, 1);
    }

    #[test]
    fn test_locate_items_covers_every_item() {
        let doc = Document::parse("<body><p>Item 1. Business</p><p>Item 7. MD&amp;A</p></body>")
            .unwrap();
        let located = locate_items(&doc, MAX);
        assert_eq!(located.len(), 7);
        assert_eq!(located[&Item::Item1].len(), 1);
        assert_eq!(located[&Item::Item7].len(), 1);
        assert!(located[&Item::Item1A].is_empty());
    }
}
