use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use strum::{EnumIter, IntoEnumIterator};

use super::document::NodeId;
use super::error::ExtractError;

/// A standardized section of a 10-K/10-Q filing that the extractor knows how to locate.
///
/// Variants are declared in document order; `Ord` follows that order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum Item {
    Item1,
    Item1A,
    Item1B,
    Item2,
    Item7,
    Item7A,
    Item8,
}

/// Every known item with its heading label, in document order.
pub const ITEMS: &[(Item, &str)] = &[
    (Item::Item1, "Item 1"),
    (Item::Item1A, "Item 1A"),
    (Item::Item1B, "Item 1B"),
    (Item::Item2, "Item 2"),
    (Item::Item7, "Item 7"),
    (Item::Item7A, "Item 7A"),
    (Item::Item8, "Item 8"),
];

/// Items returned to callers when nothing else is requested.
pub const DEFAULT_OUTPUT_ITEMS: &[Item] = &[Item::Item1, Item::Item1A, Item::Item7];

impl Item {
    pub fn key(&self) -> &'static str {
        match self {
            Item::Item1 => "item1",
            Item::Item1A => "item1a",
            Item::Item1B => "item1b",
            Item::Item2 => "item2",
            Item::Item7 => "item7",
            Item::Item7A => "item7a",
            Item::Item8 => "item8",
        }
    }

    /// Heading label used for text matching, e.g. `"Item 1A"`.
    pub fn label(&self) -> &'static str {
        ITEMS
            .iter()
            .find(|(item, _)| item == self)
            .map(|(_, label)| *label)
            .unwrap_or_default()
    }

    pub fn part(&self) -> Part {
        match self {
            Item::Item1 | Item::Item1A | Item::Item1B => Part::Part1_1,
            Item::Item2 => Part::Part1_2,
            Item::Item7 | Item::Item7A | Item::Item8 => Part::Part2_2,
        }
    }

    /// The item that follows this one in document order.
    pub fn next(&self) -> Option<Item> {
        Item::iter().skip_while(|item| item != self).nth(1)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Item {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Item::iter()
            .find(|item| item.key() == key)
            .ok_or_else(|| ExtractError::InvalidItem(s.to_string()))
    }
}

/// Fixed grouping of adjacent items. The combination search runs once per part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter)]
pub enum Part {
    Part1_1,
    Part1_2,
    Part2_2,
}

// Each part holds as few items as possible; adjacent items inside a part are
// expected to share a container in the document body.
pub const PARTS: &[(Part, &[Item])] = &[
    (Part::Part1_1, &[Item::Item1, Item::Item1A, Item::Item1B]),
    (Part::Part1_2, &[Item::Item2]),
    (Part::Part2_2, &[Item::Item7, Item::Item7A, Item::Item8]),
];

impl Part {
    pub fn key(&self) -> &'static str {
        match self {
            Part::Part1_1 => "part1.1",
            Part::Part1_2 => "part1.2",
            Part::Part2_2 => "part2.2",
        }
    }

    pub fn items(&self) -> &'static [Item] {
        PARTS
            .iter()
            .find(|(part, _)| part == self)
            .map(|(_, items)| *items)
            .unwrap_or_default()
    }

    pub fn next(&self) -> Option<Part> {
        Part::iter().skip_while(|part| part != self).nth(1)
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Terminators that reliably mark a heading; checked before the plain space.
pub const SYMBOL_TERMINATORS: &[&str] = &[".", " .", " :", ":", "-", " -", "—", " —", "\t"];
pub const NON_SYMBOL_TERMINATORS: &[&str] = &[" "];

/// A candidate heading node for one item.
///
/// `depth` counts ancestor hops from `<body>`; a direct child of `<body>` has depth 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagMatch {
    pub node: NodeId,
    pub depth: usize,
}

/// Candidate headings per item, in document order.
pub type ItemMatches = BTreeMap<Item, Vec<TagMatch>>;

/// One chosen heading per item.
pub type Combination = BTreeMap<Item, TagMatch>;

/// Final mapping of item identifier to extracted text. Items that were not
/// located are absent.
pub type ExtractedItems = BTreeMap<Item, String>;

/// Where repeated item headings were judged to cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TocPosition {
    Beginning,
    End,
}
