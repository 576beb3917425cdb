use html_escape::{encode_double_quoted_attribute, encode_text};
use scraper::Html;
use std::fmt;

use super::error::{ExtractError, Result};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Index of a node in a [`Document`]. Indices follow document (pre-)order,
/// so comparing two ids compares their position in the filing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Root,
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeEntry {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    // Last id inside this node's subtree; descendants are exactly `id+1..=subtree_end`.
    subtree_end: NodeId,
    depth: usize,
    data: NodeData,
}

/// Read-only arena of the parsed filing.
///
/// Comments, doctypes and processing instructions are dropped while building
/// the arena; everything else keeps its position and owned text.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeEntry>,
    body: NodeId,
}

impl Document {
    pub fn parse(raw_html: &str) -> Result<Self> {
        let parsed = Html::parse_document(raw_html);
        let mut nodes: Vec<NodeEntry> = Vec::new();
        let mut stack = vec![(parsed.tree.root(), None::<NodeId>)];

        while let Some((node_ref, parent)) = stack.pop() {
            let data = match node_ref.value() {
                scraper::Node::Document | scraper::Node::Fragment => NodeData::Root,
                scraper::Node::Element(element) => NodeData::Element {
                    name: element.name().to_string(),
                    attrs: element
                        .attrs()
                        .map(|(key, value)| (key.to_string(), value.to_string()))
                        .collect(),
                },
                scraper::Node::Text(text) => NodeData::Text(String::from(&**text)),
                _ => continue,
            };

            let id = NodeId(nodes.len());
            let depth = match parent {
                Some(parent) => {
                    nodes[parent.0].children.push(id);
                    nodes[parent.0].depth + 1
                }
                None => 0,
            };
            nodes.push(NodeEntry {
                parent,
                children: Vec::new(),
                subtree_end: id,
                depth,
                data,
            });

            stack.extend(node_ref.children().rev().map(|child| (child, Some(id))));
        }

        for index in (0..nodes.len()).rev() {
            if let Some(&last) = nodes[index].children.last() {
                nodes[index].subtree_end = nodes[last.0].subtree_end;
            }
        }

        let body = nodes
            .iter()
            .position(|entry| matches!(&entry.data, NodeData::Element { name, .. } if name == "body"))
            .map(NodeId)
            .ok_or(ExtractError::MissingBody)?;

        log::debug!("Parsed document into {} nodes, body at {}", nodes.len(), body);

        Ok(Self { nodes, body })
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    /// Siblings after `id` under the same parent, in document order.
    pub fn following_siblings(&self, id: NodeId) -> &[NodeId] {
        let Some(parent) = self.parent(id) else {
            return &[];
        };
        let siblings = self.children(parent);
        match siblings.binary_search(&id) {
            Ok(position) => &siblings[position + 1..],
            Err(_) => &[],
        }
    }

    /// All descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> {
        (id.0 + 1..=self.subtree_end(id).0).map(NodeId)
    }

    pub fn subtree_end(&self, id: NodeId) -> NodeId {
        self.nodes[id.0].subtree_end
    }

    /// True when `node` lies inside `ancestor`'s subtree (or is `ancestor`).
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor <= node && node <= self.subtree_end(ancestor)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].data, NodeData::Element { .. })
    }

    /// Ancestor hops from `<body>`, or `None` for nodes outside the body.
    pub fn depth_from_body(&self, id: NodeId) -> Option<usize> {
        if self.contains(self.body, id) {
            Some(self.nodes[id.0].depth - self.nodes[self.body.0].depth)
        } else {
            None
        }
    }

    /// Lowest node whose subtree holds both `a` and `b` (either may be returned itself).
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> NodeId {
        let (mut a, mut b) = (a, b);
        while self.nodes[a.0].depth > self.nodes[b.0].depth {
            a = self.nodes[a.0].parent.unwrap_or(a);
        }
        while self.nodes[b.0].depth > self.nodes[a.0].depth {
            b = self.nodes[b.0].parent.unwrap_or(b);
        }
        while a != b {
            match (self.nodes[a.0].parent, self.nodes[b.0].parent) {
                (Some(pa), Some(pb)) => {
                    a = pa;
                    b = pb;
                }
                _ => break,
            }
        }
        a
    }

    /// Serialized HTML of `id` and its subtree.
    pub fn outer_html(&self, id: NodeId) -> String {
        enum Step {
            Open(NodeId),
            Close(NodeId),
        }

        let mut out = String::new();
        let mut steps = vec![Step::Open(id)];
        while let Some(step) = steps.pop() {
            match step {
                Step::Open(current) => match &self.nodes[current.0].data {
                    NodeData::Text(text) => {
                        let raw_parent = self
                            .parent(current)
                            .and_then(|parent| self.element_name(parent))
                            .is_some_and(|name| RAW_TEXT_ELEMENTS.contains(&name));
                        if raw_parent {
                            out.push_str(text);
                        } else {
                            out.push_str(&encode_text(text));
                        }
                    }
                    NodeData::Element { name, attrs } => {
                        out.push('<');
                        out.push_str(name);
                        for (key, value) in attrs {
                            out.push(' ');
                            out.push_str(key);
                            out.push_str("=\"");
                            out.push_str(&encode_double_quoted_attribute(value));
                            out.push('"');
                        }
                        out.push('>');
                        if !VOID_ELEMENTS.contains(&name.as_str()) {
                            steps.push(Step::Close(current));
                            steps.extend(self.children(current).iter().rev().map(|c| Step::Open(*c)));
                        }
                    }
                    NodeData::Root => {
                        steps.extend(self.children(current).iter().rev().map(|c| Step::Open(*c)));
                    }
                },
                Step::Close(current) => {
                    if let Some(name) = self.element_name(current) {
                        out.push_str("</");
                        out.push_str(name);
                        out.push('>');
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find_element(doc: &Document, name: &str) -> NodeId {
        doc.descendants(doc.root())
            .find(|id| doc.element_name(*id) == Some(name))
            .unwrap_or_else(|| panic!("no <{}> in document", name))
    }

    #[test]
    fn test_arena_follows_document_order() {
        let doc = Document::parse(
            "<html><body><div id=\"a\"><p>one</p><p>two</p></div><span>three</span></body></html>",
        )
        .unwrap();

        let div = find_element(&doc, "div");
        let span = find_element(&doc, "span");
        assert!(div < span);
        assert_eq!(doc.depth_from_body(doc.body()), Some(0));
        assert_eq!(doc.depth_from_body(div), Some(1));

        let texts: Vec<&str> = doc
            .descendants(doc.body())
            .filter_map(|id| doc.text(id))
            .collect();
        assert_eq!(texts, vec!["one", "two", "three"]);

        assert_eq!(doc.following_siblings(div), &[span]);
        assert!(doc.following_siblings(span).is_empty());
        assert!(doc.contains(div, doc.children(div)[1]));
        assert!(!doc.contains(div, span));
        assert_eq!(doc.ancestors(div).next(), Some(doc.body()));
    }

    #[test]
    fn test_common_ancestor() {
        let doc = Document::parse(
            "<body><div><p><b>x</b></p><p>y</p></div><div>z</div></body>",
        )
        .unwrap();
        let bold = find_element(&doc, "b");
        let paragraphs: Vec<NodeId> = doc
            .descendants(doc.root())
            .filter(|id| doc.element_name(*id) == Some("p"))
            .collect();
        let div = find_element(&doc, "div");

        assert_eq!(doc.common_ancestor(bold, paragraphs[1]), div);
        assert_eq!(doc.common_ancestor(bold, paragraphs[0]), paragraphs[0]);
        assert_eq!(doc.common_ancestor(bold, bold), bold);
    }

    #[test]
    fn test_outer_html_escapes_text_and_attributes() {
        let doc = Document::parse(
            r#"<body><p class="a&quot;b">R&amp;D <br>costs &lt; 5%</p><script>if (a < b) {}</script></body>"#,
        )
        .unwrap();
        let p = find_element(&doc, "p");
        assert_eq!(
            doc.outer_html(p),
            r#"<p class="a&quot;b">R&amp;D <br>costs &lt; 5%</p>"#
        );
        let script = find_element(&doc, "script");
        assert_eq!(doc.outer_html(script), "<script>if (a < b) {}</script>");
    }

    #[test]
    fn test_comments_are_dropped() {
        let doc = Document::parse("<body><!-- Item 1. hidden --><p>shown</p></body>").unwrap();
        let texts: Vec<&str> = doc
            .descendants(doc.body())
            .filter_map(|id| doc.text(id))
            .collect();
        assert_eq!(texts, vec!["shown"]);
    }
}
