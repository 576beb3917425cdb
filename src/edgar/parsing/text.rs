use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static SCRIPT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>").unwrap());
static STYLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<style\b.*?</style\s*>").unwrap());
static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static LINE_BREAK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|tr|li|h[1-6]|table|section|blockquote)\s*>").unwrap()
});
static CELL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</t[dh]\s*>").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());

/// Reduces an HTML fragment to its visible text.
///
/// Block boundaries become line breaks and table cells are separated by a
/// space. Runs of whitespace collapse and blank lines are dropped.
pub fn html_to_text(html: &str) -> String {
    // Step 1: Drop invisible content
    let text = SCRIPT_RE.replace_all(html, "");
    let text = STYLE_RE.replace_all(&text, "");
    let text = COMMENT_RE.replace_all(&text, "");

    // Step 2: Preserve block structure
    let text = LINE_BREAK_RE.replace_all(&text, "\n");
    let text = CELL_RE.replace_all(&text, " ");

    // Step 3: Strip remaining tags, then decode entities so that `&lt;` survives as text
    let text = TAG_RE.replace_all(&text, "");
    let text = decode_html_entities(&text);

    // Step 4: Normalize Unicode (turns non-breaking spaces into plain spaces)
    let text: String = text.nfkc().collect();

    // Step 5: Clean up whitespace
    let text = SPACE_RE.replace_all(&text, " ");
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
