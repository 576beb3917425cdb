//! Synthetic filings shared by the parsing tests.
//!
//! `tests/filing_tests.rs` carries a copy of these fixtures; keep both in step.

pub const BUSINESS: &str = "We design, manufacture and sell industrial widgets worldwide.";
pub const RISK: &str = "Our operations are subject to numerous risks and uncertainties.";
pub const MDNA: &str = "Revenue increased compared to the prior fiscal year.";

const LOREM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod \
                     tempor incididunt ut labore et dolore magna aliqua. ";

/// Neutral prose of exactly `chars` characters.
pub fn filler(chars: usize) -> String {
    LOREM.chars().cycle().take(chars).collect()
}

pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Item 1, 1A and 7 headings, each followed by its own text and `gap` filler characters.
pub fn sectioned_filing(gap: usize) -> String {
    let gap = filler(gap);
    format!(
        r#"<html><head><title>Annual Report</title></head><body>
<div class="document">
<p>Item 1. Business</p>
<p>{BUSINESS}</p>
<p>{gap}</p>
<p>Item 1A. Risk Factors</p>
<p>{RISK}</p>
<p>{gap}</p>
<p>Item 7. Management's Discussion and Analysis</p>
<p>{MDNA}</p>
<p>{gap}</p>
</div>
</body></html>"#
    )
}

/// [`sectioned_filing`] preceded by a compact table of contents.
pub fn toc_filing(gap: usize) -> String {
    let body = sectioned_filing(gap);
    let toc = r#"<table>
<tr><td>Item 1.</td><td>Business</td><td>3</td></tr>
<tr><td>Item 1A.</td><td>Risk Factors</td><td>12</td></tr>
<tr><td>Item 7.</td><td>Management's Discussion and Analysis</td><td>40</td></tr>
</table>
"#;
    body.replacen("<body>\n", &format!("<body>\n{}", toc), 1)
}
