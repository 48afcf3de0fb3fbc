//! Markdown link scanning for providers without structured citations.

use regex::Regex;
use std::sync::OnceLock;

use crate::types::responses::Citation;

fn markdown_link() -> &'static Regex {
    static LINK: OnceLock<Regex> = OnceLock::new();
    LINK.get_or_init(|| {
        Regex::new(r"\[([^\[\]\n]*)\]\(([^()\s]+)\)").expect("markdown link pattern is valid")
    })
}

/// Extracts every `[title](url)` link from `text`, left to right.
///
/// Duplicates are kept: the order and multiplicity are what the model wrote.
pub fn extract_markdown_citations(text: &str) -> Vec<Citation> {
    markdown_link()
        .captures_iter(text)
        .map(|caps| Citation::new(caps[1].trim(), &caps[2]))
        .collect()
}
