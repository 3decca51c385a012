//! FAQPage structured data.
//!
//! Every FAQ rendered during a request is recorded in a [`SchemaAggregator`].
//! When the request finishes, the aggregator produces one schema.org
//! `FAQPage` document covering all of them, in render order:
//!
//! ```json
//! {
//!   "@context": "https://schema.org",
//!   "@type": "FAQPage",
//!   "mainEntity": [
//!     { "@type": "Question", "name": "Q1",
//!       "acceptedAnswer": { "@type": "Answer", "text": "A1" } }
//!   ]
//! }
//! ```
//!
//! An aggregator belongs to exactly one request. It is an ordinary owned
//! value (normally inside a [`RenderContext`](crate::render::RenderContext)),
//! so concurrent requests can never see each other's entries.
//!
//! Answers are stored as plain text: structured data must not carry markup,
//! while the visible page keeps the HTML.

use maud::{Markup, PreEscaped, html};
use serde::Serialize;

const SCHEMA_CONTEXT: &str = "https://schema.org";

/// One question/answer pair as it will appear in `mainEntity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaEntry {
    pub name: String,
    pub answer_text: String,
}

/// Request-scoped accumulator of rendered FAQs.
#[derive(Debug, Clone, Default)]
pub struct SchemaAggregator {
    entries: Vec<SchemaEntry>,
}

impl SchemaAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything collected so far.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Record a rendered FAQ. The answer is stored tag-stripped.
    pub fn add(&mut self, question: &str, answer_html: &str) {
        self.entries.push(SchemaEntry {
            name: question.to_string(),
            answer_text: strip_all_tags(answer_html),
        });
    }

    pub fn has_entries(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    /// Build the `FAQPage` document from the collected entries.
    ///
    /// Callers check [`has_entries`](Self::has_entries) first; an empty
    /// document is never meant to reach a page.
    pub fn emit(&self) -> FaqPageDocument {
        FaqPageDocument {
            context: SCHEMA_CONTEXT,
            kind: "FAQPage",
            main_entity: self
                .entries
                .iter()
                .map(|e| Question {
                    kind: "Question",
                    name: e.name.clone(),
                    accepted_answer: Answer {
                        kind: "Answer",
                        text: e.answer_text.clone(),
                    },
                })
                .collect(),
        }
    }

    /// The `<script type="application/ld+json">` element, or `None` when
    /// nothing was rendered.
    pub fn script_tag(&self) -> Result<Option<Markup>, serde_json::Error> {
        if !self.has_entries() {
            return Ok(None);
        }
        let json = self.emit().to_json()?;
        // `<` can only occur inside JSON strings, where the escape is equivalent.
        let safe = json.replace('<', "\\u003c");
        Ok(Some(html! {
            script type="application/ld+json" { (PreEscaped(safe)) }
        }))
    }
}

/// A schema.org `FAQPage`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaqPageDocument {
    #[serde(rename = "@context")]
    context: &'static str,
    #[serde(rename = "@type")]
    kind: &'static str,
    #[serde(rename = "mainEntity")]
    pub main_entity: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    #[serde(rename = "@type")]
    kind: &'static str,
    pub name: String,
    #[serde(rename = "acceptedAnswer")]
    pub accepted_answer: Answer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    #[serde(rename = "@type")]
    kind: &'static str,
    pub text: String,
}

impl FaqPageDocument {
    /// Compact UTF-8 JSON. Slashes and non-ASCII text are left unescaped.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Reduce an HTML fragment to plain text.
///
/// `<script>` and `<style>` elements are dropped with their contents, other
/// tags are removed, common entities are decoded, and whitespace runs are
/// collapsed to single spaces. A `<` that cannot open a tag (`5 < 10`) is
/// kept as text.
pub fn strip_all_tags(html: &str) -> String {
    let without_blocks = remove_elements(html, &["script", "style"]);

    let mut text = String::with_capacity(without_blocks.len());
    let mut in_tag = false;
    let mut chars = without_blocks.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '<' if !in_tag && chars.peek().is_some_and(|&n| opens_tag(n)) => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    let decoded = decode_entities(&text);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether the character after a `<` starts a tag, closing tag, comment or
/// processing instruction.
fn opens_tag(next: char) -> bool {
    next.is_ascii_alphabetic() || matches!(next, '/' | '!' | '?')
}

/// Find `prefix` (e.g. `<script`) at or after `from`, but only where the tag
/// name ends right after it, so `<scripts>` is not a `<script`.
fn find_tag(lower: &str, from: usize, prefix: &str) -> Option<usize> {
    let mut pos = from;
    while let Some(offset) = lower[pos..].find(prefix) {
        let start = pos + offset;
        let end = start + prefix.len();
        match lower.as_bytes().get(end) {
            None | Some(b'>' | b'/') => return Some(start),
            Some(b) if b.is_ascii_whitespace() => return Some(start),
            _ => pos = end,
        }
    }
    None
}

/// Remove whole elements (open tag, contents, close tag) by name.
fn remove_elements(html: &str, names: &[&str]) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `html`.
    let lower = html.to_ascii_lowercase();
    let mut out = String::with_capacity(html.len());
    let mut pos = 0;

    loop {
        let next = names
            .iter()
            .filter_map(|name| {
                find_tag(&lower, pos, &format!("<{name}")).map(|start| (start, *name))
            })
            .min_by_key(|(start, _)| *start);

        let Some((start, name)) = next else {
            out.push_str(&html[pos..]);
            break;
        };
        out.push_str(&html[pos..start]);

        let close = format!("</{name}");
        pos = match find_tag(&lower, start, &close) {
            Some(close_start) => {
                lower[close_start..]
                    .find('>')
                    .map_or(html.len(), |gt| close_start + gt + 1)
            }
            // Unclosed element swallows the rest of the fragment.
            None => html.len(),
        };
    }

    out
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
