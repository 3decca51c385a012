//! Shortcode parsing.
//!
//! FAQs are embedded in content with a bracketed shortcode:
//!
//! ```text
//! [KISSFAQ post="12" hidden="false"]            single FAQ by id
//! [KISSFAQ category="billing,shipping"]         list, filtered by category
//! [KISSFAQ category="billing" sub-category="refunds" exclude="4,7"]
//! [KISSFAQ layout="sleuth-ai"]                  every FAQ, alternate layout
//! [HTPFAQ post="12"]                            legacy tag, same behaviour
//! ```
//!
//! Values may be double-quoted, single-quoted or bare. Attribute names are
//! case-insensitive and unknown attributes are ignored, like the host
//! shortcode API does. A missing `post` attribute selects a list.

use crate::render::RenderError;
use crate::store::FaqQuery;
use crate::types::{FaqId, LayoutStyle};
use crate::visibility::HiddenParam;
use thiserror::Error;

/// Primary shortcode tag.
pub const SHORTCODE_TAG: &str = "KISSFAQ";
/// Tag used by earlier releases, still honoured.
pub const LEGACY_SHORTCODE_TAG: &str = "HTPFAQ";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ShortcodeError {
    #[error("not a shortcode: {0:?}")]
    NotAShortcode(String),
    #[error("unknown shortcode tag: {0}")]
    UnknownTag(String),
    #[error("unterminated quoted value for attribute {0:?}")]
    Unterminated(String),
}

/// Typed shortcode attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShortcodeAtts {
    /// Raw `post` value, kept unparsed so invalid ids can be reported.
    pub post: Option<String>,
    pub hidden: Option<String>,
    pub category: Vec<String>,
    pub sub_category: Vec<String>,
    pub exclude: Vec<FaqId>,
    pub layout: Option<String>,
}

/// What a shortcode asks to render.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Single(FaqId),
    List(FaqQuery),
}

impl ShortcodeAtts {
    /// Build from `(name, value)` pairs as handed over by a host.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut atts = Self::default();
        for (name, value) in pairs {
            match name.to_ascii_lowercase().as_str() {
                "post" => atts.post = Some(value.to_string()),
                "hidden" => atts.hidden = Some(value.to_string()),
                "category" => atts.category = split_list(value),
                "sub-category" | "sub_category" => atts.sub_category = split_list(value),
                "exclude" => {
                    atts.exclude = split_list(value)
                        .iter()
                        .filter_map(|v| v.parse::<u64>().ok())
                        .filter_map(FaqId::new)
                        .collect()
                }
                "layout" => atts.layout = Some(value.to_string()),
                other => tracing::debug!(attribute = other, "ignoring unknown shortcode attribute"),
            }
        }
        atts
    }

    pub fn hidden(&self) -> HiddenParam {
        HiddenParam::from_attr(self.hidden.as_deref())
    }

    /// Per-invocation layout override. Unrecognised values are ignored.
    pub fn layout_override(&self) -> Option<LayoutStyle> {
        self.layout.as_deref().and_then(LayoutStyle::parse)
    }

    /// Decide between a single FAQ and a filtered list.
    ///
    /// A `post` attribute that does not yield a positive id is an
    /// [`RenderError::InvalidSelector`], never a silent fallback to a list.
    pub fn selection(&self) -> Result<Selection, RenderError> {
        match self.post.as_deref() {
            Some(raw) if !raw.trim().is_empty() => absint(raw)
                .and_then(FaqId::new)
                .map(Selection::Single)
                .ok_or(RenderError::InvalidSelector),
            Some(_) => Err(RenderError::InvalidSelector),
            None => Ok(Selection::List(FaqQuery {
                category: self.category.clone(),
                sub_category: self.sub_category.clone(),
                exclude: self.exclude.clone(),
            })),
        }
    }
}

/// Parse a shortcode such as `[KISSFAQ post="3" hidden="false"]`.
pub fn parse_shortcode(text: &str) -> Result<ShortcodeAtts, ShortcodeError> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| ShortcodeError::NotAShortcode(trimmed.to_string()))?;
    let inner = inner.trim_end().trim_end_matches('/');

    let (tag, rest) = match inner.find(char::is_whitespace) {
        Some(pos) => (&inner[..pos], &inner[pos..]),
        None => (inner, ""),
    };
    if tag != SHORTCODE_TAG && tag != LEGACY_SHORTCODE_TAG {
        return Err(ShortcodeError::UnknownTag(tag.to_string()));
    }

    let pairs = parse_attributes(rest)?;
    Ok(ShortcodeAtts::from_pairs(
        pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
    ))
}

fn parse_attributes(input: &str) -> Result<Vec<(String, String)>, ShortcodeError> {
    let mut pairs = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        // Name (or a positional value, which is skipped).
        let mut end = start;
        while let Some(&(i, c)) = chars.peek() {
            if c.is_whitespace() || c == '=' {
                break;
            }
            end = i + c.len_utf8();
            chars.next();
        }
        let name = input[start..end].to_string();

        if chars.peek().map(|&(_, c)| c) != Some('=') {
            continue;
        }
        chars.next();

        let value = match chars.peek().map(|&(_, c)| c) {
            Some(quote @ ('"' | '\'')) => {
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == quote {
                        closed = true;
                        break;
                    }
                    value.push(c);
                }
                if !closed {
                    return Err(ShortcodeError::Unterminated(name));
                }
                value
            }
            _ => {
                let mut value = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_whitespace() {
                        break;
                    }
                    value.push(c);
                    chars.next();
                }
                value
            }
        };
        pairs.push((name, value));
    }

    Ok(pairs)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Integer reading that tolerates signs and trailing junk: `"-12abc"` is 12.
fn absint(raw: &str) -> Option<u64> {
    let s = raw.trim();
    let s = s.strip_prefix(['-', '+']).unwrap_or(s);
    let digits: String = s.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}
