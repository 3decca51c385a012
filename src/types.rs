//! Shared types used across the store, resolvers and renderers.
//!
//! `Faq` and `Term` are serialized into the store snapshot, so field names
//! here are part of the on-disk format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Store-assigned FAQ identifier. Always positive, also when read back
/// from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u64", try_from = "u64")]
pub struct FaqId(u64);

impl FaqId {
    pub const FIRST: FaqId = FaqId(1);

    /// Returns `None` for zero, which is never a valid id.
    pub fn new(raw: u64) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// The id following this one, as assigned by stores on insertion.
    /// `None` once the id space is used up.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl From<FaqId> for u64 {
    fn from(id: FaqId) -> u64 {
        id.0
    }
}

impl TryFrom<u64> for FaqId {
    type Error = String;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or_else(|| "FAQ id must be positive, got 0".to_string())
    }
}

impl fmt::Display for FaqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Publication state of a FAQ. Only `Published` entries are selectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaqStatus {
    #[default]
    Draft,
    #[serde(alias = "publish")]
    Published,
    Private,
    #[serde(alias = "trash")]
    Trashed,
}

/// A single question/answer record.
///
/// The question doubles as the title; the answer is an HTML fragment that is
/// rendered as-is in markup and tag-stripped for structured data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faq {
    pub id: FaqId,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub status: FaqStatus,
    pub created_at: DateTime<Utc>,
    /// Category term slugs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

impl Faq {
    pub fn is_published(&self) -> bool {
        self.status == FaqStatus::Published
    }
}

/// A category term in the FAQ taxonomy. Terms form a forest via `parent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub slug: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// A stored `"yes"`/`"no"` switch.
///
/// Reads are lenient: anything other than `"no"` (case-insensitive) counts
/// as `Yes`, and a missing value is `Yes`. Writes go through [`FromStr`],
/// which only accepts the two literal values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YesNo {
    #[default]
    Yes,
    No,
}

impl YesNo {
    /// Interpret a stored value, applying the `"yes"` default.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("no") => YesNo::No,
            _ => YesNo::Yes,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            YesNo::Yes => "yes",
            YesNo::No => "no",
        }
    }

    pub fn is_no(self) -> bool {
        self == YesNo::No
    }
}

impl FromStr for YesNo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" => Ok(YesNo::Yes),
            "no" => Ok(YesNo::No),
            other => Err(format!("expected \"yes\" or \"no\", got {other:?}")),
        }
    }
}

impl fmt::Display for YesNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Markup flavour used when rendering FAQs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutStyle {
    #[default]
    Default,
    SleuthAi,
}

impl LayoutStyle {
    /// Parse a layout name, returning `None` for anything unrecognised.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "default" => Some(LayoutStyle::Default),
            "sleuth-ai" => Some(LayoutStyle::SleuthAi),
            _ => None,
        }
    }

    /// Interpret a stored option, falling back to `Default`.
    pub fn from_stored(value: Option<&str>) -> Self {
        value.and_then(Self::parse).unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LayoutStyle::Default => "default",
            LayoutStyle::SleuthAi => "sleuth-ai",
        }
    }
}

impl fmt::Display for LayoutStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faq_id_rejects_zero() {
        assert!(FaqId::new(0).is_none());
        assert_eq!(FaqId::new(7).unwrap().get(), 7);
    }

    #[test]
    fn faq_id_next_stops_at_the_top() {
        assert_eq!(FaqId::FIRST.next(), FaqId::new(2));
        assert_eq!(FaqId::new(u64::MAX).unwrap().next(), None);
    }

    #[test]
    fn faq_id_deserialize_rejects_zero() {
        assert!(serde_json::from_str::<FaqId>("0").is_err());
        let id: FaqId = serde_json::from_str("12").unwrap();
        assert_eq!(id.get(), 12);
        assert_eq!(serde_json::to_string(&id).unwrap(), "12");
    }

    #[test]
    fn yes_no_defaults_to_yes() {
        assert_eq!(YesNo::from_stored(None), YesNo::Yes);
        assert_eq!(YesNo::from_stored(Some("")), YesNo::Yes);
        assert_eq!(YesNo::from_stored(Some("garbage")), YesNo::Yes);
    }

    #[test]
    fn yes_no_reads_no_case_insensitively() {
        assert_eq!(YesNo::from_stored(Some("no")), YesNo::No);
        assert_eq!(YesNo::from_stored(Some("NO")), YesNo::No);
        assert_eq!(YesNo::from_stored(Some(" No ")), YesNo::No);
    }

    #[test]
    fn yes_no_strict_parse() {
        assert_eq!("yes".parse::<YesNo>(), Ok(YesNo::Yes));
        assert_eq!("No".parse::<YesNo>(), Ok(YesNo::No));
        assert!("maybe".parse::<YesNo>().is_err());
    }

    #[test]
    fn layout_parse() {
        assert_eq!(LayoutStyle::parse("sleuth-ai"), Some(LayoutStyle::SleuthAi));
        assert_eq!(LayoutStyle::parse("DEFAULT"), Some(LayoutStyle::Default));
        assert_eq!(LayoutStyle::parse("grid"), None);
        assert_eq!(LayoutStyle::from_stored(Some("grid")), LayoutStyle::Default);
        assert_eq!(LayoutStyle::from_stored(None), LayoutStyle::Default);
    }

    #[test]
    fn status_accepts_wordpress_aliases() {
        let s: FaqStatus = serde_json::from_str("\"publish\"").unwrap();
        assert_eq!(s, FaqStatus::Published);
        let s: FaqStatus = serde_json::from_str("\"trash\"").unwrap();
        assert_eq!(s, FaqStatus::Trashed);
        assert_eq!(serde_json::to_string(&FaqStatus::Published).unwrap(), "\"published\"");
    }
}
