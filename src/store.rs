//! FAQ entity store.
//!
//! The engine never owns persistence. Everything it needs from the host is
//! expressed by the [`EntityStore`] trait: FAQ lookups and filtered queries,
//! per-FAQ metadata, and site-wide options. [`MemoryStore`] is the bundled
//! implementation: a set of maps behind one `RwLock`, optionally backed by a
//! JSON snapshot file so the CLI has something to operate on.
//!
//! ## Snapshot format
//!
//! ```json
//! {
//!   "faqs":    [{ "id": 1, "question": "…", "answer": "<p>…</p>",
//!                 "status": "published", "created_at": "2024-01-01T00:00:00Z",
//!                 "categories": ["billing"] }],
//!   "terms":   [{ "slug": "billing", "name": "Billing" }],
//!   "meta":    { "1": { "include_in_sitemap": "no" } },
//!   "options": { "global_sitemap_inclusion": "yes" }
//! }
//! ```
//!
//! ## Queries
//!
//! [`FaqQuery`] mirrors the shortcode filters. Only published FAQs are ever
//! returned, always oldest first. The `category` and `sub-category` clauses
//! are combined with AND; within a clause any listed slug matches, and a
//! slug also matches every descendant term.

use crate::types::{Faq, FaqId, FaqStatus, Term};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

/// Per-FAQ metadata key holding the `"yes"`/`"no"` sitemap flag.
pub const META_INCLUDE_IN_SITEMAP: &str = "include_in_sitemap";
/// Option key for the site-wide sitemap switch.
pub const OPTION_GLOBAL_SITEMAP: &str = "global_sitemap_inclusion";
/// Option key for the default layout style.
pub const OPTION_LAYOUT_STYLE: &str = "layout_style";
/// Option key recording how many legacy-table rows were found.
pub const OPTION_LEGACY_DATA: &str = "legacy_data_exists";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No FAQ with id {0}")]
    UnknownFaq(FaqId),
    #[error("FAQ id space exhausted after {0}")]
    IdsExhausted(FaqId),
    #[error("Invalid snapshot: FAQ {0} {1}")]
    InvalidFaq(FaqId, &'static str),
}

/// Filters applied when selecting a list of FAQs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaqQuery {
    pub category: Vec<String>,
    pub sub_category: Vec<String>,
    pub exclude: Vec<FaqId>,
}

impl FaqQuery {
    /// Whether the caller restricted the selection by taxonomy.
    pub fn has_category_filter(&self) -> bool {
        !self.category.is_empty() || !self.sub_category.is_empty()
    }

    /// Test a FAQ against this query. Status is checked by the caller.
    pub fn matches(&self, faq: &Faq, taxonomy: &Taxonomy) -> bool {
        if self.exclude.contains(&faq.id) {
            return false;
        }
        taxonomy.clause_matches(&self.category, &faq.categories)
            && taxonomy.clause_matches(&self.sub_category, &faq.categories)
    }
}

/// Read-only view over category terms, used to expand hierarchical matches.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    parents: BTreeMap<String, Option<String>>,
}

impl Taxonomy {
    pub fn new(terms: &[Term]) -> Self {
        Self {
            parents: terms
                .iter()
                .map(|t| (t.slug.clone(), t.parent.clone()))
                .collect(),
        }
    }

    /// True when `slug` equals `ancestor` or sits anywhere beneath it.
    pub fn is_within(&self, slug: &str, ancestor: &str) -> bool {
        let mut current = Some(slug.to_string());
        let mut seen = HashSet::new();
        while let Some(s) = current {
            if s == ancestor {
                return true;
            }
            // Guard against malformed parent cycles.
            if !seen.insert(s.clone()) {
                return false;
            }
            current = self.parents.get(&s).cloned().flatten();
        }
        false
    }

    /// An empty clause matches everything.
    fn clause_matches(&self, clause: &[String], tagged: &[String]) -> bool {
        clause.is_empty()
            || clause
                .iter()
                .any(|wanted| tagged.iter().any(|t| self.is_within(t, wanted)))
    }
}

/// Fields supplied when creating a FAQ; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewFaq {
    pub question: String,
    pub answer: String,
    pub status: FaqStatus,
    pub created_at: DateTime<Utc>,
    pub categories: Vec<String>,
}

/// The host's content store as seen by the engine.
///
/// Implementations must tolerate concurrent readers; writes are rare admin
/// actions and need not be linearizable with reads.
pub trait EntityStore: Send + Sync {
    /// Look up a FAQ by id, whatever its status.
    fn get(&self, id: FaqId) -> Option<Faq>;

    /// Published FAQs matching `query`, oldest first.
    fn query(&self, query: &FaqQuery) -> Vec<Faq>;

    /// Every published FAQ, oldest first.
    fn published(&self) -> Vec<Faq> {
        self.query(&FaqQuery::default())
    }

    /// Create a FAQ. New FAQs start with the sitemap flag set to `"yes"`.
    fn insert(&self, faq: NewFaq) -> Result<Faq, StoreError>;

    /// Move a FAQ to another status, e.g. to trash it. Fails for unknown ids.
    fn set_status(&self, id: FaqId, status: FaqStatus) -> Result<(), StoreError>;

    fn meta(&self, id: FaqId, key: &str) -> Option<String>;

    /// Overwrite a metadata value. Fails for unknown ids.
    fn set_meta(&self, id: FaqId, key: &str, value: &str) -> Result<(), StoreError>;

    fn option(&self, key: &str) -> Option<String>;

    fn set_option(&self, key: &str, value: &str);

    fn delete_option(&self, key: &str);
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    faqs: Vec<Faq>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    terms: Vec<Term>,
    #[serde(default)]
    meta: BTreeMap<FaqId, BTreeMap<String, String>>,
    #[serde(default)]
    options: BTreeMap<String, String>,
}

impl Snapshot {
    /// Reject records the data model forbids. Zero ids are already refused
    /// while deserializing.
    fn validate(&self) -> Result<(), StoreError> {
        let mut seen = HashSet::new();
        for faq in &self.faqs {
            if faq.question.trim().is_empty() {
                return Err(StoreError::InvalidFaq(faq.id, "has an empty question"));
            }
            if !seen.insert(faq.id) {
                return Err(StoreError::InvalidFaq(faq.id, "appears more than once"));
            }
        }
        Ok(())
    }
}

/// In-memory [`EntityStore`] with JSON snapshot persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no store snapshot, starting empty");
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        snapshot.validate()?;
        tracing::debug!(
            path = %path.display(),
            faqs = snapshot.faqs.len(),
            "loaded store snapshot"
        );
        Ok(Self {
            inner: RwLock::new(snapshot),
        })
    }

    /// Write the current state as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let json = {
            let snapshot = self.inner.read().unwrap_or_else(PoisonError::into_inner);
            serde_json::to_string_pretty(&*snapshot)?
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)?;
        Ok(())
    }

    /// Add or replace a category term.
    pub fn add_term(&self, term: Term) {
        let mut snapshot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        snapshot.terms.retain(|t| t.slug != term.slug);
        snapshot.terms.push(term);
    }

    pub fn terms(&self) -> Vec<Term> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .terms
            .clone()
    }
}

impl EntityStore for MemoryStore {
    fn get(&self, id: FaqId) -> Option<Faq> {
        let snapshot = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        snapshot.faqs.iter().find(|f| f.id == id).cloned()
    }

    fn query(&self, query: &FaqQuery) -> Vec<Faq> {
        let snapshot = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let taxonomy = Taxonomy::new(&snapshot.terms);
        let mut faqs: Vec<Faq> = snapshot
            .faqs
            .iter()
            .filter(|f| f.is_published() && query.matches(f, &taxonomy))
            .cloned()
            .collect();
        faqs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        faqs
    }

    fn insert(&self, faq: NewFaq) -> Result<Faq, StoreError> {
        let mut snapshot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let id = match snapshot.faqs.iter().map(|f| f.id).max() {
            None => FaqId::FIRST,
            Some(last) => last.next().ok_or(StoreError::IdsExhausted(last))?,
        };
        let faq = Faq {
            id,
            question: faq.question,
            answer: faq.answer,
            status: faq.status,
            created_at: faq.created_at,
            categories: faq.categories,
        };
        snapshot.faqs.push(faq.clone());
        snapshot
            .meta
            .entry(id)
            .or_default()
            .insert(META_INCLUDE_IN_SITEMAP.to_string(), "yes".to_string());
        Ok(faq)
    }

    fn set_status(&self, id: FaqId, status: FaqStatus) -> Result<(), StoreError> {
        let mut snapshot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let faq = snapshot
            .faqs
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(StoreError::UnknownFaq(id))?;
        faq.status = status;
        Ok(())
    }

    fn meta(&self, id: FaqId, key: &str) -> Option<String> {
        let snapshot = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        snapshot.meta.get(&id).and_then(|m| m.get(key)).cloned()
    }

    fn set_meta(&self, id: FaqId, key: &str, value: &str) -> Result<(), StoreError> {
        let mut snapshot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if !snapshot.faqs.iter().any(|f| f.id == id) {
            return Err(StoreError::UnknownFaq(id));
        }
        snapshot
            .meta
            .entry(id)
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn option(&self, key: &str) -> Option<String> {
        let snapshot = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        snapshot.options.get(key).cloned()
    }

    fn set_option(&self, key: &str, value: &str) {
        let mut snapshot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        snapshot.options.insert(key.to_string(), value.to_string());
    }

    fn delete_option(&self, key: &str) {
        let mut snapshot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        snapshot.options.remove(key);
    }
}
