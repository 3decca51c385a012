//! Shared test utilities for the kiss-faqs test suite.
//!
//! Provides FAQ builders, a pre-populated categorized store, and bulk
//! extractors that keep assertions short.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let store = categorized_store();
//! let faqs = store.published();
//! assert_eq!(questions(&faqs)[0], "How do I pay?");
//! ```

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::store::{EntityStore, MemoryStore, NewFaq};
use crate::types::{Faq, FaqId, FaqStatus, Term};

// =========================================================================
// Builders
// =========================================================================

/// Fixed reference instant so ordering tests are deterministic.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

/// A published FAQ created `day` days after [`epoch`].
pub fn new_faq(question: &str, answer: &str, day: i64) -> NewFaq {
    NewFaq {
        question: question.to_string(),
        answer: answer.to_string(),
        status: FaqStatus::Published,
        created_at: epoch() + Duration::days(day),
        categories: Vec::new(),
    }
}

/// Same as [`new_faq`] but tagged with the given category slugs.
pub fn new_faq_in(question: &str, answer: &str, day: i64, categories: &[&str]) -> NewFaq {
    NewFaq {
        categories: categories.iter().map(|c| c.to_string()).collect(),
        ..new_faq(question, answer, day)
    }
}

/// A standalone FAQ value (not stored), for resolver and renderer tests.
pub fn faq(id: u64, question: &str, answer: &str) -> Faq {
    Faq {
        id: FaqId::new(id).unwrap(),
        question: question.to_string(),
        answer: answer.to_string(),
        status: FaqStatus::Published,
        created_at: epoch() + Duration::days(id as i64),
        categories: Vec::new(),
    }
}

pub fn term(slug: &str, parent: Option<&str>) -> Term {
    Term {
        slug: slug.to_string(),
        name: slug.to_string(),
        parent: parent.map(str::to_string),
    }
}

pub fn id(raw: u64) -> FaqId {
    FaqId::new(raw).unwrap()
}

// =========================================================================
// Fixture stores
// =========================================================================

/// Store with a small billing/shipping taxonomy:
///
/// ```text
/// billing              "How do I pay?"        (day 1)
/// └── refunds          "Can I get a refund?"  (day 2)
/// shipping             "When will it ship?"   (day 3)
/// (none)               "Who are you?"         (day 4)
/// ```
pub fn categorized_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.add_term(term("billing", None));
    store.add_term(term("refunds", Some("billing")));
    store.add_term(term("shipping", None));
    let faqs = [
        new_faq_in("How do I pay?", "<p>By card.</p>", 1, &["billing"]),
        new_faq_in(
            "Can I get a refund?",
            "<p>Within <b>30</b> days.</p>",
            2,
            &["refunds"],
        ),
        new_faq_in("When will it ship?", "<p>Tomorrow.</p>", 3, &["shipping"]),
        new_faq("Who are you?", "<p>A small shop.</p>", 4),
    ];
    for faq in faqs {
        store.insert(faq).unwrap();
    }
    store
}

// =========================================================================
// Bulk extractors
// =========================================================================

pub fn faq_ids(faqs: &[Faq]) -> Vec<FaqId> {
    faqs.iter().map(|f| f.id).collect()
}

pub fn questions(faqs: &[Faq]) -> Vec<&str> {
    faqs.iter().map(|f| f.question.as_str()).collect()
}
