//! Admin-side actions.
//!
//! Everything an administrator can change goes through here: the per-FAQ
//! sitemap flag, the site-wide settings, the legacy-data marker and the
//! clean-up of leftover test FAQs. Writes
//! are gated by a [`Capabilities`] implementation supplied by the host; the
//! engine never decides who is allowed to do what.
//!
//! Also home to the read-only helpers shown on admin screens: the editor ID
//! hint, the legacy-data notice, test-post detection, the built-in
//! self-tests and the plugin action links.

use crate::config::SiteSection;
use crate::render::render_faq_page;
use crate::shortcode::SHORTCODE_TAG;
use crate::sitemap::SitemapEligibility;
use crate::store::{
    EntityStore, META_INCLUDE_IN_SITEMAP, MemoryStore, NewFaq, OPTION_GLOBAL_SITEMAP,
    OPTION_LAYOUT_STYLE, OPTION_LEGACY_DATA, StoreError,
};
use crate::types::{Faq, FaqId, FaqStatus, LayoutStyle, YesNo};
use chrono::Utc;
use maud::{Markup, html};
use thiserror::Error;

/// Name of the table older releases stored FAQs in.
pub const LEGACY_TABLE: &str = "HypercartFAQs";

/// Question keywords that mark a FAQ as leftover test content.
pub const TEST_POST_KEYWORDS: &[&str] = &[
    "test",
    "sample",
    "demo",
    "example",
    "dummy",
    "placeholder",
    "lorem ipsum",
];

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Not allowed to {0}")]
    Forbidden(&'static str),
    #[error("Invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Host-side authorization.
pub trait Capabilities {
    /// May edit this FAQ (and therefore its sitemap flag).
    fn can_edit_faq(&self, id: FaqId) -> bool;
    /// May change site-wide settings.
    fn can_manage_options(&self) -> bool;
}

/// Full rights. Used by the CLI, which runs as the site operator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Administrator;

impl Capabilities for Administrator {
    fn can_edit_faq(&self, _id: FaqId) -> bool {
        true
    }

    fn can_manage_options(&self) -> bool {
        true
    }
}

// ============================================================================
// Writes
// ============================================================================

/// Set a FAQ's own sitemap flag. Only `"yes"` and `"no"` are accepted.
pub fn set_sitemap_flag<S: EntityStore + ?Sized>(
    store: &S,
    caps: &dyn Capabilities,
    id: FaqId,
    value: &str,
) -> Result<YesNo, AdminError> {
    if !caps.can_edit_faq(id) {
        return Err(AdminError::Forbidden("edit this FAQ"));
    }
    let flag: YesNo = value.parse().map_err(|_| AdminError::InvalidValue {
        field: META_INCLUDE_IN_SITEMAP,
        value: value.to_string(),
    })?;
    store.set_meta(id, META_INCLUDE_IN_SITEMAP, flag.as_str())?;
    tracing::info!(%id, flag = %flag, "updated sitemap flag");
    Ok(flag)
}

/// Site-wide settings as currently stored, defaults applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub global_sitemap: YesNo,
    pub layout: LayoutStyle,
}

impl Settings {
    pub fn load<S: EntityStore + ?Sized>(store: &S) -> Self {
        Self {
            global_sitemap: YesNo::from_stored(store.option(OPTION_GLOBAL_SITEMAP).as_deref()),
            layout: LayoutStyle::from_stored(store.option(OPTION_LAYOUT_STYLE).as_deref()),
        }
    }
}

/// Raw settings form input. `None` leaves a setting untouched.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub global_sitemap: Option<String>,
    pub layout: Option<String>,
}

/// Apply a settings update. Every value is validated before anything is
/// written, so a rejected update changes nothing.
pub fn update_settings<S: EntityStore + ?Sized>(
    store: &S,
    caps: &dyn Capabilities,
    update: &SettingsUpdate,
) -> Result<Settings, AdminError> {
    if !caps.can_manage_options() {
        return Err(AdminError::Forbidden("manage settings"));
    }

    let global = update
        .global_sitemap
        .as_deref()
        .map(|raw| {
            raw.parse::<YesNo>().map_err(|_| AdminError::InvalidValue {
                field: OPTION_GLOBAL_SITEMAP,
                value: raw.to_string(),
            })
        })
        .transpose()?;
    let layout = update
        .layout
        .as_deref()
        .map(|raw| {
            LayoutStyle::parse(raw).ok_or_else(|| AdminError::InvalidValue {
                field: OPTION_LAYOUT_STYLE,
                value: raw.to_string(),
            })
        })
        .transpose()?;

    if let Some(global) = global {
        store.set_option(OPTION_GLOBAL_SITEMAP, global.as_str());
        tracing::info!(global_sitemap = %global, "updated global sitemap inclusion");
    }
    if let Some(layout) = layout {
        store.set_option(OPTION_LAYOUT_STYLE, layout.as_str());
        tracing::info!(layout = %layout, "updated layout style");
    }
    Ok(Settings::load(store))
}

/// Move confirmed test FAQs to the trash.
///
/// Every id must name a published FAQ that [`is_test_post`] flags and that
/// `caps` may edit. All ids are checked before any status changes, so a
/// rejected batch trashes nothing. Trashed FAQs stay in the store and can
/// be restored by setting their status back.
pub fn trash_test_posts<S: EntityStore + ?Sized>(
    store: &S,
    caps: &dyn Capabilities,
    ids: &[FaqId],
) -> Result<Vec<Faq>, AdminError> {
    let mut batch = Vec::with_capacity(ids.len());
    for &id in ids {
        if !caps.can_edit_faq(id) {
            return Err(AdminError::Forbidden("trash this FAQ"));
        }
        let faq = store.get(id).ok_or(StoreError::UnknownFaq(id))?;
        if !faq.is_published() || !is_test_post(&faq.question) {
            return Err(AdminError::InvalidValue {
                field: "test_post",
                value: id.to_string(),
            });
        }
        if !batch.iter().any(|f: &Faq| f.id == id) {
            batch.push(faq);
        }
    }

    for faq in &mut batch {
        store.set_status(faq.id, FaqStatus::Trashed)?;
        faq.status = FaqStatus::Trashed;
        tracing::info!(id = %faq.id, question = %faq.question, "moved test FAQ to trash");
    }
    Ok(batch)
}

/// Record how many rows the legacy table still holds. Zero clears the marker.
pub fn record_legacy_data<S: EntityStore + ?Sized>(store: &S, count: u64) {
    if count > 0 {
        tracing::warn!(count, table = LEGACY_TABLE, "legacy FAQ records found");
        store.set_option(OPTION_LEGACY_DATA, &count.to_string());
    } else {
        store.delete_option(OPTION_LEGACY_DATA);
    }
}

// ============================================================================
// Read-only helpers
// ============================================================================

/// Admin notice text while legacy rows are recorded.
pub fn legacy_notice<S: EntityStore + ?Sized>(store: &S) -> Option<String> {
    let count = store
        .option(OPTION_LEGACY_DATA)
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|&n| n > 0)?;
    Some(format!(
        "KISS FAQs with Schema: found {count} legacy record(s) in the old {LEGACY_TABLE} table. \
         This plugin no longer uses those records. You may remove or migrate them if you wish."
    ))
}

/// Ready-to-paste shortcode for one FAQ.
pub fn shortcode_for(id: FaqId) -> String {
    format!(r#"[{SHORTCODE_TAG} post="{id}" hidden="true"]"#)
}

/// Box shown under the title in the FAQ editor.
pub fn editor_id_hint(id: FaqId) -> Markup {
    html! {
        div class="kiss-faq-id-hint"
            style="margin: 10px 0; padding: 10px; background: #f1f1f1; border-left: 3px solid #ccc;" {
            strong { "FAQ ID:" } " " (id)
            br;
            small {
                "You can use this ID in a shortcode: "
                code { (shortcode_for(id)) }
            }
        }
    }
}

pub fn is_test_post(question: &str) -> bool {
    let lower = question.to_lowercase();
    TEST_POST_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Published FAQs that look like leftover test content.
pub fn find_test_posts<S: EntityStore + ?Sized>(store: &S) -> Vec<Faq> {
    store
        .published()
        .into_iter()
        .filter(|faq| is_test_post(&faq.question))
        .collect()
}

/// A link shown next to the plugin in the plugin list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionLink {
    pub label: &'static str,
    pub target: &'static str,
}

pub fn action_links() -> Vec<ActionLink> {
    vec![
        ActionLink {
            label: "Settings",
            target: "edit.php?post_type=kiss_faq&page=kiss-faqs-settings",
        },
        ActionLink {
            label: "All FAQs",
            target: "edit.php?post_type=kiss_faq",
        },
    ]
}

// ============================================================================
// Self-tests
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfTestResult {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

impl SelfTestResult {
    fn check(name: &'static str, passed: bool, ok: &str, failed: String) -> Self {
        let detail = if passed { ok.to_string() } else { failed };
        Self {
            name,
            passed,
            detail,
        }
    }

    fn errored(name: &'static str, err: &StoreError) -> Self {
        Self {
            name,
            passed: false,
            detail: format!("Could not set up scratch data: {err}"),
        }
    }
}

/// Exercise the sitemap rules end to end on a scratch store.
///
/// Nothing here touches the site's own data.
pub fn run_self_tests() -> Vec<SelfTestResult> {
    let results = vec![
        test_default_flag_seeding()
            .unwrap_or_else(|e| SelfTestResult::errored("Default sitemap flag", &e)),
        test_global_override()
            .unwrap_or_else(|e| SelfTestResult::errored("Global setting override", &e)),
        test_sitemap_exclusion()
            .unwrap_or_else(|e| SelfTestResult::errored("Sitemap exclusion", &e)),
        test_no_index_generation()
            .unwrap_or_else(|e| SelfTestResult::errored("Noindex tag generation", &e)),
    ];
    for result in &results {
        tracing::debug!(test = result.name, passed = result.passed, "self-test");
    }
    results
}

fn scratch_store() -> Result<(MemoryStore, FaqId, FaqId), StoreError> {
    let store = MemoryStore::new();
    let now = Utc::now();
    let seed = |question: &str| {
        store
            .insert(NewFaq {
                question: question.to_string(),
                answer: "<p>Self-test answer.</p>".to_string(),
                status: FaqStatus::Published,
                created_at: now,
                categories: Vec::new(),
            })
            .map(|faq| faq.id)
    };
    let included = seed("Self-test included FAQ")?;
    let excluded = seed("Self-test excluded FAQ")?;
    Ok((store, included, excluded))
}

fn test_default_flag_seeding() -> Result<SelfTestResult, StoreError> {
    let (store, included, _) = scratch_store()?;
    let flag = store.meta(included, META_INCLUDE_IN_SITEMAP);
    Ok(SelfTestResult::check(
        "Default sitemap flag",
        flag.as_deref() == Some("yes"),
        "New FAQs start included in the sitemap.",
        format!("New FAQ has include_in_sitemap = {flag:?}, expected \"yes\"."),
    ))
}

fn test_global_override() -> Result<SelfTestResult, StoreError> {
    let (store, included, excluded) = scratch_store()?;
    store.set_option(OPTION_GLOBAL_SITEMAP, "no");
    let eligibility = SitemapEligibility::new(&store);
    let kept = eligibility.filter_sitemap_candidates(&[included, excluded]);
    Ok(SelfTestResult::check(
        "Global setting override",
        kept.is_empty() && eligibility.requires_no_index(included),
        "Turning the global switch off excludes every FAQ.",
        format!("{} FAQ(s) still eligible with the global switch off.", kept.len()),
    ))
}

fn test_sitemap_exclusion() -> Result<SelfTestResult, StoreError> {
    let (store, included, excluded) = scratch_store()?;
    store.set_meta(excluded, META_INCLUDE_IN_SITEMAP, "no")?;
    let kept = SitemapEligibility::new(&store).filter_sitemap_candidates(&[included, excluded]);
    Ok(SelfTestResult::check(
        "Sitemap exclusion",
        kept == [included],
        "FAQs set to \"no\" are left out of the sitemap.",
        format!("Eligible ids were {kept:?}, expected [{included}]."),
    ))
}

fn test_no_index_generation() -> Result<SelfTestResult, StoreError> {
    let (store, included, excluded) = scratch_store()?;
    store.set_meta(excluded, META_INCLUDE_IN_SITEMAP, "no")?;
    let site = SiteSection::default();
    let has_robots = |id| {
        render_faq_page(&store, &site, id)
            .map(|page| page.into_string().contains(r#"name="robots""#))
            .unwrap_or(false)
    };
    let (on_excluded, on_included) = (has_robots(excluded), has_robots(included));
    Ok(SelfTestResult::check(
        "Noindex tag generation",
        on_excluded && !on_included,
        "Excluded FAQ pages carry noindex, included ones do not.",
        format!("robots meta on excluded page: {on_excluded}, on included page: {on_included}."),
    ))
}
