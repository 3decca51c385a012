//! Sitemap eligibility and sitemap generation.
//!
//! Two switches decide whether a FAQ may be indexed:
//!
//! - the site-wide `global_sitemap_inclusion` option, and
//! - the per-FAQ `include_in_sitemap` metadata flag.
//!
//! Both default to `"yes"`. The global switch wins: when it is `"no"` every
//! FAQ is excluded and every FAQ page carries a robots no-index tag, whatever
//! its own flag says. Otherwise a FAQ is excluded exactly when its own flag
//! is `"no"`.
//!
//! Exclusion and no-index always agree; both are answered by
//! [`SitemapEligibility::should_exclude`].
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/kiss-faq/3/</loc>
//!     <lastmod>2024-01-04</lastmod>
//!   </url>
//! </urlset>
//! ```

use crate::config::SiteSection;
use crate::store::{EntityStore, META_INCLUDE_IN_SITEMAP, OPTION_GLOBAL_SITEMAP};
use crate::types::{FaqId, YesNo};
use maud::{Markup, html};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Robots directive emitted on excluded FAQ pages.
pub const NO_INDEX_CONTENT: &str = "noindex, nofollow";

/// The exclusion rule on its own, independent of any store.
pub fn is_excluded(global: YesNo, individual: YesNo) -> bool {
    global.is_no() || individual.is_no()
}

/// Eligibility decisions against a store, with the global switch read once.
pub struct SitemapEligibility<'a, S: EntityStore + ?Sized> {
    store: &'a S,
    global: YesNo,
}

impl<'a, S: EntityStore + ?Sized> SitemapEligibility<'a, S> {
    pub fn new(store: &'a S) -> Self {
        let global = YesNo::from_stored(store.option(OPTION_GLOBAL_SITEMAP).as_deref());
        Self { store, global }
    }

    pub fn global_switch(&self) -> YesNo {
        self.global
    }

    /// The FAQ's own flag. Unknown ids have no metadata and read as `Yes`.
    pub fn individual_flag(&self, id: FaqId) -> YesNo {
        YesNo::from_stored(self.store.meta(id, META_INCLUDE_IN_SITEMAP).as_deref())
    }

    pub fn should_exclude(&self, id: FaqId) -> bool {
        // Checked first so the global override never touches metadata.
        if self.global.is_no() {
            return true;
        }
        is_excluded(self.global, self.individual_flag(id))
    }

    /// Keep the candidates that belong in the sitemap, in input order.
    ///
    /// With the global switch off the result is empty without looking at
    /// any individual flag.
    pub fn filter_sitemap_candidates(&self, candidates: &[FaqId]) -> Vec<FaqId> {
        if self.global.is_no() {
            tracing::debug!(
                candidates = candidates.len(),
                "global sitemap inclusion is off, excluding all FAQs"
            );
            return Vec::new();
        }
        let included: Vec<FaqId> = candidates
            .iter()
            .copied()
            .filter(|id| !self.should_exclude(*id))
            .collect();
        tracing::debug!(
            candidates = candidates.len(),
            included = included.len(),
            "filtered sitemap candidates"
        );
        included
    }

    pub fn requires_no_index(&self, id: FaqId) -> bool {
        self.should_exclude(id)
    }
}

/// `<meta name="robots" content="noindex, nofollow">`
pub fn robots_meta() -> Markup {
    html! {
        meta name="robots" content=(NO_INDEX_CONTENT);
    }
}

/// Public URL of a single FAQ page.
pub fn faq_url(site: &SiteSection, id: FaqId) -> String {
    format!(
        "{}/{}/{}/",
        site.base_url.trim_end_matches('/'),
        site.faq_slug.trim_matches('/'),
        id
    )
}

/// Single URL entry in the sitemap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    /// Full URL location
    pub loc: String,
    /// Last modification date (YYYY-MM-DD)
    pub lastmod: Option<String>,
}

/// Sitemap entries for every published FAQ that passes the eligibility rule.
pub fn build_entries<S: EntityStore + ?Sized>(store: &S, site: &SiteSection) -> Vec<SitemapEntry> {
    let published = store.published();
    let candidates: Vec<FaqId> = published.iter().map(|f| f.id).collect();
    let included: HashSet<FaqId> = SitemapEligibility::new(store)
        .filter_sitemap_candidates(&candidates)
        .into_iter()
        .collect();

    published
        .iter()
        .filter(|f| included.contains(&f.id))
        .map(|f| SitemapEntry {
            loc: faq_url(site, f.id),
            lastmod: Some(f.created_at.format("%Y-%m-%d").to_string()),
        })
        .collect()
}

/// Generate sitemap XML string.
pub fn render_sitemap_xml(entries: &[SitemapEntry]) -> String {
    let mut xml = String::with_capacity(256 + entries.len() * 96);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
    xml.push('\n');

    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
        if let Some(lastmod) = &entry.lastmod {
            xml.push_str(&format!("    <lastmod>{}</lastmod>\n", escape_xml(lastmod)));
        }
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

/// Build and write the sitemap. Returns the number of URLs written.
pub fn write_sitemap<S: EntityStore + ?Sized>(
    store: &S,
    site: &SiteSection,
    path: &Path,
) -> std::io::Result<usize> {
    let entries = build_entries(store, site);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render_sitemap_xml(&entries))?;
    tracing::info!(path = %path.display(), urls = entries.len(), "wrote sitemap");
    Ok(entries.len())
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
