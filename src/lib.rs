//! # KISS FAQs
//!
//! A small FAQ engine: questions and answers live in an entity store, are
//! embedded in pages with a `[KISSFAQ]` shortcode, render with a click-to-
//! toggle UI, and are described to search engines with one schema.org
//! `FAQPage` document per page.
//!
//! # Request Flow
//!
//! ```text
//! [KISSFAQ category="billing"]
//!        │  shortcode::parse_shortcode
//!        ▼
//!   ShortcodeAtts ──► store.query() ──► visibility::resolve_list ──► maud markup
//!                                                                     │
//!                                  RenderContext.schema ◄─────────────┘
//!                                        │  (end of request)
//!                                        ▼
//!                          <script type="application/ld+json">
//! ```
//!
//! Independently, sitemap generation and single-FAQ pages ask
//! [`sitemap::SitemapEligibility`] whether a FAQ may be indexed.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | `Faq`, `FaqId`, `Term` and the stored `YesNo` / `LayoutStyle` flags |
//! | [`store`] | `EntityStore` trait, category queries, the JSON-backed `MemoryStore` |
//! | [`visibility`] | Which rendered FAQs start expanded and which collapsed |
//! | [`sitemap`] | Global/per-FAQ sitemap eligibility, robots meta, `sitemap.xml` |
//! | [`schema`] | Request-scoped `FAQPage` aggregation and tag stripping |
//! | [`shortcode`] | `[KISSFAQ ...]` parser and attribute typing |
//! | [`render`] | `RenderContext`, FAQ markup, layouts, the standalone FAQ page |
//! | [`admin`] | Capability-gated settings and flag edits, notices, self-tests |
//! | [`config`] | `config.toml` loading, validation and stock defaults |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## No Process-Wide State
//!
//! Structured data is collected in a [`render::RenderContext`] created per
//! request, never in a global. Two requests rendering at the same time cannot
//! leak questions into each other's JSON-LD, and a test can render as many
//! "pages" as it likes in one process.
//!
//! ## The Global Switch Wins
//!
//! A FAQ is indexable only when both the site-wide switch and its own flag
//! allow it. Sitemap filtering and the robots no-index tag share a single
//! predicate so they can never disagree.
//!
//! ## Lenient Reads, Strict Writes
//!
//! Stored flags are read forgivingly (anything but `"no"` is `"yes"`, absent
//! means default) so old or hand-edited data never breaks a page. Admin
//! writes only accept the exact documented values.

pub mod admin;
pub mod config;
pub mod output;
pub mod render;
pub mod schema;
pub mod shortcode;
pub mod sitemap;
pub mod store;
pub mod types;
pub mod visibility;

#[cfg(test)]
pub(crate) mod test_helpers;
