//! CLI output formatting.
//!
//! # Entity Display Contract
//!
//! Every FAQ is shown the same way in every command: a header line with its
//! zero-padded id and question, followed by indented context lines.
//!
//! ```text
//! 001 How do I pay?
//!     Answer: By card.
//!     Sitemap flag: yes
//!     In sitemap: yes
//! ```
//!
//! # Output Format
//!
//! ## Status
//!
//! ```text
//! FAQs
//! 001 How do I pay?
//!     Answer: By card.
//!     Sitemap flag: yes
//!     In sitemap: yes
//! 002 Can I get a refund?
//!     Answer: Within 30 days.
//!     Sitemap flag: no
//!     In sitemap: no
//!
//! Global sitemap inclusion: yes
//! 1 of 2 FAQs in sitemap
//! ```
//!
//! ## Check
//!
//! ```text
//! Self-tests
//! PASS Default sitemap flag
//!     New FAQs start included in the sitemap.
//! FAIL Sitemap exclusion
//!     Eligible ids were [1, 2], expected [1].
//!
//! 1 passed, 1 failed
//! ```
//!
//! With `--delete-test-posts` the flagged FAQs follow. Without `--yes` the
//! run only lists them:
//!
//! ```text
//! Would move 1 test FAQ to trash
//! 009 Sample question
//! Re-run with --yes to confirm
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::admin::{ActionLink, SelfTestResult, Settings, shortcode_for};
use crate::schema::strip_all_tags;
use crate::sitemap::SitemapEligibility;
use crate::store::EntityStore;
use crate::types::{Faq, FaqId, YesNo};
use std::path::Path;

const ANSWER_PREVIEW_CHARS: usize = 60;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format an id as 3-digit zero-padded.
fn format_index(id: FaqId) -> String {
    format!("{:0>3}", id.get())
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn entity_header(faq: &Faq) -> String {
    format!("{} {}", format_index(faq.id), faq.question)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn answer_line(faq: &Faq) -> String {
    format!(
        "{}Answer: {}",
        indent(1),
        truncate_desc(&strip_all_tags(&faq.answer), ANSWER_PREVIEW_CHARS)
    )
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

// ============================================================================
// Status
// ============================================================================

/// Sitemap state of one FAQ, as listed by `status`.
#[derive(Debug, Clone)]
pub struct StatusRow {
    pub faq: Faq,
    pub flag: YesNo,
    pub in_sitemap: bool,
}

/// Collect status rows for every published FAQ.
pub fn status_rows<S: EntityStore + ?Sized>(store: &S) -> (YesNo, Vec<StatusRow>) {
    let eligibility = SitemapEligibility::new(store);
    let rows = store
        .published()
        .into_iter()
        .map(|faq| StatusRow {
            flag: eligibility.individual_flag(faq.id),
            in_sitemap: !eligibility.should_exclude(faq.id),
            faq,
        })
        .collect();
    (eligibility.global_switch(), rows)
}

pub fn format_status(global: YesNo, rows: &[StatusRow]) -> Vec<String> {
    let mut lines = vec!["FAQs".to_string()];
    if rows.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for row in rows {
        lines.push(entity_header(&row.faq));
        lines.push(answer_line(&row.faq));
        lines.push(format!("{}Sitemap flag: {}", indent(1), row.flag));
        lines.push(format!("{}In sitemap: {}", indent(1), yes_no(row.in_sitemap)));
    }
    lines.push(String::new());
    lines.push(format!("Global sitemap inclusion: {global}"));
    let included = rows.iter().filter(|r| r.in_sitemap).count();
    lines.push(format!("{} of {} FAQs in sitemap", included, rows.len()));
    lines
}

pub fn print_status(global: YesNo, rows: &[StatusRow]) {
    print_lines(format_status(global, rows));
}

// ============================================================================
// Settings
// ============================================================================

pub fn format_settings(settings: &Settings, links: &[ActionLink]) -> Vec<String> {
    let mut lines = vec![
        "Settings".to_string(),
        format!("{}Global sitemap inclusion: {}", indent(1), settings.global_sitemap),
        format!("{}Layout style: {}", indent(1), settings.layout),
    ];
    if !links.is_empty() {
        lines.push(String::new());
        lines.push("Links".to_string());
        for link in links {
            lines.push(format!("{}{} → {}", indent(1), link.label, link.target));
        }
    }
    lines
}

pub fn print_settings(settings: &Settings, links: &[ActionLink]) {
    print_lines(format_settings(settings, links));
}

// ============================================================================
// Single-FAQ actions
// ============================================================================

pub fn format_added(faq: &Faq) -> Vec<String> {
    vec![
        format!("Added {}", entity_header(faq)),
        format!("{}Shortcode: {}", indent(1), shortcode_for(faq.id)),
    ]
}

pub fn print_added(faq: &Faq) {
    print_lines(format_added(faq));
}

pub fn format_flag_update(faq: &Faq, flag: YesNo, in_sitemap: bool) -> Vec<String> {
    vec![
        entity_header(faq),
        format!("{}Sitemap flag: {}", indent(1), flag),
        format!("{}In sitemap: {}", indent(1), yes_no(in_sitemap)),
    ]
}

pub fn print_flag_update(faq: &Faq, flag: YesNo, in_sitemap: bool) {
    print_lines(format_flag_update(faq, flag, in_sitemap));
}

// ============================================================================
// Sitemap
// ============================================================================

pub fn format_sitemap_result(path: &Path, count: usize) -> Vec<String> {
    let noun = if count == 1 { "URL" } else { "URLs" };
    vec![format!("Sitemap → {} ({} {})", path.display(), count, noun)]
}

pub fn print_sitemap_result(path: &Path, count: usize) {
    print_lines(format_sitemap_result(path, count));
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check(
    results: &[SelfTestResult],
    legacy_notice: Option<&str>,
    test_posts: &[Faq],
) -> Vec<String> {
    let mut lines = vec!["Self-tests".to_string()];
    for result in results {
        let status = if result.passed { "PASS" } else { "FAIL" };
        lines.push(format!("{} {}", status, result.name));
        lines.push(format!("{}{}", indent(1), result.detail));
    }

    if !test_posts.is_empty() {
        lines.push(String::new());
        lines.push("Possible test FAQs".to_string());
        lines.extend(test_posts.iter().map(entity_header));
    }

    if let Some(notice) = legacy_notice {
        lines.push(String::new());
        lines.push("Legacy data".to_string());
        lines.push(format!("{}{}", indent(1), notice));
    }

    let passed = results.iter().filter(|r| r.passed).count();
    lines.push(String::new());
    lines.push(format!(
        "{} passed, {} failed",
        passed,
        results.len() - passed
    ));
    lines
}

pub fn print_check(results: &[SelfTestResult], legacy_notice: Option<&str>, test_posts: &[Faq]) {
    print_lines(format_check(results, legacy_notice, test_posts));
}

/// Result of a test-FAQ clean-up. `confirmed` is false for a dry run.
pub fn format_cleanup(faqs: &[Faq], confirmed: bool) -> Vec<String> {
    if faqs.is_empty() {
        return vec!["No test FAQs to clean up".to_string()];
    }
    let noun = if faqs.len() == 1 { "test FAQ" } else { "test FAQs" };
    let verb = if confirmed { "Moved" } else { "Would move" };
    let mut lines = vec![format!("{} {} {} to trash", verb, faqs.len(), noun)];
    lines.extend(faqs.iter().map(entity_header));
    if !confirmed {
        lines.push("Re-run with --yes to confirm".to_string());
    }
    lines
}

pub fn print_cleanup(faqs: &[Faq], confirmed: bool) {
    print_lines(format_cleanup(faqs, confirmed));
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
