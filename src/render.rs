//! HTML rendering.
//!
//! Every request gets its own [`RenderContext`]. It owns the request's
//! [`SchemaAggregator`] and remembers whether the toggle script has already
//! been written, so any number of shortcodes on one page share a single
//! script and a single JSON-LD document:
//!
//! ```text
//! RenderContext::new()
//!   ├── render_shortcode([KISSFAQ post=1])   → FAQ markup + toggle script
//!   ├── render_shortcode([KISSFAQ category]) → FAQ markup
//!   └── finish()                             → <script type="application/ld+json">
//! ```
//!
//! A declined render (bad id, missing FAQ) becomes an inline red paragraph
//! carrying the [`RenderError`] message and records nothing in the schema.
//!
//! Questions are escaped. Answers keep their HTML, but only what the
//! `ammonia` allow-list permits: scripts, event handlers and `javascript:`
//! links are removed before the answer reaches the page. Structured data
//! gets the tag-stripped text instead.

use crate::config::SiteSection;
use crate::schema::SchemaAggregator;
use crate::shortcode::{Selection, ShortcodeAtts};
use crate::sitemap::{SitemapEligibility, robots_meta};
use crate::store::{EntityStore, FaqQuery, OPTION_LAYOUT_STYLE};
use crate::types::{Faq, FaqId, LayoutStyle};
use crate::visibility::{HiddenParam, resolve_list, resolve_single};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use thiserror::Error;

const CARET_COLLAPSED: &str = "►";
const CARET_EXPANDED: &str = "▼";
const NO_FAQS_FOUND: &str = "No FAQs found.";

/// Click a question to show or hide its answer. Written once per page.
const TOGGLE_SCRIPT: &str = r#"
document.addEventListener('DOMContentLoaded', function () {
  document.querySelectorAll('.kiss-faq-wrapper').forEach(function (wrapper) {
    var question = wrapper.querySelector('.kiss-faq-question');
    var answer = wrapper.querySelector('.kiss-faq-answer');
    var caret = wrapper.querySelector('.kiss-faq-caret');
    if (!question || !answer || !caret) { return; }
    question.addEventListener('click', function () {
      var hidden = answer.style.display === 'none';
      answer.style.display = hidden ? 'block' : 'none';
      caret.textContent = hidden ? '▼' : '►';
    });
  });
});
"#;

/// Why a shortcode produced a placeholder instead of FAQ markup.
///
/// The `Display` text is what the visitor sees.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("FAQ ID not specified or invalid.")]
    InvalidSelector,
    #[error("FAQ not found or invalid post type.")]
    NotFound(FaqId),
    /// The id exists but is not a publicly visible FAQ.
    #[error("FAQ not found or invalid post type.")]
    TypeMismatch(FaqId),
}

/// Look up a FAQ that may be shown on its own.
fn lookup<S: EntityStore + ?Sized>(store: &S, id: FaqId) -> Result<Faq, RenderError> {
    let faq = store.get(id).ok_or(RenderError::NotFound(id))?;
    if !faq.is_published() {
        return Err(RenderError::TypeMismatch(id));
    }
    Ok(faq)
}

/// The layout in force: the shortcode override, else the site option.
pub fn resolve_layout<S: EntityStore + ?Sized>(store: &S, atts: &ShortcodeAtts) -> LayoutStyle {
    atts.layout_override().unwrap_or_else(|| {
        LayoutStyle::from_stored(store.option(OPTION_LAYOUT_STYLE).as_deref())
    })
}

/// Request-scoped render state.
#[derive(Debug, Default)]
pub struct RenderContext {
    schema: SchemaAggregator,
    script_emitted: bool,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema(&self) -> &SchemaAggregator {
        &self.schema
    }

    pub fn script_emitted(&self) -> bool {
        self.script_emitted
    }

    /// Render one shortcode invocation. Never fails: declined renders come
    /// back as the inline placeholder.
    pub fn render_shortcode<S: EntityStore + ?Sized>(
        &mut self,
        store: &S,
        atts: &ShortcodeAtts,
    ) -> Markup {
        let layout = resolve_layout(store, atts);
        let result = atts.selection().and_then(|selection| match selection {
            Selection::Single(id) => self.render_single(store, id, atts.hidden(), layout),
            Selection::List(query) => Ok(self.render_list(store, &query, atts.hidden(), layout)),
        });
        result.unwrap_or_else(|err| {
            tracing::warn!(error = ?err, post = ?atts.post, "declined FAQ render");
            error_placeholder(&err)
        })
    }

    /// A single FAQ by id.
    pub fn render_single<S: EntityStore + ?Sized>(
        &mut self,
        store: &S,
        id: FaqId,
        hidden: HiddenParam,
        layout: LayoutStyle,
    ) -> Result<Markup, RenderError> {
        let faq = lookup(store, id)?;
        let block = self.faq_block(&faq, resolve_single(hidden), layout);
        let script = self.take_script();
        Ok(html! {
            (block)
            @if let Some(script) = script { (script) }
        })
    }

    /// Every published FAQ matching `query`, oldest first.
    pub fn render_list<S: EntityStore + ?Sized>(
        &mut self,
        store: &S,
        query: &FaqQuery,
        hidden: HiddenParam,
        layout: LayoutStyle,
    ) -> Markup {
        let faqs = store.query(query);
        if faqs.is_empty() {
            tracing::debug!(?query, "no FAQs matched");
            return html! { p class="kiss-faq-empty" { (NO_FAQS_FOUND) } };
        }

        let resolved = resolve_list(faqs, hidden, query.has_category_filter());
        let blocks: Vec<Markup> = resolved
            .iter()
            .map(|(faq, collapsed)| self.faq_block(faq, *collapsed, layout))
            .collect();
        let script = self.take_script();
        html! {
            div class={ "kiss-faq-list kiss-faq-layout-" (layout) } {
                @for block in &blocks { (block) }
            }
            @if let Some(script) = script { (script) }
        }
    }

    /// End of request: the JSON-LD script for everything rendered, if any.
    pub fn finish(self) -> Result<Option<Markup>, serde_json::Error> {
        tracing::debug!(entries = self.schema.len(), "finishing render context");
        self.schema.script_tag()
    }

    fn faq_block(&mut self, faq: &Faq, collapsed: bool, layout: LayoutStyle) -> Markup {
        self.schema.add(&faq.question, &faq.answer);
        faq_markup(faq, collapsed, layout)
    }

    fn take_script(&mut self) -> Option<Markup> {
        if self.script_emitted {
            return None;
        }
        self.script_emitted = true;
        Some(html! { script { (PreEscaped(TOGGLE_SCRIPT)) } })
    }
}

fn faq_markup(faq: &Faq, collapsed: bool, layout: LayoutStyle) -> Markup {
    let caret = if collapsed { CARET_COLLAPSED } else { CARET_EXPANDED };
    let answer_style = if collapsed {
        "display:none; margin-top: 5px;"
    } else {
        "display:block; margin-top: 5px;"
    };

    match layout {
        LayoutStyle::Default => html! {
            div class="kiss-faq-wrapper" data-faq-id=(faq.id) style="margin-bottom: 1em;" {
                div class="kiss-faq-question" style="cursor: pointer; font-weight: bold;" {
                    span class="kiss-faq-caret" style="margin-right: 5px;" { (caret) }
                    span { (faq.question) }
                }
                div class="kiss-faq-answer" style=(answer_style) {
                    (safe_answer(&faq.answer))
                }
            }
        },
        LayoutStyle::SleuthAi => html! {
            div class="kiss-faq-wrapper kiss-faq-card" data-faq-id=(faq.id) {
                h3 class="kiss-faq-question kiss-faq-card-title" style="cursor: pointer;" {
                    span class="kiss-faq-caret" { (caret) }
                    " "
                    (faq.question)
                }
                div class="kiss-faq-answer kiss-faq-card-body" style=(answer_style) {
                    (safe_answer(&faq.answer))
                }
            }
        },
    }
}

/// Answer HTML reduced to the tags and attributes allowed in post content.
fn safe_answer(answer: &str) -> Markup {
    PreEscaped(ammonia::clean(answer))
}

fn error_placeholder(err: &RenderError) -> Markup {
    html! { p style="color:red;" { (err) } }
}

/// A complete HTML page for one FAQ, as served at its public URL.
///
/// Carries the robots no-index tag whenever the FAQ is excluded from the
/// sitemap.
pub fn render_faq_page<S: EntityStore + ?Sized>(
    store: &S,
    site: &SiteSection,
    id: FaqId,
) -> Result<Markup, RenderError> {
    let faq = lookup(store, id)?;
    let no_index = SitemapEligibility::new(store).requires_no_index(id);
    if no_index {
        tracing::debug!(%id, "FAQ page is excluded from indexing");
    }

    let layout = LayoutStyle::from_stored(store.option(OPTION_LAYOUT_STYLE).as_deref());
    let mut ctx = RenderContext::new();
    let body = ctx.render_single(store, id, HiddenParam::from_attr(Some("false")), layout)?;
    let structured_data = ctx.finish().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "could not serialize FAQ structured data");
        None
    });

    Ok(html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                @if no_index { (robots_meta()) }
                title { (faq.question) " | " (site.title) }
            }
            body {
                main { (body) }
                @if let Some(script) = structured_data { (script) }
            }
        }
    })
}
