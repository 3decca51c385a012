//! Initial expanded/collapsed state for rendered FAQs.
//!
//! The `hidden` attribute fails toward collapsed: only the literal string
//! `"false"` (any case) expands an answer. Lists get one extra rule on top:
//! the first entry is always expanded, so a rendered block never shows only
//! questions.
//!
//! | Render            | `hidden`     | index 0   | index 1..  |
//! |-------------------|--------------|-----------|------------|
//! | single            | `false`      | expanded  | n/a        |
//! | single            | other/absent | collapsed | n/a        |
//! | list, category    | any          | expanded  | collapsed  |
//! | list, no category | `false`      | expanded  | expanded   |
//! | list, no category | other/absent | expanded  | collapsed  |

/// The parsed `hidden` shortcode attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HiddenParam {
    collapsed: bool,
}

impl HiddenParam {
    /// Interpret the raw attribute. Absent means collapsed.
    pub fn from_attr(raw: Option<&str>) -> Self {
        let expanded = raw.is_some_and(|v| v.eq_ignore_ascii_case("false"));
        Self {
            collapsed: !expanded,
        }
    }

    pub fn collapsed(self) -> bool {
        self.collapsed
    }
}

impl Default for HiddenParam {
    fn default() -> Self {
        Self::from_attr(None)
    }
}

/// Collapsed state for a FAQ requested on its own by id.
pub fn resolve_single(hidden: HiddenParam) -> bool {
    hidden.collapsed()
}

/// Pair every entry of an already-ordered selection with its collapsed state.
///
/// Order is preserved. An empty selection yields an empty result; the caller
/// decides what placeholder to show.
pub fn resolve_list<T>(
    entities: impl IntoIterator<Item = T>,
    hidden: HiddenParam,
    category_filter_applied: bool,
) -> Vec<(T, bool)> {
    let resolved: Vec<(T, bool)> = entities
        .into_iter()
        .enumerate()
        .map(|(index, entity)| {
            let collapsed = match (index, category_filter_applied) {
                (0, _) => false,
                (_, true) => true,
                (_, false) => hidden.collapsed(),
            };
            (entity, collapsed)
        })
        .collect();
    tracing::debug!(
        count = resolved.len(),
        hidden = hidden.collapsed(),
        category_filter_applied,
        "resolved list visibility"
    );
    resolved
}
