//! Table extraction: discovery, visibility filtering, grid resolution, normalization and
//! title inference over any [`Dom`].

use tracing::debug;

use crate::dom::Dom;
use crate::model::TableRecord;
use crate::policy::ExclusionPolicy;

mod discovery;
mod grid;
mod normalize;
#[cfg(test)]
mod tests;
mod title;
mod visibility;

use discovery::discover_tables;
use grid::resolve_grid;
use normalize::normalize_rows;
use title::resolve_title;
use visibility::is_visible_table;

/// Everything one extraction needs besides the document itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionContext {
    pub hostname: String,
    pub policy: Option<ExclusionPolicy>,
}

impl ExtractionContext {
    pub fn new(hostname: impl Into<String>, policy: Option<ExclusionPolicy>) -> Self {
        Self {
            hostname: hostname.into(),
            policy,
        }
    }

    /// The policy, if it is scoped to this context's hostname.
    pub fn active_policy(&self) -> Option<&ExclusionPolicy> {
        self.policy
            .as_ref()
            .filter(|policy| policy.applies_to(&self.hostname))
    }
}

/// Every qualifying table in document order.
pub fn extract_tables<D: Dom>(dom: &D, context: &ExtractionContext) -> Vec<TableRecord> {
    let tables = discover_tables(dom, dom.root());
    let discovered = tables.len();
    let mut records = Vec::new();

    for (index, table) in tables.into_iter().enumerate() {
        if !is_visible_table(dom, table) {
            debug!(index, "skipping hidden table");
            continue;
        }

        let mut data = resolve_grid(dom, table, context);
        if data.first().is_none_or(|row| row.is_empty()) {
            debug!(index, "skipping table without content");
            continue;
        }

        normalize_rows(&mut data);
        let title = resolve_title(dom, table, index);
        records.push(TableRecord::new(title, data));
    }

    debug!(
        discovered,
        qualifying = records.len(),
        hostname = %context.hostname,
        policy_applied = context.active_policy().is_some(),
        "table extraction finished"
    );

    records
}

/// Position `index` in the qualifying list; negative or out of range yields `None`.
pub fn table_by_index<D: Dom>(
    dom: &D,
    context: &ExtractionContext,
    index: i64,
) -> Option<TableRecord> {
    let index = usize::try_from(index).ok()?;
    extract_tables(dom, context).into_iter().nth(index)
}
