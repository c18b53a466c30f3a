use std::collections::BTreeSet;

use crate::dom::Dom;
use crate::policy::ExclusionPolicy;

use super::ExtractionContext;

const CELL_TAGS: &[&str] = &["th", "td"];

// Browsers clamp `colspan` to this value.
const MAX_COLSPAN: usize = 1000;

/// Resolve `table` into rows of cell text in logical column order.
///
/// Spanned cells repeat their text in every column they cover; columns excluded by the
/// active policy are dropped, and rows left without values are omitted. Rows may still
/// differ in length.
pub fn resolve_grid<D: Dom>(
    dom: &D,
    table: D::Node,
    context: &ExtractionContext,
) -> Vec<Vec<String>> {
    let policy = context.active_policy();
    let excluded = excluded_columns(dom, table, policy);
    let mut data = Vec::new();

    for row in table_rows(dom, table, policy) {
        let mut values = Vec::new();
        let mut cursor = 0usize;

        for cell in dom.find_all(row, CELL_TAGS) {
            let span = parse_span(dom.attribute(cell, "colspan"));
            let text = cell_text(dom, cell);

            for column in cursor..cursor.saturating_add(span) {
                if !excluded.contains(&column) {
                    values.push(text.clone());
                }
            }
            cursor = cursor.saturating_add(span);
        }

        if !values.is_empty() {
            data.push(values);
        }
    }

    data
}

/// Logical column indices covered by cells carrying the policy's marker class.
pub fn excluded_columns<D: Dom>(
    dom: &D,
    table: D::Node,
    policy: Option<&ExclusionPolicy>,
) -> BTreeSet<usize> {
    let mut excluded = BTreeSet::new();
    let Some(policy) = policy else {
        return excluded;
    };

    for row in dom.find_all(table, &["tr"]) {
        let mut cursor = 0usize;
        for cell in dom.find_all(row, CELL_TAGS) {
            let span = parse_span(dom.attribute(cell, "colspan"));
            if dom.has_class(cell, &policy.skip_column_marker) {
                excluded.extend(cursor..cursor.saturating_add(span));
            }
            cursor = cursor.saturating_add(span);
        }
    }

    excluded
}

/// Leading integer of a `colspan` value; anything below 1 or unparsable counts as 1.
pub fn parse_span(raw: Option<&str>) -> usize {
    let Some(raw) = raw else {
        return 1;
    };

    let trimmed = raw.trim_start();
    if trimmed.starts_with('-') {
        return 1;
    }
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    let digits = &unsigned[..digits_end];
    if digits.is_empty() {
        return 1;
    }

    match digits.parse::<usize>() {
        Ok(0) => 1,
        Ok(span) => span.min(MAX_COLSPAN),
        Err(_) => MAX_COLSPAN,
    }
}

fn table_rows<D: Dom>(
    dom: &D,
    table: D::Node,
    policy: Option<&ExclusionPolicy>,
) -> Vec<D::Node> {
    let rows = dom.find_all(table, &["tr"]);

    match policy {
        Some(policy) if policy.skip_footer_rows => rows
            .into_iter()
            .filter(|&row| dom.closest(row, "tfoot").is_none())
            .collect(),
        _ => rows,
    }
}

fn cell_text<D: Dom>(dom: &D, cell: D::Node) -> String {
    dom.inner_text(cell).replace('\u{a0}', " ").trim().to_string()
}
