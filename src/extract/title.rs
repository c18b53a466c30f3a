use crate::dom::Dom;

/// Display name for a table; `index` is its position among all discovered tables.
///
/// Falls back through caption, preceding heading, `aria-label` and `id` before settling
/// on `Table N`.
pub fn resolve_title<D: Dom>(dom: &D, table: D::Node, index: usize) -> String {
    caption_title(dom, table)
        .or_else(|| heading_title(dom, table))
        .or_else(|| aria_label_title(dom, table))
        .or_else(|| id_title(dom, table))
        .unwrap_or_else(|| format!("Table {}", index + 1))
}

/// Nearest `h1`..`h6` before `element` among its siblings.
///
/// Without one, the parent's immediately preceding sibling is tried, unless the parent is
/// the document body. The search never climbs more than that single level.
pub fn find_previous_heading<D: Dom>(dom: &D, element: D::Node) -> Option<D::Node> {
    let sibling_heading = dom
        .preceding_siblings(element)
        .into_iter()
        .find(|&sibling| is_heading(dom.tag_name(sibling)));
    if sibling_heading.is_some() {
        return sibling_heading;
    }

    let parent = dom.parent(element)?;
    if dom.body() == Some(parent) {
        return None;
    }

    dom.previous_sibling(parent)
        .filter(|&candidate| is_heading(dom.tag_name(candidate)))
}

fn caption_title<D: Dom>(dom: &D, table: D::Node) -> Option<String> {
    dom.children(table)
        .into_iter()
        .find(|&child| dom.tag_name(child) == "caption")
        .and_then(|caption| non_empty(dom.inner_text(caption).trim()))
}

fn heading_title<D: Dom>(dom: &D, table: D::Node) -> Option<String> {
    find_previous_heading(dom, table)
        .and_then(|heading| non_empty(dom.inner_text(heading).trim()))
}

fn aria_label_title<D: Dom>(dom: &D, table: D::Node) -> Option<String> {
    dom.attribute(table, "aria-label")
        .and_then(|label| non_empty(label.trim()))
}

fn id_title<D: Dom>(dom: &D, table: D::Node) -> Option<String> {
    dom.attribute(table, "id")
        .and_then(|id| non_empty(id.replace(['-', '_'], " ").trim()))
}

fn is_heading(tag: &str) -> bool {
    matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
