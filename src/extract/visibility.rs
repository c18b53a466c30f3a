use crate::dom::Dom;

pub fn is_visible_table<D: Dom>(dom: &D, table: D::Node) -> bool {
    let style = dom.computed_style(table);
    if style.display == "none" || style.visibility == "hidden" || style.opacity == "0" {
        return false;
    }

    !dom.bounding_box(table).is_empty()
}
