use crate::dom::Dom;

/// All `table` elements below `root` in document order, nested tables included.
pub fn discover_tables<D: Dom>(dom: &D, root: D::Node) -> Vec<D::Node> {
    dom.find_all(root, &["table"])
}
