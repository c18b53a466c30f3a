use super::{ComputedStyle, Dom, Rect};

const NON_RENDERED_TAGS: &[&str] = &[
    "head", "link", "meta", "noscript", "script", "style", "template", "title",
];

// Elements that occupy space even when they have no content of their own.
const SIZED_TAGS: &[&str] = &[
    "button", "canvas", "hr", "iframe", "img", "input", "select", "svg", "td", "textarea",
    "th", "video",
];

const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "caption",
    "dd",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "tbody",
    "tfoot",
    "thead",
    "tr",
    "ul",
];

/// Handle to a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    style: Option<ComputedStyle>,
    rect: Option<Rect>,
}

/// Arena-backed element tree.
///
/// Nodes may carry a computed style and a layout box recorded by a rendering host. When
/// they don't, both are derived from inline `style` declarations and the node's content.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    url: Option<String>,
}

impl Document {
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Element { .. })
    }

    fn ancestors_inclusive(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), |&current| self.node(current).parent)
    }

    fn inline_declaration(&self, id: NodeId, property: &str) -> Option<String> {
        let style = self.attribute(id, "style")?;

        style
            .split(';')
            .filter_map(|declaration| declaration.split_once(':'))
            .filter(|(name, _)| name.trim().eq_ignore_ascii_case(property))
            .map(|(_, value)| {
                let value = value.trim();
                let value = value
                    .strip_suffix("!important")
                    .map(str::trim_end)
                    .unwrap_or(value);
                value.to_ascii_lowercase()
            })
            .next_back()
    }

    fn derived_display(&self, id: NodeId) -> String {
        if let Some(display) = self.inline_declaration(id, "display") {
            return display;
        }
        if self.attribute(id, "hidden").is_some() {
            return "none".to_string();
        }

        default_display(self.tag_name(id)).to_string()
    }

    fn derived_visibility(&self, id: NodeId) -> String {
        for current in self.ancestors_inclusive(id) {
            if let Some(style) = &self.node(current).style {
                return style.visibility.clone();
            }
            match self.inline_declaration(current, "visibility") {
                Some(value) if value != "inherit" => return value,
                _ => {}
            }
        }

        "visible".to_string()
    }

    fn display_of(&self, id: NodeId) -> String {
        match &self.node(id).style {
            Some(style) => style.display.clone(),
            None => self.derived_display(id),
        }
    }

    fn estimated_box(&self, id: NodeId) -> Rect {
        let collapsed = self
            .ancestors_inclusive(id)
            .any(|current| self.display_of(current) == "none");
        if collapsed {
            return Rect::default();
        }

        let zero_sized = ["width", "height"].iter().any(|property| {
            self.inline_declaration(id, property)
                .map(|value| is_zero_length(&value))
                .unwrap_or(false)
        });
        if zero_sized || !self.has_rendered_content(id) {
            return Rect::default();
        }

        Rect::new(1.0, 1.0)
    }

    fn has_rendered_content(&self, id: NodeId) -> bool {
        let mut stack = self.node(id).children.clone();

        while let Some(current) = stack.pop() {
            match &self.node(current).kind {
                NodeKind::Text(text) => {
                    if text.chars().any(|c| !c.is_ascii_whitespace()) {
                        return true;
                    }
                }
                NodeKind::Element { tag, .. } => {
                    let tag = tag.as_str();
                    if NON_RENDERED_TAGS.contains(&tag) {
                        continue;
                    }
                    if SIZED_TAGS.contains(&tag) {
                        return true;
                    }
                    stack.extend(self.node(current).children.iter().copied());
                }
            }
        }

        false
    }

    fn collect_text(&self, id: NodeId) -> String {
        let mut text = InnerText::default();
        let mut stack = self
            .node(id)
            .children
            .iter()
            .rev()
            .map(|&child| TextStep::Visit(child))
            .collect::<Vec<TextStep>>();

        while let Some(step) = stack.pop() {
            let child = match step {
                TextStep::Visit(child) => child,
                TextStep::BlockEnd => {
                    text.block_boundary();
                    continue;
                }
                TextStep::CellEnd => {
                    text.push_raw('\t');
                    continue;
                }
            };

            match &self.node(child).kind {
                NodeKind::Text(value) => text.push_text(value),
                NodeKind::Element { tag, .. } => {
                    let tag = tag.as_str();
                    if NON_RENDERED_TAGS.contains(&tag) || self.display_of(child) == "none" {
                        continue;
                    }
                    if tag == "br" {
                        text.push_raw('\n');
                        continue;
                    }

                    if BLOCK_TAGS.contains(&tag) {
                        text.block_boundary();
                        stack.push(TextStep::BlockEnd);
                    } else if tag == "td" || tag == "th" {
                        stack.push(TextStep::CellEnd);
                    }
                    stack.extend(
                        self.node(child)
                            .children
                            .iter()
                            .rev()
                            .map(|&grandchild| TextStep::Visit(grandchild)),
                    );
                }
            }
        }

        text.finish()
    }
}

impl Dom for Document {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn body(&self) -> Option<NodeId> {
        self.children(self.root())
            .into_iter()
            .find(|&child| self.tag_name(child) == "body")
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node)
            .children
            .iter()
            .copied()
            .filter(|&child| self.is_element(child))
            .collect()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    fn tag_name(&self, node: NodeId) -> &str {
        match &self.node(node).kind {
            NodeKind::Element { tag, .. } => tag.as_str(),
            NodeKind::Text(_) => "",
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.node(node).kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    fn inner_text(&self, node: NodeId) -> String {
        self.collect_text(node)
    }

    fn computed_style(&self, node: NodeId) -> ComputedStyle {
        if let Some(style) = &self.node(node).style {
            return style.clone();
        }

        ComputedStyle {
            display: self.derived_display(node),
            visibility: self.derived_visibility(node),
            opacity: self
                .inline_declaration(node, "opacity")
                .map(|value| computed_opacity(&value))
                .unwrap_or_else(|| "1".to_string()),
        }
    }

    fn bounding_box(&self, node: NodeId) -> Rect {
        match self.node(node).rect {
            Some(rect) => rect,
            None => self.estimated_box(node),
        }
    }
}

/// Incremental construction of a [`Document`].
///
/// `open` descends into a new element, `close` returns to its parent; `attr`, `style`
/// and `rect` apply to the innermost open element.
#[derive(Debug)]
pub struct DocumentBuilder {
    nodes: Vec<NodeData>,
    stack: Vec<NodeId>,
}

impl DocumentBuilder {
    pub fn new(root_tag: &str) -> Self {
        let root = NodeData {
            kind: NodeKind::Element {
                tag: root_tag.to_ascii_lowercase(),
                attrs: Vec::new(),
            },
            parent: None,
            children: Vec::new(),
            style: None,
            rect: None,
        };

        Self {
            nodes: vec![root],
            stack: vec![NodeId(0)],
        }
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(NodeId(0))
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let parent = self.current();
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            style: None,
            rect: None,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn open(&mut self, tag: &str) -> &mut Self {
        let id = self.push_node(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        });
        self.stack.push(id);
        self
    }

    pub fn close(&mut self) -> &mut Self {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
        self
    }

    pub fn attr(&mut self, name: &str, value: &str) -> &mut Self {
        let current = self.current();
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[current.0].kind {
            attrs.push((name.to_ascii_lowercase(), value.to_string()));
        }
        self
    }

    pub fn style(&mut self, style: ComputedStyle) -> &mut Self {
        let current = self.current();
        self.nodes[current.0].style = Some(style);
        self
    }

    pub fn rect(&mut self, rect: Rect) -> &mut Self {
        let current = self.current();
        self.nodes[current.0].rect = Some(rect);
        self
    }

    pub fn text(&mut self, text: &str) -> &mut Self {
        self.push_node(NodeKind::Text(text.to_string()));
        self
    }

    /// Shorthand for an element holding nothing but text.
    #[cfg(test)]
    pub fn leaf(&mut self, tag: &str, text: &str) -> &mut Self {
        self.open(tag).text(text).close()
    }

    pub fn finish(self) -> Document {
        Document {
            nodes: self.nodes,
            url: None,
        }
    }
}

fn default_display(tag: &str) -> &'static str {
    match tag {
        "table" => "table",
        "caption" => "table-caption",
        "thead" => "table-header-group",
        "tbody" => "table-row-group",
        "tfoot" => "table-footer-group",
        "tr" => "table-row",
        "td" | "th" => "table-cell",
        _ if NON_RENDERED_TAGS.contains(&tag) => "none",
        _ if BLOCK_TAGS.contains(&tag) => "block",
        _ => "inline",
    }
}

fn is_zero_length(value: &str) -> bool {
    let numeric_end = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(value.len());

    value[..numeric_end]
        .parse::<f64>()
        .map(|number| number == 0.0)
        .unwrap_or(false)
}

/// Serialized the way browsers report it; unparsable values fall back to `1`.
fn computed_opacity(value: &str) -> String {
    let parsed = match value.strip_suffix('%') {
        Some(percent) => percent.trim_end().parse::<f64>().map(|number| number / 100.0),
        None => value.parse::<f64>(),
    };

    match parsed {
        Ok(number) if number.is_finite() && number <= 0.0 => "0".to_string(),
        Ok(number) if number.is_finite() => number.min(1.0).to_string(),
        _ => "1".to_string(),
    }
}

enum TextStep {
    Visit(NodeId),
    BlockEnd,
    CellEnd,
}

/// Accumulates `innerText`. Whitespace runs collapse to one space; block boundaries
/// become a single line break between content, while `<br>` breaks are kept verbatim.
#[derive(Default)]
struct InnerText {
    out: String,
    pending_break: bool,
}

impl InnerText {
    fn push_text(&mut self, text: &str) {
        for c in text.chars() {
            if c.is_ascii_whitespace() {
                if !self.out.is_empty() && !self.out.ends_with([' ', '\n', '\t']) {
                    self.out.push(' ');
                }
            } else {
                self.push_raw(c);
            }
        }
    }

    fn push_raw(&mut self, c: char) {
        if self.pending_break && !self.out.is_empty() {
            self.out.push('\n');
        }
        self.pending_break = false;
        self.out.push(c);
    }

    fn block_boundary(&mut self) {
        self.pending_break = true;
    }

    fn finish(self) -> String {
        let lines = self
            .out
            .split('\n')
            .map(|line| line.trim_matches([' ', '\t']))
            .collect::<Vec<&str>>();

        lines.join("\n").trim_matches('\n').to_string()
    }
}
