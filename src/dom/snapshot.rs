use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::Value;

use super::{ComputedStyle, Document, DocumentBuilder, Rect};

/// Deepest JSON nesting accepted. Each element takes two levels: its object and its
/// `children` array.
const MAX_JSON_DEPTH: usize = 1024;

/// A rendered page serialized by a host that has a layout engine.
///
/// `root` is an element object `{ tag, attrs?, style?, rect?, children? }`; children are
/// text strings or further element objects.
#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub url: Option<String>,
    pub root: Value,
}

/// Everything on an element object except its children.
#[derive(Debug, Clone, Deserialize)]
struct ElementFields {
    tag: String,
    #[serde(default)]
    attrs: BTreeMap<String, String>,
    #[serde(default)]
    style: Option<SnapshotStyle>,
    #[serde(default)]
    rect: Option<Rect>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotStyle {
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub opacity: Option<CssValue>,
}

/// Hosts emit opacity either as the CSS string or as a bare number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CssValue {
    Text(String),
    Number(f64),
}

impl CssValue {
    fn into_css(self) -> String {
        match self {
            Self::Text(value) => value.trim().to_string(),
            Self::Number(value) => value.to_string(),
        }
    }
}

impl From<SnapshotStyle> for ComputedStyle {
    fn from(style: SnapshotStyle) -> Self {
        let defaults = ComputedStyle::default();
        Self {
            display: style.display.unwrap_or(defaults.display),
            visibility: style.visibility.unwrap_or(defaults.visibility),
            opacity: style
                .opacity
                .map(CssValue::into_css)
                .unwrap_or(defaults.opacity),
        }
    }
}

pub fn parse(source: &str) -> Result<Document> {
    let depth = nesting_depth(source);
    if depth > MAX_JSON_DEPTH {
        bail!("document snapshot nests {depth} levels deep, more than {MAX_JSON_DEPTH}");
    }

    let mut deserializer = serde_json::Deserializer::from_str(source);
    deserializer.disable_recursion_limit();
    let snapshot = Snapshot::deserialize(&mut deserializer)
        .context("failed to parse document snapshot json")?;
    deserializer
        .end()
        .context("unexpected trailing data after document snapshot json")?;

    build(snapshot)
}

enum Step {
    Enter(Value),
    Close,
}

pub fn build(snapshot: Snapshot) -> Result<Document> {
    let Snapshot { url, root } = snapshot;

    let (fields, children) = split_element(root)?;
    let mut builder = DocumentBuilder::new(&fields.tag);
    apply_fields(&mut builder, fields);

    let mut stack = children.into_iter().rev().map(Step::Enter).collect::<Vec<Step>>();
    while let Some(step) = stack.pop() {
        match step {
            Step::Close => {
                builder.close();
            }
            Step::Enter(Value::String(text)) => {
                builder.text(&text);
            }
            Step::Enter(value) => {
                let (fields, children) = split_element(value)?;
                builder.open(&fields.tag);
                apply_fields(&mut builder, fields);

                stack.push(Step::Close);
                stack.extend(children.into_iter().rev().map(Step::Enter));
            }
        }
    }

    let document = builder.finish();
    Ok(match url {
        Some(url) => document.with_url(url),
        None => document,
    })
}

/// Detaches `children` so no element value is ever dropped with its subtree attached.
fn split_element(value: Value) -> Result<(ElementFields, Vec<Value>)> {
    let Value::Object(mut object) = value else {
        bail!("snapshot node must be a text string or an element object");
    };

    let children = match object.remove("children") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(children)) => children,
        Some(_) => bail!("snapshot element children must be an array"),
    };
    let fields = serde_json::from_value::<ElementFields>(Value::Object(object))
        .context("invalid snapshot element")?;

    Ok((fields, children))
}

fn apply_fields(builder: &mut DocumentBuilder, fields: ElementFields) {
    for (name, value) in &fields.attrs {
        builder.attr(name, value);
    }
    if let Some(style) = fields.style {
        builder.style(style.into());
    }
    if let Some(rect) = fields.rect {
        builder.rect(rect);
    }
}

/// Deepest object/array nesting in `source`, ignoring brackets inside strings.
fn nesting_depth(source: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for byte in source.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    deepest
}
