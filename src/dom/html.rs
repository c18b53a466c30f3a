use scraper::{ElementRef, Html, Node};

use super::{Document, DocumentBuilder};

/// Parse raw HTML into a [`Document`].
///
/// Parsing never fails; malformed markup is repaired the way browsers repair it. The
/// resulting document carries no layout information, so visibility is derived from inline
/// styles.
pub fn parse(source: &str) -> Document {
    let parsed = Html::parse_document(source);
    let root = parsed.root_element();

    let mut builder = DocumentBuilder::new(root.value().name());
    for (name, value) in root.value().attrs() {
        builder.attr(name, value);
    }
    append_children(&mut builder, root);

    builder.finish()
}

enum Step<N> {
    Enter(N),
    Close,
}

fn append_children(builder: &mut DocumentBuilder, element: ElementRef<'_>) {
    let mut stack = element.children().map(Step::Enter).collect::<Vec<_>>();
    stack.reverse();

    while let Some(step) = stack.pop() {
        let node = match step {
            Step::Enter(node) => node,
            Step::Close => {
                builder.close();
                continue;
            }
        };

        match node.value() {
            Node::Element(value) => {
                builder.open(value.name());
                for (name, attr_value) in value.attrs() {
                    builder.attr(name, attr_value);
                }

                stack.push(Step::Close);
                let mut children = node.children().map(Step::Enter).collect::<Vec<_>>();
                children.reverse();
                stack.extend(children);
            }
            Node::Text(text) => {
                builder.text(text);
            }
            _ => {}
        }
    }
}
