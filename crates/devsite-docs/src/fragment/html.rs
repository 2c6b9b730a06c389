//! HTML front end (javadoc and appledoc pages)
//!
//! Uses html5ever's RcDom and converts it into the owned [`Element`] tree.

use super::{Element, Markup, DOCUMENT};
use crate::diagnostics::{DocsError, DocsResult};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

/// Parse an HTML document into an owned tree rooted at a `#document` element.
///
/// The parser follows the HTML5 recovery rules, so only I/O level failures
/// surface as errors.
pub fn parse_html(origin: &str, source: &str) -> DocsResult<Element> {
    tracing::trace!("parsing HTML document {}", origin);

    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut source.as_bytes())
        .map_err(|e| DocsError::parse(origin, e.to_string()))?;

    let mut root = Element::new(DOCUMENT);
    convert_children(&dom.document, &mut root);
    Ok(root)
}

fn convert_children(handle: &Handle, parent: &mut Element) {
    for child in handle.children.borrow().iter() {
        match &child.data {
            RcNodeData::Document => convert_children(child, parent),
            RcNodeData::Text { contents } => {
                let text = contents.borrow().to_string();
                if !text.is_empty() {
                    parent.children.push(Markup::Text(text));
                }
            }
            RcNodeData::Element { name, attrs, .. } => {
                let mut element = Element::new(name.local.to_string());
                for attr in attrs.borrow().iter() {
                    element
                        .attrs
                        .insert(attr.name.local.to_string(), attr.value.to_string());
                }
                convert_children(child, &mut element);
                parent.children.push(Markup::Element(element));
            }
            RcNodeData::Doctype { .. }
            | RcNodeData::Comment { .. }
            | RcNodeData::ProcessingInstruction { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_html_document() {
        let html = r#"<!DOCTYPE html><html><head><title>PebbleKit</title></head>
<body><div id="content"><h1>PBWatch</h1><p class="x">Hi &amp; bye</p></div></body></html>"#;
        let doc = parse_html("Classes/PBWatch.html", html).unwrap();

        let content = doc.find(|e| e.attr("id") == Some("content")).unwrap();
        assert_eq!(content.child_text("h1").as_deref(), Some("PBWatch"));
        assert_eq!(
            content.find(|e| e.has_class("x")).map(|p| p.text()).as_deref(),
            Some("Hi & bye")
        );
        assert!(doc.find_named("head").is_some());
    }

    #[test]
    fn test_parse_html_recovers_from_bad_markup() {
        let doc = parse_html("broken.html", "<table><tr><td>cell<td>next</table>").unwrap();
        assert_eq!(doc.find_all(|e| e.is("td")).len(), 2);
    }
}
