//! XML front end (Doxygen output)

use super::{Element, Markup, DOCUMENT};
use crate::diagnostics::{DocsError, DocsResult};
use sxd_document::dom::{ChildOfElement, ChildOfRoot};
use sxd_document::parser;

/// Parse an XML document into an owned tree rooted at a `#document` element.
///
/// `origin` names the file in error messages. Comments and processing
/// instructions are dropped.
pub fn parse_xml(origin: &str, source: &str) -> DocsResult<Element> {
    let package =
        parser::parse(source).map_err(|e| DocsError::parse(origin, format!("{:?}", e)))?;
    let document = package.as_document();

    let mut root = Element::new(DOCUMENT);
    for child in document.root().children() {
        if let ChildOfRoot::Element(element) = child {
            root.children.push(Markup::Element(convert(element)));
        }
    }
    Ok(root)
}

fn convert(element: sxd_document::dom::Element<'_>) -> Element {
    let mut out = Element::new(element.name().local_part());
    for attribute in element.attributes() {
        out.attrs.insert(
            attribute.name().local_part().to_string(),
            attribute.value().to_string(),
        );
    }
    for child in element.children() {
        match child {
            ChildOfElement::Element(e) => out.children.push(Markup::Element(convert(e))),
            ChildOfElement::Text(t) => out.children.push(Markup::Text(t.text().to_string())),
            _ => {}
        }
    }
    out
}
