//! Owned markup trees
//!
//! Doxygen XML and scraped javadoc/appledoc HTML are both parsed into the same
//! small owned tree. Nodes are `Clone + Serialize` so that raw per-platform
//! fragments can be stored on [`crate::node::DocNode`]s and transformed later
//! without holding on to a parser's document arena.

mod html;
mod xml;

pub use html::parse_html;
pub use xml::parse_xml;

use indexmap::IndexMap;
use serde::Serialize;

/// Name of the synthetic element wrapping a parsed document
pub const DOCUMENT: &str = "#document";

/// HTML elements that never have a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A markup node: element or text
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Markup {
    Element(Element),
    Text(String),
}

impl Markup {
    /// Text content of this node
    pub fn text(&self) -> String {
        match self {
            Markup::Element(e) => e.text(),
            Markup::Text(t) => t.clone(),
        }
    }

    /// The element, when this node is one
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Markup::Element(e) => Some(e),
            Markup::Text(_) => None,
        }
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Markup::Element(e) => e.write_html(out),
            Markup::Text(t) => out.push_str(&html_escape::encode_text(t)),
        }
    }
}

/// An element with ordered attributes and children
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub name: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub attrs: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Markup>,
}

impl Element {
    /// Create an empty element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Builder: add an attribute
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Builder: append a text child
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Markup::Text(text.into()));
        self
    }

    /// Builder: append an element child
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Markup::Element(child));
        self
    }

    /// Whether the element has the given tag name
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Set or replace an attribute
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(name.into(), value.into());
    }

    /// Whether the whitespace separated `class` attribute contains `class`
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Add a class to the `class` attribute
    pub fn add_class(&mut self, class: &str) {
        let value = match self.attr("class") {
            Some(existing) if !existing.is_empty() => format!("{} {}", existing, class),
            _ => class.to_string(),
        };
        self.set_attr("class", value);
    }

    /// Direct element children
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Markup::as_element)
    }

    /// First direct child element with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.is(name))
    }

    /// Every direct child element with the given name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.is(name))
    }

    /// Text content of the first direct child with the given name
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).map(Element::text)
    }

    /// First descendant (depth first, document order) matching `pred`
    pub fn find<P>(&self, pred: P) -> Option<&Element>
    where
        P: Fn(&Element) -> bool,
    {
        fn walk<'a, P: Fn(&Element) -> bool>(el: &'a Element, pred: &P) -> Option<&'a Element> {
            for child in el.elements() {
                if pred(child) {
                    return Some(child);
                }
                if let Some(found) = walk(child, pred) {
                    return Some(found);
                }
            }
            None
        }
        walk(self, &pred)
    }

    /// Every descendant matching `pred`, in document order
    pub fn find_all<P>(&self, pred: P) -> Vec<&Element>
    where
        P: Fn(&Element) -> bool,
    {
        fn walk<'a, P: Fn(&Element) -> bool>(el: &'a Element, pred: &P, out: &mut Vec<&'a Element>) {
            for child in el.elements() {
                if pred(child) {
                    out.push(child);
                }
                walk(child, pred, out);
            }
        }
        let mut out = Vec::new();
        walk(self, &pred, &mut out);
        out
    }

    /// First descendant with the given tag name
    pub fn find_named(&self, name: &str) -> Option<&Element> {
        self.find(|e| e.is(name))
    }

    /// Element siblings following the first descendant matching `pred`
    pub fn following_siblings<P>(&self, pred: P) -> Option<Vec<&Element>>
    where
        P: Fn(&Element) -> bool,
    {
        fn walk<'a, P: Fn(&Element) -> bool>(el: &'a Element, pred: &P) -> Option<Vec<&'a Element>> {
            let siblings: Vec<&Element> = el.elements().collect();
            for (i, child) in siblings.iter().enumerate() {
                if pred(child) {
                    return Some(siblings[i + 1..].to_vec());
                }
                if let Some(found) = walk(child, pred) {
                    return Some(found);
                }
            }
            None
        }
        walk(self, &pred)
    }

    /// Concatenated text of every descendant text node
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Markup::Element(e) => e.collect_text(out),
                Markup::Text(t) => out.push_str(t),
            }
        }
    }

    /// Copy of this element with every descendant matching `pred` removed
    pub fn without<P>(&self, pred: P) -> Element
    where
        P: Fn(&Element) -> bool,
    {
        fn strip<P: Fn(&Element) -> bool>(el: &Element, pred: &P) -> Element {
            Element {
                name: el.name.clone(),
                attrs: el.attrs.clone(),
                children: el
                    .children
                    .iter()
                    .filter_map(|c| match c {
                        Markup::Element(e) if pred(e) => None,
                        Markup::Element(e) => Some(Markup::Element(strip(e, pred))),
                        Markup::Text(t) => Some(Markup::Text(t.clone())),
                    })
                    .collect(),
            }
        }
        strip(self, &pred)
    }

    /// Rewrite the tree bottom-up.
    ///
    /// `f` sees every descendant element after its own children were
    /// rewritten and returns the replacement nodes (empty to remove it).
    pub fn rewrite<F>(self, f: &mut F) -> Element
    where
        F: FnMut(Element) -> Vec<Markup>,
    {
        let Element {
            name,
            attrs,
            children,
        } = self;
        let mut rewritten = Vec::with_capacity(children.len());
        for child in children {
            match child {
                Markup::Element(e) => {
                    let e = e.rewrite(f);
                    rewritten.extend(f(e));
                }
                text => rewritten.push(text),
            }
        }
        Element {
            name,
            attrs,
            children: rewritten,
        }
    }

    /// Serialize this element (including its own tag) as HTML
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    /// Serialize the children of this element as HTML
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_html(&mut out);
        }
        out
    }

    fn write_html(&self, out: &mut String) {
        if self.name == DOCUMENT {
            for child in &self.children {
                child.write_html(out);
            }
            return;
        }
        out.push('<');
        out.push_str(&self.name);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(value));
            out.push('"');
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&self.name.as_str()) {
            return;
        }
        for child in &self.children {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}
