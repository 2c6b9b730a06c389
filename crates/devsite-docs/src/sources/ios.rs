//! PebbleKit iOS documentation scraped from an appledoc archive
//!
//! Every HTML document with a `#content` element becomes a page. Appledoc
//! marks each documented method with an `//api/name/...` anchor, which is
//! turned into a method node of the page's class node. The index document's
//! section headers and lists become group nodes, which make up the
//! navigation tree.

use crate::archive::Archive;
use crate::config::{url_root_or_default, HtmlSourceConfig};
use crate::diagnostics::{DiagnosticsCollector, DocsResult};
use crate::fragment::{parse_html, Element, Markup};
use crate::language::AdapterId;
use crate::node::{ClassKind, DocNode, DocNodeDef, MemberKind, PlatformData, ANY_PLATFORM};
use crate::slug::slug;
use crate::sources::{any_summary, node_branch, scraped_node, scraped_page, DocumentationSource, SourceCore, SourceOutput};
use crate::symbols::{Symbol, SymbolTable};
use serde_json::Value;

const LAYOUT: &str = "pebblekit-ios";
const INDEX: &str = "index.html";

/// Appledoc source for the `pebblekit_ios` slot
pub struct DocumentationIos {
    core: SourceCore,
    config: HtmlSourceConfig,
    url_root: String,
    archive: Option<Archive>,
    /// The index document, published at the url root
    index: Option<DocNode>,
    /// One node per documented page, holding its `//api` anchors
    documents: Vec<DocNode>,
    /// Index sections, holding the documents they list
    sections: Vec<DocNode>,
}

/// `+` is not safe in the fragment-bearing urls symbols link to
fn encode_plus(url: &str) -> String {
    url.replace('+', "%2B")
}

/// Node definition of a top-level appledoc document, from its directory
fn document_def(path: &str) -> DocNodeDef {
    let kind = match path.split('/').next() {
        Some("Classes") => ClassKind::Class,
        Some("Protocols") => ClassKind::Protocol,
        Some("Categories") => ClassKind::Category,
        _ => return DocNodeDef::group(),
    };
    DocNodeDef::Class { kind }
}

impl DocumentationIos {
    pub fn new(config: HtmlSourceConfig) -> Self {
        let url_root = url_root_or_default(AdapterId::PebbleKitIos, config.url_root.as_deref());
        Self {
            core: SourceCore::new(AdapterId::PebbleKitIos),
            config,
            url_root,
            archive: None,
            index: None,
            documents: Vec::new(),
            sections: Vec::new(),
        }
    }

    pub fn with_archive(config: HtmlSourceConfig, archive: Archive) -> Self {
        let mut source = Self::new(config);
        source.archive = Some(archive);
        source
    }

    /// Documented pages, each holding its method anchors
    pub fn documents(&self) -> &[DocNode] {
        &self.documents
    }

    /// Node for an archive document; `None` when it has no `#content`
    fn read_entry(&self, path: &str, doc: &Element) -> Option<DocNode> {
        let Some(content) = doc.find(|e| e.attr("id") == Some("content")) else {
            tracing::debug!(entry = %path, "appledoc entry has no #content, skipped");
            return None;
        };
        let basename = path.rsplit('/').next().unwrap_or(path);
        let name = basename.trim_end_matches(".html").to_string();
        // the index maps to the url root
        let (relative, def) = if path == INDEX {
            (String::new(), DocNodeDef::group())
        } else {
            (path.replacen(".html", "/", 1), document_def(path))
        };
        let url = encode_plus(&format!("{}{}", self.url_root, relative));
        let mut node = scraped_node(def, &name, &relative, &url, path, content.clone());

        let title = doc
            .find(|e| e.has_class("title"))
            .map(|t| t.text().trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or(name);
        node.data[ANY_PLATFORM]
            .details
            .insert("title".to_string(), Value::String(title));

        for anchor in doc.find_all(is_api_anchor) {
            let (Some(anchor_name), Some(title)) = (anchor.attr("name"), anchor.attr("title")) else {
                continue;
            };
            if node.children.iter().any(|c| c.name == title) {
                tracing::debug!(entry = %path, anchor = %anchor_name, "repeated appledoc anchor");
                continue;
            }
            let mut member = DocNode::new(
                DocNodeDef::Member { kind: MemberKind::Method },
                title,
                format!("{}#{}", relative, anchor_name),
                format!("{}#{}", url, encode_plus(anchor_name)),
            )
            .at_position(node.children.len());
            member.add_platform(ANY_PLATFORM, anchor_name, None);
            member.data.insert(
                ANY_PLATFORM.to_string(),
                PlatformData {
                    summary: anchor_summary(doc, anchor_name).unwrap_or_default(),
                    ..Default::default()
                },
            );
            node.children.push(member);
        }
        Some(node)
    }

    /// Index sections: one group per `h2`, listing the documents linked
    /// from the list at the same position
    fn read_index(&self, doc: &Element) -> Vec<DocNode> {
        let Some(content) = doc.find(|e| e.attr("id") == Some("content")) else {
            return Vec::new();
        };
        let lists = content.find_all(|e| e.is("ul"));
        content
            .find_all(|e| e.is("h2"))
            .into_iter()
            .enumerate()
            .map(|(i, header)| {
                let header = header.text().trim().to_string();
                let anchor = format!("#{}", slug(&header));
                let mut section = DocNode::new(
                    DocNodeDef::group(),
                    &header,
                    &anchor,
                    format!("{}{}", self.url_root, anchor),
                )
                .at_position(i);
                section.add_platform(ANY_PLATFORM, INDEX, None);

                let items = lists.get(i).map(|list| list.find_all(|e| e.is("li"))).unwrap_or_default();
                for item in items {
                    let Some(href) = item.find_named("a").and_then(|a| a.attr("href")) else { continue };
                    let target = href.replacen(".html", "/", 1);
                    let mut entry = DocNode::new(
                        document_def(href),
                        item.text().trim(),
                        &target,
                        encode_plus(&format!("{}{}", self.url_root, target)),
                    )
                    .at_position(section.children.len());
                    entry.add_platform(ANY_PLATFORM, href, None);
                    section.children.push(entry);
                }
                section
            })
            .collect()
    }
}

fn is_api_anchor(el: &Element) -> bool {
    el.is("a")
        && el.attr("title").is_some()
        && el.attr("name").is_some_and(|n| n.starts_with("//api"))
}

/// Text of the `div` directly after the `h3` directly after the anchor
fn anchor_summary(doc: &Element, anchor_name: &str) -> Option<String> {
    let siblings = doc.following_siblings(|e| e.is("a") && e.attr("name") == Some(anchor_name))?;
    match siblings.as_slice() {
        [h3, div, ..] if h3.is("h3") && div.is("div") => Some(div.text().trim().to_string()),
        _ => None,
    }
}

/// Relative links move one level down, since every document becomes a
/// directory of its own
pub fn rewrite_href(href: &str) -> String {
    if href.contains("://") || href.starts_with("mailto:") {
        return href.to_string();
    }
    encode_plus(&href.replace("../", "../../").replace(".html", "/"))
}

/// Parameter table rows as `dt`/`dd` pairs
fn argument_list(mut table: Element) -> Element {
    let mut items = Vec::new();
    for row in table.find_all(|e| e.is("tr")) {
        let term = row
            .find(|e| e.is("th") && e.has_class("argument-name"))
            .and_then(|th| th.find_named("code"))
            .map(|code| Element {
                name: "em".to_string(),
                ..code.clone()
            });
        let definition = row
            .find(|e| e.is("td") && !e.has_class("argument-name"))
            .map(|td| td.text())
            .unwrap_or_default();
        let mut dt = Element::new("dt");
        if let Some(term) = term {
            dt = dt.with_child(term);
        }
        items.push(Markup::Element(dt));
        items.push(Markup::Element(Element::new("dd").with_text(definition)));
    }
    table.name = "dl".to_string();
    table.children = items;
    table
}

/// Appledoc markup → site markup
fn clean_page(content: Element) -> Element {
    content.rewrite(&mut |mut el| {
        let name = el.name.clone();
        match name.as_str() {
            "h1" | "footer" => return vec![],
            "a" => {
                if el.attr("name").is_some() {
                    el.add_class("anchor");
                }
                if let Some(href) = el.attr("href").map(rewrite_href) {
                    el.set_attr("href", href);
                }
            }
            "h3" if el.has_class("method-title") => {
                let title = el
                    .find(|e| e.is("code"))
                    .and_then(|code| code.find_named("a"))
                    .map(|a| a.text().trim_start_matches('\u{a0}').to_string());
                if let Some(title) = title {
                    el.children = vec![Markup::Text(title)];
                }
                el.set_attr("class", "subsubtitle method-title");
            }
            "table" if el.has_class("argument-def") => return vec![Markup::Element(argument_list(el))],
            _ => {}
        }
        if el.has_class("section-specification") {
            el = el.rewrite(&mut |mut cell| {
                if cell.is("th") {
                    cell.name = "td".to_string();
                    cell.set_attr("class", "specification-title");
                }
                vec![Markup::Element(cell)]
            });
        }
        vec![Markup::Element(el)]
    })
}

impl DocumentationSource for DocumentationIos {
    fn core(&self) -> &SourceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SourceCore {
        &mut self.core
    }

    fn read(&mut self, _diag: &mut DiagnosticsCollector) -> DocsResult<()> {
        let archive = match self.archive.take() {
            Some(archive) => archive,
            None => Archive::open(&self.config.archive)?,
        };
        let paths: Vec<String> = archive
            .paths()
            .filter(|p| p.ends_with(".html"))
            .map(str::to_string)
            .collect();

        for path in &paths {
            let doc = parse_html(path, &archive.read_to_string(path)?)?;
            if path.rsplit('/').next() == Some(INDEX) {
                let sections = self.read_index(&doc);
                self.sections.extend(sections);
            }
            let Some(node) = self.read_entry(path, &doc) else { continue };
            if path == INDEX {
                self.index = Some(node);
            } else {
                let position = self.documents.len();
                self.documents.push(node.at_position(position));
            }
        }

        tracing::info!(
            source = %self.adapter(),
            archive = archive.name(),
            documents = self.documents.len(),
            sections = self.sections.len(),
            "parsed appledoc"
        );
        Ok(())
    }

    fn collect_symbols(&self) -> Vec<Symbol> {
        let language = self.language();
        let mut symbols = Vec::new();
        for document in &self.documents {
            symbols.push(
                Symbol::new(&document.name, &document.url, document.kind_name(), language)
                    .with_summary(any_summary(document)),
            );
            for anchor in &document.children {
                symbols.push(
                    Symbol::new(&anchor.name, &anchor.url, anchor.kind_name(), language)
                        .with_summary(any_summary(anchor)),
                );
            }
        }
        symbols
    }

    fn transform(&mut self, _table: &SymbolTable, _diag: &mut DiagnosticsCollector) -> DocsResult<()> {
        for node in self.index.iter_mut().chain(self.documents.iter_mut()) {
            let Some(body) = node.raw.get(ANY_PLATFORM) else { continue };
            let contents = clean_page(body.clone()).to_html();
            node.data.entry(ANY_PLATFORM.to_string()).or_default().contents = Some(contents);
        }
        Ok(())
    }

    fn build_output(&self) -> DocsResult<SourceOutput> {
        let language = self.language();
        let pages = self
            .index
            .iter()
            .chain(&self.documents)
            .filter_map(|node| {
                let url = format!("{}{}", self.url_root, node.path);
                scraped_page(node, url, language, LAYOUT, Some(node_branch(node)))
            })
            .collect();
        Ok(SourceOutput {
            symbols: self.collect_symbols(),
            pages,
            tree: self.sections.iter().map(node_branch).collect(),
            redirects: Vec::new(),
        })
    }
}
