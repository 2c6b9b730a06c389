//! PebbleKit Android documentation scraped from a javadoc archive
//!
//! The archive holds the standard javadoc layout under `javadoc/`. Packages
//! come from the overview table, classes from the package summary tables and
//! methods from each class's Method Summary. Each becomes a node: packages
//! are groups, types are classes and methods are members. The
//! `.contentContainer` of every package and type document is kept as
//! pre-rendered HTML with its links moved to site urls.

use crate::archive::Archive;
use crate::config::{url_root_or_default, HtmlSourceConfig};
use crate::diagnostics::{DiagnosticsCollector, DocsError, DocsResult};
use crate::fragment::{parse_html, Element, Markup};
use crate::language::AdapterId;
use crate::node::{ClassKind, DocNode, DocNodeDef, MemberKind, PlatformData, ANY_PLATFORM};
use crate::sources::{any_summary, node_branch, scraped_node, scraped_page, DocumentationSource, SourceCore, SourceOutput};
use crate::symbols::{Symbol, SymbolTable};
use serde_json::Value;

const LAYOUT: &str = "pebblekit-android";
const ARCHIVE_ROOT: &str = "javadoc/";

/// Package summary tables and the kind of type each lists
const TYPE_TABLES: [(&str, ClassKind); 4] = [
    ("Class Summary", ClassKind::Class),
    ("Interface Summary", ClassKind::Interface),
    ("Enum Summary", ClassKind::Enum),
    ("Exception Summary", ClassKind::Exception),
];

/// Root-level pages that are only emitted when present
const EXTRA_PAGES: [(&str, &str, &str); 2] = [
    ("constant-values", "Constant Values", "constantValuesContainer"),
    ("serialized-form", "Serialized Form", "serializedFormContainer"),
];

/// Javadoc source for the `pebblekit_android` slot
pub struct DocumentationAndroid {
    core: SourceCore,
    config: HtmlSourceConfig,
    url_root: String,
    archive: Option<Archive>,
    /// Package groups holding their types, which hold their methods
    packages: Vec<DocNode>,
    /// Root-level documents outside the package tree
    extras: Vec<DocNode>,
}

impl DocumentationAndroid {
    pub fn new(config: HtmlSourceConfig) -> Self {
        let url_root = url_root_or_default(AdapterId::PebbleKitAndroid, config.url_root.as_deref());
        Self {
            core: SourceCore::new(AdapterId::PebbleKitAndroid),
            config,
            url_root,
            archive: None,
            packages: Vec::new(),
            extras: Vec::new(),
        }
    }

    pub fn with_archive(config: HtmlSourceConfig, archive: Archive) -> Self {
        let mut source = Self::new(config);
        source.archive = Some(archive);
        source
    }

    /// Package groups, each holding its types and their methods
    pub fn packages(&self) -> &[DocNode] {
        &self.packages
    }

    /// Package group with its type classes and their method members
    fn read_package(&self, archive: &Archive, name: String, summary: String, position: usize) -> DocsResult<DocNode> {
        let dir = package_dir(&name);
        let path = format!("{}{}/package-summary.html", ARCHIVE_ROOT, dir);
        let doc = load_html(archive, &path)?;

        let package_path = format!("{}/", dir);
        let package_url = format!("{}{}", self.url_root, package_path);
        let mut package = scraped_node(
            DocNodeDef::group(),
            &name,
            &package_path,
            &package_url,
            &path,
            content_container(&doc, &path, "contentContainer")?,
        )
        .at_position(position);
        set_summary(&mut package, summary);

        for (label, kind) in TYPE_TABLES {
            let Some(table) = summary_table(&doc, label) else { continue };
            for row in body_rows(table) {
                let Some(type_name) = cell_text(row, "colFirst") else { continue };
                let summary = cell_text(row, "colLast").unwrap_or_default();
                let position = package.children.len();
                let mut java_type = self.read_type(archive, &package, &dir, type_name, kind, position)?;
                set_summary(&mut java_type, summary);
                package.children.push(java_type);
            }
        }
        Ok(package)
    }

    fn read_type(
        &self,
        archive: &Archive,
        package: &DocNode,
        dir: &str,
        name: String,
        kind: ClassKind,
        position: usize,
    ) -> DocsResult<DocNode> {
        let entry = format!("{}{}/{}.html", ARCHIVE_ROOT, dir, name);
        let doc = load_html(archive, &entry)?;
        let path = format!("{}{}/", package.path, name);
        let url = format!("{}{}/", package.url, name);
        let mut node = scraped_node(
            DocNodeDef::Class { kind },
            &name,
            path,
            url,
            &entry,
            content_container(&doc, &entry, "contentContainer")?,
        )
        .at_position(position);

        if let Some(table) = summary_table(&doc, "Method Summary") {
            for row in table.find_all(|e| e.is("tr")) {
                let Some(link) = row.find(|e| e.has_class("memberNameLink")) else { continue };
                let method = link.text().trim().to_string();
                // overloads share one anchor
                if node.children.iter().any(|m| m.name == method) {
                    continue;
                }
                let summary = row
                    .find(|e| e.has_class("block"))
                    .map(|block| block.text().trim().to_string())
                    .unwrap_or_default();
                let mut member = DocNode::new(
                    DocNodeDef::Member { kind: MemberKind::Method },
                    &method,
                    format!("{}#{}", node.path, method),
                    format!("{}#{}", node.url, method),
                )
                .at_position(node.children.len());
                member.add_platform(ANY_PLATFORM, format!("{}#{}", entry, method), None);
                member.data.insert(ANY_PLATFORM.to_string(), PlatformData::default());
                set_summary(&mut member, summary);
                node.children.push(member);
            }
        }
        Ok(node)
    }

    /// Root-level documents present in the archive
    fn read_extras(&self, archive: &Archive) -> DocsResult<Vec<DocNode>> {
        let mut extras = Vec::new();
        for (name, title, container) in EXTRA_PAGES {
            let entry = format!("{}{}.html", ARCHIVE_ROOT, name);
            if !archive.contains(&entry) {
                tracing::debug!(page = %entry, "optional javadoc page not present");
                continue;
            }
            let body = content_container(&load_html(archive, &entry)?, &entry, container)?;
            let path = format!("{}/", name);
            let url = format!("{}{}", self.url_root, path);
            let mut node = scraped_node(DocNodeDef::group(), title, path, url, &entry, body).at_position(extras.len());
            node.data[ANY_PLATFORM]
                .details
                .insert("title".to_string(), Value::String(title.to_string()));
            extras.push(node);
        }
        Ok(extras)
    }
}

fn set_summary(node: &mut DocNode, summary: String) {
    node.data.entry(ANY_PLATFORM.to_string()).or_default().summary = summary;
}

/// Archive directory, relative to the javadoc root, of a node's document
fn archive_dir(entry: &str) -> &str {
    let relative = entry.strip_prefix(ARCHIVE_ROOT).unwrap_or(entry);
    relative.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// `com.example.kit` → `com/example/kit`
fn package_dir(name: &str) -> String {
    name.replace('.', "/")
}

fn load_html(archive: &Archive, path: &str) -> DocsResult<Element> {
    parse_html(path, &archive.read_to_string(path)?)
}

fn content_container(doc: &Element, path: &str, class: &str) -> DocsResult<Element> {
    doc.find(|e| e.has_class(class))
        .cloned()
        .ok_or_else(|| DocsError::parse(path, format!("no .{} element", class)))
}

/// Summary table whose `summary` attribute starts with `label`
fn summary_table<'a>(doc: &'a Element, label: &str) -> Option<&'a Element> {
    doc.find(|e| e.is("table") && e.attr("summary").is_some_and(|s| s.starts_with(label)))
}

fn body_rows(table: &Element) -> Vec<&Element> {
    table
        .find_all(|e| e.is("tbody"))
        .into_iter()
        .flat_map(|body| body.children_named("tr"))
        .collect()
}

/// Text of the first `td` with the given class; header cells are `th`
fn cell_text(row: &Element, class: &str) -> Option<String> {
    row.find(|e| e.is("td") && e.has_class(class))
        .map(|cell| cell.text().trim().to_string())
}

/// Site url for a link found in a javadoc document living in `dir`.
///
/// Package summaries map to their package directory and any other
/// `.html` file to a directory of the same name. Absolute, external and
/// fragment-only links are kept.
pub fn site_href(url_root: &str, dir: &str, href: &str) -> String {
    if href.is_empty() || href.starts_with('#') || href.starts_with('/') || href.contains(':') {
        return href.to_string();
    }
    let (path, fragment) = match href.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (href, None),
    };

    let mut segments: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            part => segments.push(part),
        }
    }
    let joined = segments.join("/");
    let mapped = match joined
        .strip_suffix("package-summary.html")
        .or_else(|| joined.strip_suffix("overview-summary.html"))
    {
        Some(directory) => directory.to_string(),
        None => match joined.strip_suffix(".html") {
            Some(stem) => format!("{}/", stem),
            None => joined.clone(),
        },
    };

    let mut url = format!("{}{}", url_root, mapped);
    if let Some(fragment) = fragment {
        url.push('#');
        url.push_str(fragment);
    }
    url
}

/// Rewrite links to site urls and drop member table captions
fn clean_page(body: Element, url_root: &str, dir: &str) -> Element {
    body.rewrite(&mut |mut el| {
        if el.is("a") {
            if let Some(href) = el.attr("href").map(|h| site_href(url_root, dir, h)) {
                el.set_attr("href", href);
            }
        }
        if el.is("table") && el.has_class("memberSummary") {
            el.children
                .retain(|c| !matches!(c, Markup::Element(e) if e.is("caption")));
        }
        vec![Markup::Element(el)]
    })
}

impl DocumentationSource for DocumentationAndroid {
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

        let overview = load_html(&archive, "javadoc/overview-summary.html")?;
        let listed: Vec<(String, String)> = body_rows(&overview)
            .into_iter()
            .filter_map(|row| Some((cell_text(row, "colFirst")?, cell_text(row, "colLast").unwrap_or_default())))
            .collect();
        let mut packages = Vec::new();
        for (position, (name, summary)) in listed.into_iter().enumerate() {
            packages.push(self.read_package(&archive, name, summary, position)?);
        }
        self.extras = self.read_extras(&archive)?;
        self.packages = packages;

        tracing::info!(
            source = %self.adapter(),
            archive = archive.name(),
            packages = self.packages.len(),
            extras = self.extras.len(),
            "parsed javadoc"
        );
        Ok(())
    }

    fn collect_symbols(&self) -> Vec<Symbol> {
        let language = self.language();
        let mut symbols = Vec::new();
        for package in &self.packages {
            symbols.push(Symbol::new(&package.name, &package.url, "package", language).with_summary(any_summary(package)));
            for java_type in &package.children {
                let qualified = format!("{}.{}", package.name, java_type.name);
                symbols.push(
                    Symbol::new(&qualified, &java_type.url, java_type.kind_name(), language)
                        .with_summary(any_summary(java_type)),
                );
                for method in &java_type.children {
                    symbols.push(
                        Symbol::new(format!("{}.{}", qualified, method.name), &method.url, method.kind_name(), language)
                            .with_summary(any_summary(method)),
                    );
                }
            }
        }
        symbols
    }

    fn transform(&mut self, _table: &SymbolTable, _diag: &mut DiagnosticsCollector) -> DocsResult<()> {
        let url_root = &self.url_root;
        for node in self.packages.iter_mut().chain(self.extras.iter_mut()) {
            node.walk_mut(&mut |node| {
                let Some(body) = node.raw.get(ANY_PLATFORM) else { return };
                let contents = clean_page(body.clone(), url_root, archive_dir(&node.id)).to_html();
                node.data.entry(ANY_PLATFORM.to_string()).or_default().contents = Some(contents);
            });
        }
        Ok(())
    }

    fn build_output(&self) -> DocsResult<SourceOutput> {
        let language = self.language();
        let mut pages = Vec::new();
        for package in &self.packages {
            package.walk(&mut |node| {
                if let Some(page) = scraped_page(node, node.url.clone(), language, LAYOUT, Some(node_branch(node))) {
                    pages.push(page);
                }
            });
        }
        pages.extend(
            self.extras
                .iter()
                .filter_map(|node| scraped_page(node, node.url.clone(), language, LAYOUT, None)),
        );

        Ok(SourceOutput {
            symbols: self.collect_symbols(),
            pages,
            tree: self.packages.iter().map(node_branch).collect(),
            redirects: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LanguagePriority;
    use crate::output::PageContent;
    use crate::test::mock_javadoc_archive;
    use pretty_assertions::assert_eq;

    const ROOT: &str = "/docs/pebblekit-android/";

    fn resolved() -> DocumentationAndroid {
        let config = HtmlSourceConfig {
            archive: "unused".into(),
            url_root: None,
        };
        let mut source = DocumentationAndroid::with_archive(config, mock_javadoc_archive());
        let mut diag = DiagnosticsCollector::new();
        source.parse(&mut diag).unwrap();
        let table = SymbolTable::builder(LanguagePriority::default()).build();
        source.resolve(&table, &mut diag).unwrap();
        source.finalize().unwrap();
        source
    }

    #[test]
    fn test_site_href() {
        let dir = "com/getpebble/android/kit";
        assert_eq!(
            site_href(ROOT, dir, "../../../../com/getpebble/android/kit/util/PebbleDictionary.html"),
            "/docs/pebblekit-android/com/getpebble/android/kit/util/PebbleDictionary/"
        );
        assert_eq!(
            site_href(ROOT, dir, "util/package-summary.html"),
            "/docs/pebblekit-android/com/getpebble/android/kit/util/"
        );
        assert_eq!(
            site_href(ROOT, dir, "PebbleKit.html#isWatchConnected-android.content.Context-"),
            "/docs/pebblekit-android/com/getpebble/android/kit/PebbleKit/#isWatchConnected-android.content.Context-"
        );
        assert_eq!(site_href(ROOT, dir, "#methods"), "#methods");
        assert_eq!(site_href(ROOT, dir, "https://developer.android.com/"), "https://developer.android.com/");
    }

    #[test]
    fn test_symbols_are_qualified() {
        let source = resolved();
        let symbols = source.symbols().unwrap();
        let find = |name: &str| symbols.iter().find(|s| s.name == name).unwrap();

        let package = find("com.getpebble.android.kit");
        assert_eq!(package.kind, "package");
        assert_eq!(package.url, "/docs/pebblekit-android/com/getpebble/android/kit/");

        let class = find("com.getpebble.android.kit.PebbleKit");
        assert_eq!(class.url, "/docs/pebblekit-android/com/getpebble/android/kit/PebbleKit/");
        assert_eq!(class.summary, "Helper methods for talking to the watch.");

        let method = find("com.getpebble.android.kit.PebbleKit.isWatchConnected");
        assert_eq!(method.kind, "method");
        assert_eq!(method.url, "/docs/pebblekit-android/com/getpebble/android/kit/PebbleKit/#isWatchConnected");

        assert_eq!(find("com.getpebble.android.kit.util.PebbleTuple.TupleType").kind, "enum");
        assert!(symbols.iter().all(|s| s.language == "pebblekit_android"));
    }

    #[test]
    fn test_pages_are_cleaned() {
        let source = resolved();
        let pages = source.pages().unwrap();
        let page = pages
            .iter()
            .find(|p| p.url == "/docs/pebblekit-android/com/getpebble/android/kit/PebbleKit/")
            .unwrap();
        assert_eq!(page.layout, "pebblekit-android");
        let PageContent::Html { contents, group } = &page.content else {
            panic!("expected html content");
        };
        assert!(contents.contains("href=\"/docs/pebblekit-android/com/getpebble/android/kit/util/PebbleDictionary/\""));
        assert!(!contents.contains("<caption>"));
        assert_eq!(group.as_ref().unwrap().children[0].name, "isWatchConnected");

        assert!(pages.iter().any(|p| p.url == "/docs/pebblekit-android/constant-values/"));
        assert!(!pages.iter().any(|p| p.url.ends_with("serialized-form/")));
    }

    #[test]
    fn test_tree_lists_packages_and_types() {
        let source = resolved();
        let tree = source.tree().unwrap();
        let names: Vec<&str> = tree.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["com.getpebble.android.kit", "com.getpebble.android.kit.util"]);
        assert_eq!(tree[1].children.len(), 2);
        assert!(tree.iter().all(|b| b.validate().is_empty()));
    }

    #[test]
    fn test_forest_holds_packages_types_and_methods() {
        let source = resolved();
        let packages = source.packages();
        assert_eq!(packages[1].kind_name(), "group");
        assert_eq!(packages[1].path, "com/getpebble/android/kit/util/");

        let pebble_kit = packages[0].children.iter().find(|c| c.name == "PebbleKit").unwrap();
        assert_eq!(pebble_kit.kind_name(), "class");
        assert_eq!(pebble_kit.id, "javadoc/com/getpebble/android/kit/PebbleKit.html");
        assert!(pebble_kit.data[ANY_PLATFORM].contents.is_some());

        let method = &pebble_kit.children[0];
        assert_eq!(method.def, DocNodeDef::Member { kind: MemberKind::Method });
        assert_eq!(method.name, "isWatchConnected");
        assert!(method.data[ANY_PLATFORM].contents.is_none());
    }

    #[test]
    fn test_archive_dir() {
        assert_eq!(archive_dir("javadoc/com/getpebble/android/kit/PebbleKit.html"), "com/getpebble/android/kit");
        assert_eq!(archive_dir("javadoc/constant-values.html"), "");
    }

    #[test]
    fn test_missing_overview_is_fatal() {
        let config = HtmlSourceConfig {
            archive: "unused".into(),
            url_root: None,
        };
        let archive = Archive::from_entries("empty", Vec::<(String, String)>::new());
        let mut source = DocumentationAndroid::with_archive(config, archive);
        let mut diag = DiagnosticsCollector::new();
        assert!(matches!(source.parse(&mut diag), Err(DocsError::MissingEntry { .. })));
    }
}
