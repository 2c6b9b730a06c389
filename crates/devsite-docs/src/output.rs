//! Pipeline artifacts: pages, navigation tree, redirects
//!
//! Everything here is plain serializable data handed to the site renderer.
//! The validation helpers check the cross-artifact properties the renderer
//! relies on (unique symbols, every symbol has a page, well formed tree).

use crate::diagnostics::{Diagnostic, DocsResult};
use crate::node::{DocNode, PlatformId};
use crate::symbols::{Symbol, SymbolTable};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Body of a generated page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageContent {
    /// A C API group with its members and classes
    CGroup {
        group: DocNode,
        /// Group names from the top-level group down to this one
        menu_path: Vec<String>,
    },
    /// A JavaScript module
    JsModule { module: DocNode, preview: bool },
    /// Pre-rendered HTML scraped from a generated archive
    Html {
        contents: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        group: Option<Branch>,
    },
}

/// A generated documentation page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub url: String,
    pub title: String,
    pub language: String,
    /// Template the renderer should use
    pub layout: String,
    pub platforms: Vec<PlatformId>,
    pub content: PageContent,
}

impl Page {
    /// Template context for the renderer.
    ///
    /// Node contexts carry their `uniform` flag, judged against the page's
    /// platforms, and group-like nodes get
    /// their children partitioned by kind (`function`, `enum`, `struct`...).
    pub fn context(&self) -> DocsResult<Value> {
        let mut ctx = Map::new();
        ctx.insert("url".into(), json!(self.url));
        ctx.insert("title".into(), json!(self.title));
        ctx.insert("language".into(), json!(self.language));
        ctx.insert("layout".into(), json!(self.layout));
        ctx.insert("platforms".into(), json!(self.platforms));

        match &self.content {
            PageContent::CGroup { group, menu_path } => {
                ctx.insert("group".into(), group_context(group, &self.platforms)?);
                ctx.insert("menu_path".into(), json!(menu_path));
            }
            PageContent::JsModule { module, preview } => {
                ctx.insert("js_module".into(), group_context(module, &self.platforms)?);
                ctx.insert("preview".into(), json!(preview));
            }
            PageContent::Html { contents, group } => {
                ctx.insert("contents".into(), json!(contents));
                if let Some(group) = group {
                    ctx.insert("group".into(), serde_json::to_value(group)?);
                }
            }
        }
        Ok(Value::Object(ctx))
    }
}

fn group_context(node: &DocNode, platforms: &[PlatformId]) -> DocsResult<Value> {
    let mut value = node.to_context_on(platforms)?;
    let mut by_kind: IndexMap<&str, Vec<Value>> = IndexMap::new();
    for child in &node.children {
        by_kind
            .entry(child.kind_name())
            .or_default()
            .push(child.to_context_on(platforms)?);
    }
    if let Value::Object(ref mut map) = value {
        map.insert("by_kind".into(), serde_json::to_value(by_kind)?);
    }
    Ok(value)
}

/// Navigation tree entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub children: Vec<Branch>,
}

impl Branch {
    /// Create a leaf branch
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            summary: None,
            children: Vec::new(),
        }
    }

    /// Builder: set the summary
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        let summary = summary.into();
        self.summary = (!summary.is_empty()).then_some(summary);
        self
    }

    /// Builder: set the children
    pub fn with_children(mut self, children: Vec<Branch>) -> Self {
        self.children = children;
        self
    }

    /// Descriptions of every malformed entry in this subtree
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        self.collect_problems("", &mut problems);
        problems
    }

    fn collect_problems(&self, trail: &str, problems: &mut Vec<String>) {
        let here = format!("{}/{}", trail, self.name);
        if self.name.trim().is_empty() {
            problems.push(format!("{}: empty name", here));
        }
        if self.url.trim().is_empty() {
            problems.push(format!("{}: empty url", here));
        }
        for child in &self.children {
            child.collect_problems(&here, problems);
        }
    }
}

/// A permanent redirect from an old url
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub from: String,
    pub to: String,
}

impl Redirect {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Whether following the redirect would land on itself
    pub fn is_loop(&self) -> bool {
        if self.from == self.to {
            return true;
        }
        // `dir/index.html` is served as `dir/`
        match self.from.strip_suffix("index.html") {
            Some(dir) => {
                let target = self.to.split('#').next().unwrap_or("");
                dir == target || dir.trim_end_matches('/') == target.trim_end_matches('/')
            }
            None => false,
        }
    }
}

/// Everything a pipeline run produces
#[derive(Debug, Default, Serialize)]
pub struct DocsOutput {
    pub symbols: Vec<Symbol>,
    pub pages: Vec<Page>,
    /// Navigation trees keyed by language
    pub tree: IndexMap<String, Vec<Branch>>,
    pub redirects: Vec<Redirect>,
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
    /// Table the run resolved against, for rendering further prose
    #[serde(skip)]
    pub table: SymbolTable,
}

impl DocsOutput {
    /// Page with the given url
    pub fn page(&self, url: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.url == url)
    }

    /// Write `symbols.json`, `pages.json`, `tree.json` and `redirects.json`
    pub fn write_json(&self, dir: &Path) -> DocsResult<()> {
        fs::create_dir_all(dir)?;
        fs::write(
            dir.join("symbols.json"),
            serde_json::to_string_pretty(&self.symbols)?,
        )?;
        let pages = self
            .pages
            .iter()
            .map(Page::context)
            .collect::<DocsResult<Vec<_>>>()?;
        fs::write(dir.join("pages.json"), serde_json::to_string_pretty(&pages)?)?;
        fs::write(dir.join("tree.json"), serde_json::to_string_pretty(&self.tree)?)?;
        fs::write(
            dir.join("redirects.json"),
            serde_json::to_string_pretty(&self.redirects)?,
        )?;
        tracing::info!(
            dir = %dir.display(),
            symbols = self.symbols.len(),
            pages = self.pages.len(),
            "wrote documentation data"
        );
        Ok(())
    }
}

/// Pairs of symbols sharing both name and url
pub fn find_clashes(symbols: &[Symbol]) -> Vec<(&Symbol, &Symbol)> {
    let mut seen: IndexMap<(&str, &str), &Symbol> = IndexMap::new();
    let mut clashes = Vec::new();
    for symbol in symbols {
        match seen.get(&(symbol.name.as_str(), symbol.url.as_str())) {
            Some(first) => clashes.push((*first, symbol)),
            None => {
                seen.insert((symbol.name.as_str(), symbol.url.as_str()), symbol);
            }
        }
    }
    clashes
}

/// Symbols whose url (without fragment) matches no page
///
/// A page matches when its url equals the symbol path, the path with
/// `index.html` appended, or the path with a trailing slash. `%2B` in
/// symbol urls matches a literal `+` in page urls.
pub fn missing_pages<'a>(symbols: &'a [Symbol], pages: &[Page]) -> Vec<&'a Symbol> {
    let urls: HashSet<&str> = pages.iter().map(|p| p.url.as_str()).collect();
    symbols
        .iter()
        .filter(|symbol| {
            let path = symbol.url.split('#').next().unwrap_or("");
            let path = urlencoding::decode(path)
                .map(|p| p.into_owned())
                .unwrap_or_else(|_| path.to_string());
            let candidates = [
                path.clone(),
                format!("{}index.html", path),
                format!("{}/", path),
            ];
            !candidates.iter().any(|c| urls.contains(c.as_str()))
        })
        .collect()
}

/// Symbols not tagged with the language of the source that emitted them
pub fn mislabeled<'a>(symbols: &'a [Symbol], language: &str) -> Vec<&'a Symbol> {
    symbols.iter().filter(|s| s.language != language).collect()
}
