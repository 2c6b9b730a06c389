//! Documentation source adapters
//!
//! Every input format is read by one [`DocumentationSource`]. Sources move
//! through a fixed lifecycle:
//!
//! ```text
//! Unloaded --parse--> Parsed --resolve(table)--> Resolved --finalize--> Finalized
//! ```
//!
//! Symbol entries and id mappings are available once parsed; descriptions
//! are only rendered in `resolve`, which needs the [`SymbolTable`] built from
//! every source. The emitted artifacts are computed once and cached.

pub mod android;
pub mod c;
pub mod ios;
pub mod js;

use crate::diagnostics::{DiagnosticsCollector, DocsError, DocsResult};
use crate::fragment::Element;
use crate::language::AdapterId;
use crate::node::{DocNode, DocNodeDef, PlatformData, ANY_PLATFORM};
use crate::output::{Branch, Page, PageContent, Redirect};
use crate::symbols::{IdMapping, Symbol, SymbolTable};
use serde::Serialize;
use serde_json::Value;
use std::cell::OnceCell;
use std::collections::HashSet;

pub use android::DocumentationAndroid;
pub use c::DocumentationC;
pub use ios::DocumentationIos;
pub use js::DocumentationJs;

/// Lifecycle position of a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AdapterState {
    Unloaded,
    Parsed,
    Resolved,
    Finalized,
}

impl AdapterState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterState::Unloaded => "unloaded",
            AdapterState::Parsed => "parsed",
            AdapterState::Resolved => "resolved",
            AdapterState::Finalized => "finalized",
        }
    }
}

/// Artifacts one source contributes to the site
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceOutput {
    pub symbols: Vec<Symbol>,
    pub pages: Vec<Page>,
    pub tree: Vec<Branch>,
    pub redirects: Vec<Redirect>,
}

/// State shared by every source implementation
#[derive(Debug)]
pub struct SourceCore {
    adapter: AdapterId,
    state: AdapterState,
    output: OnceCell<SourceOutput>,
}

impl SourceCore {
    pub fn new(adapter: AdapterId) -> Self {
        Self {
            adapter,
            state: AdapterState::Unloaded,
            output: OnceCell::new(),
        }
    }

    pub fn adapter(&self) -> AdapterId {
        self.adapter
    }

    pub fn state(&self) -> AdapterState {
        self.state
    }

    /// Fail unless the source is exactly in `expected`
    pub fn require(&self, expected: AdapterState) -> DocsResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.state_error(expected))
        }
    }

    /// Fail unless the source has reached `expected`
    pub fn require_at_least(&self, expected: AdapterState) -> DocsResult<()> {
        if self.state >= expected {
            Ok(())
        } else {
            Err(self.state_error(expected))
        }
    }

    fn state_error(&self, expected: AdapterState) -> DocsError {
        DocsError::State {
            source_name: self.adapter.to_string(),
            expected: expected.as_str(),
            actual: self.state.as_str(),
        }
    }

    fn advance(&mut self, to: AdapterState) {
        tracing::debug!(source = %self.adapter, from = self.state.as_str(), to = to.as_str(), "source state");
        self.state = to;
    }
}

/// A format-specific adapter into the common node and symbol model
pub trait DocumentationSource {
    fn core(&self) -> &SourceCore;
    fn core_mut(&mut self) -> &mut SourceCore;

    /// Read the source material and build the node forest
    fn read(&mut self, diag: &mut DiagnosticsCollector) -> DocsResult<()>;

    /// Symbols known after reading, with unrendered summaries
    fn collect_symbols(&self) -> Vec<Symbol>;

    /// Raw ids and the urls they map to
    fn collect_ids(&self) -> Vec<IdMapping> {
        Vec::new()
    }

    /// Render every description against the complete table
    fn transform(&mut self, table: &SymbolTable, diag: &mut DiagnosticsCollector) -> DocsResult<()>;

    /// Build the emitted artifacts from the resolved forest
    fn build_output(&self) -> DocsResult<SourceOutput>;

    fn adapter(&self) -> AdapterId {
        self.core().adapter()
    }

    /// Language tag stamped on everything this source emits
    fn language(&self) -> &'static str {
        self.adapter().language()
    }

    fn state(&self) -> AdapterState {
        self.core().state()
    }

    /// Unloaded → Parsed
    fn parse(&mut self, diag: &mut DiagnosticsCollector) -> DocsResult<()> {
        self.core().require(AdapterState::Unloaded)?;
        self.read(diag)?;
        self.core_mut().advance(AdapterState::Parsed);
        Ok(())
    }

    /// Parse-phase symbols, deduplicated by name and url
    fn symbol_entries(&self) -> DocsResult<Vec<Symbol>> {
        self.core().require_at_least(AdapterState::Parsed)?;
        Ok(dedup_symbols(self.collect_symbols()))
    }

    /// Parse-phase id mappings
    fn id_mappings(&self) -> DocsResult<Vec<IdMapping>> {
        self.core().require_at_least(AdapterState::Parsed)?;
        Ok(self.collect_ids())
    }

    /// Parsed → Resolved
    fn resolve(&mut self, table: &SymbolTable, diag: &mut DiagnosticsCollector) -> DocsResult<()> {
        self.core().require(AdapterState::Parsed)?;
        self.transform(table, diag)?;
        self.core_mut().advance(AdapterState::Resolved);
        Ok(())
    }

    /// Resolved → Finalized, building the cached output
    fn finalize(&mut self) -> DocsResult<()> {
        self.core().require(AdapterState::Resolved)?;
        self.output()?;
        self.core_mut().advance(AdapterState::Finalized);
        Ok(())
    }

    /// Emitted artifacts, built on first access. Symbols are deduplicated
    /// by name and url like the parse-phase entries.
    fn output(&self) -> DocsResult<&SourceOutput> {
        let core = self.core();
        if let Some(output) = core.output.get() {
            return Ok(output);
        }
        core.require_at_least(AdapterState::Resolved)?;
        let mut built = self.build_output()?;
        built.symbols = dedup_symbols(built.symbols);
        tracing::info!(
            source = %core.adapter(),
            symbols = built.symbols.len(),
            pages = built.pages.len(),
            redirects = built.redirects.len(),
            "built source output"
        );
        Ok(core.output.get_or_init(|| built))
    }

    fn symbols(&self) -> DocsResult<&[Symbol]> {
        Ok(&self.output()?.symbols)
    }

    fn pages(&self) -> DocsResult<&[Page]> {
        Ok(&self.output()?.pages)
    }

    fn tree(&self) -> DocsResult<&[Branch]> {
        Ok(&self.output()?.tree)
    }

    fn redirects(&self) -> DocsResult<&[Redirect]> {
        Ok(&self.output()?.redirects)
    }
}

/// Node for a document scraped from a pre-rendered HTML archive.
///
/// The archive entry is recorded as the node's raw id and the unprocessed
/// content element as its raw fragment. `contents` is filled in on resolve.
pub fn scraped_node(
    def: DocNodeDef,
    name: impl Into<String>,
    path: impl Into<String>,
    url: impl Into<String>,
    entry: &str,
    body: Element,
) -> DocNode {
    let mut node = DocNode::new(def, name, path, url);
    node.add_platform(ANY_PLATFORM, entry, Some(body));
    node.data.insert(ANY_PLATFORM.to_string(), PlatformData::default());
    node
}

/// Summary of a node that does not vary per platform
pub fn any_summary(node: &DocNode) -> String {
    node.data
        .get(ANY_PLATFORM)
        .map(|d| d.summary.clone())
        .unwrap_or_default()
}

fn leaf_branch(node: &DocNode) -> Branch {
    Branch::new(&node.name, &node.url).with_summary(any_summary(node))
}

/// Navigation entry for a node and its direct children
pub fn node_branch(node: &DocNode) -> Branch {
    leaf_branch(node).with_children(node.children.iter().map(leaf_branch).collect())
}

/// Html page for a scraped node, once its contents have been rendered
pub fn scraped_page(node: &DocNode, url: String, language: &str, layout: &str, group: Option<Branch>) -> Option<Page> {
    let data = node.data.get(ANY_PLATFORM)?;
    let contents = data.contents.clone()?;
    let title = data
        .details
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(&node.name)
        .to_string();
    Some(Page {
        url,
        title,
        language: language.to_string(),
        layout: layout.to_string(),
        platforms: Vec::new(),
        content: PageContent::Html { contents, group },
    })
}

/// Keep the first symbol for every (name, url) pair
pub fn dedup_symbols(symbols: Vec<Symbol>) -> Vec<Symbol> {
    let mut seen = HashSet::new();
    symbols
        .into_iter()
        .filter(|s| seen.insert((s.name.clone(), s.url.clone())))
        .collect()
}

/// Url of the page a symbol url points into
pub(crate) fn page_of(url: &str) -> &str {
    url.split('#').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LanguagePriority;
    use pretty_assertions::assert_eq;

    struct Fixed {
        core: SourceCore,
        builds: std::cell::Cell<usize>,
    }

    impl DocumentationSource for Fixed {
        fn core(&self) -> &SourceCore {
            &self.core
        }
        fn core_mut(&mut self) -> &mut SourceCore {
            &mut self.core
        }
        fn read(&mut self, _diag: &mut DiagnosticsCollector) -> DocsResult<()> {
            Ok(())
        }
        fn collect_symbols(&self) -> Vec<Symbol> {
            vec![
                Symbol::new("a", "/a/", "member", self.language()),
                Symbol::new("a", "/a/", "member", self.language()),
            ]
        }
        fn transform(&mut self, _table: &SymbolTable, _diag: &mut DiagnosticsCollector) -> DocsResult<()> {
            Ok(())
        }
        fn build_output(&self) -> DocsResult<SourceOutput> {
            self.builds.set(self.builds.get() + 1);
            Ok(SourceOutput {
                symbols: self.collect_symbols(),
                ..Default::default()
            })
        }
    }

    fn fixed() -> Fixed {
        Fixed {
            core: SourceCore::new(AdapterId::PebbleKitJs),
            builds: std::cell::Cell::new(0),
        }
    }

    #[test]
    fn test_lifecycle_order_is_enforced() {
        let mut source = fixed();
        let mut diag = DiagnosticsCollector::new();
        let table = SymbolTable::builder(LanguagePriority::default()).build();

        assert!(matches!(source.symbol_entries(), Err(DocsError::State { .. })));
        assert!(matches!(source.resolve(&table, &mut diag), Err(DocsError::State { .. })));

        source.parse(&mut diag).unwrap();
        assert!(source.parse(&mut diag).is_err());
        assert!(source.symbols().is_err());
        assert_eq!(source.symbol_entries().unwrap().len(), 1);

        source.resolve(&table, &mut diag).unwrap();
        source.finalize().unwrap();
        assert_eq!(source.state(), AdapterState::Finalized);
    }

    #[test]
    fn test_output_is_cached() {
        let mut source = fixed();
        let mut diag = DiagnosticsCollector::new();
        let table = SymbolTable::builder(LanguagePriority::default()).build();
        source.parse(&mut diag).unwrap();
        source.resolve(&table, &mut diag).unwrap();

        let first = source.symbols().unwrap().to_vec();
        let second = source.symbols().unwrap().to_vec();
        assert_eq!(first, second);
        source.finalize().unwrap();
        assert_eq!(source.builds.get(), 1);
    }

    #[test]
    fn test_output_symbols_are_deduplicated() {
        let mut source = fixed();
        let mut diag = DiagnosticsCollector::new();
        let table = SymbolTable::builder(LanguagePriority::default()).build();
        source.parse(&mut diag).unwrap();
        source.resolve(&table, &mut diag).unwrap();
        source.finalize().unwrap();

        assert_eq!(source.symbols().unwrap(), source.symbol_entries().unwrap().as_slice());
        assert_eq!(source.symbols().unwrap().len(), 1);
    }

    #[test]
    fn test_scraped_node_helpers() {
        let body = Element::new("div").with_text("body");
        let mut class = scraped_node(
            DocNodeDef::Class { kind: crate::node::ClassKind::Class },
            "PBWatch",
            "Classes/PBWatch/",
            "/docs/pebblekit-ios/Classes/PBWatch/",
            "Classes/PBWatch.html",
            body,
        );
        assert_eq!(class.id, "Classes/PBWatch.html");
        assert!(scraped_page(&class, class.url.clone(), "pebblekit_ios", "pebblekit-ios", None).is_none());

        class.data[ANY_PLATFORM].summary = "A watch.".into();
        class.data[ANY_PLATFORM].contents = Some("<div>body</div>".into());
        let page = scraped_page(&class, class.url.clone(), "pebblekit_ios", "pebblekit-ios", None).unwrap();
        assert_eq!(page.title, "PBWatch");
        assert_eq!(node_branch(&class).summary.as_deref(), Some("A watch."));
    }

    #[test]
    fn test_page_of() {
        assert_eq!(page_of("/docs/c/Foundation/#app_event_loop"), "/docs/c/Foundation/");
        assert_eq!(page_of("/docs/c/Foundation/"), "/docs/c/Foundation/");
    }
}
