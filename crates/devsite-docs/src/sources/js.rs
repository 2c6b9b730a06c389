//! JavaScript API documentation from JSON module lists
//!
//! The input is a list of modules, each with members grouped by category:
//!
//! ```json
//! [{"name": "rocky", "summary": "...", "members": {
//!     "functions": [{"name": "on", "kind": "function", "params": [...]}]
//! }}]
//! ```
//!
//! Summaries and descriptions are markdown; they are rendered with
//! double-backtick resolution once the symbol table is complete.

use crate::config::{url_root_or_default, JsSourceConfig};
use crate::diagnostics::{DiagnosticsCollector, DocsError, DocsResult};
use crate::language::AdapterId;
use crate::node::{DocNode, DocNodeDef, MemberKind, PlatformData, ANY_PLATFORM};
use crate::output::{Branch, Page, PageContent};
use crate::prose::{ProseOptions, ProseRenderer};
use crate::sources::{DocumentationSource, SourceCore, SourceOutput};
use crate::symbols::{Symbol, SymbolTable};
use crate::transform::plain_text;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

/// Module entry of the JSON input
#[derive(Debug, Clone, Deserialize)]
pub struct JsModuleDef {
    pub name: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Members by category (`functions`, `typedefs`, `members`...)
    #[serde(default)]
    pub members: IndexMap<String, Vec<JsMemberDef>>,
}

/// Member entry of the JSON input
#[derive(Debug, Clone, Deserialize)]
pub struct JsMemberDef {
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub type_info: Value,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub returns: Value,
    #[serde(default)]
    pub properties: Value,
}

enum JsInput {
    File(PathBuf),
    Text(String),
}

/// JSON source for the `rockyjs` and `pebblekit_js` slots
pub struct DocumentationJs {
    core: SourceCore,
    input: Option<JsInput>,
    url_root: String,
    preview: bool,
    prose: ProseOptions,
    modules: Vec<DocNode>,
}

impl DocumentationJs {
    pub fn new(adapter: AdapterId, config: JsSourceConfig, prose: ProseOptions) -> DocsResult<Self> {
        Self::build(
            adapter,
            JsInput::File(config.json),
            config.url_root.as_deref(),
            config.preview,
            prose,
        )
    }

    /// Source over JSON text already in memory
    pub fn from_json(
        adapter: AdapterId,
        json: impl Into<String>,
        preview: bool,
        prose: ProseOptions,
    ) -> DocsResult<Self> {
        Self::build(adapter, JsInput::Text(json.into()), None, preview, prose)
    }

    fn build(
        adapter: AdapterId,
        input: JsInput,
        url_root: Option<&str>,
        preview: bool,
        prose: ProseOptions,
    ) -> DocsResult<Self> {
        if !matches!(adapter, AdapterId::RockyJs | AdapterId::PebbleKitJs) {
            return Err(DocsError::config(format!("{} is not a JSON source", adapter)));
        }
        Ok(Self {
            core: SourceCore::new(adapter),
            input: Some(input),
            url_root: url_root_or_default(adapter, url_root),
            preview,
            prose,
            modules: Vec::new(),
        })
    }

    /// Modules, one group node each
    pub fn modules(&self) -> &[DocNode] {
        &self.modules
    }

    fn module_node(&self, def: JsModuleDef) -> DocNode {
        let path = format!("{}/", def.name);
        let url = format!("{}{}", self.url_root, path);
        let mut module = DocNode::new(DocNodeDef::group(), &def.name, &path, &url);
        module.add_platform(ANY_PLATFORM, &def.name, None);
        module.data.insert(
            ANY_PLATFORM.to_string(),
            PlatformData {
                summary: def.summary.unwrap_or_default(),
                description: def.description.unwrap_or_default(),
                ..Default::default()
            },
        );

        let mut position = 0;
        for (category, members) in def.members {
            for member in members {
                let kind = MemberKind::from_js(member.kind.as_deref().unwrap_or("member"));
                let member_path = format!("{}#{}", path, member.name);
                let member_url = format!("{}#{}", url, member.name);
                let mut node = DocNode::new(DocNodeDef::Member { kind }, &member.name, member_path, member_url)
                    .at_position(position);
                position += 1;
                node.add_platform(ANY_PLATFORM, format!("{}.{}", def.name, member.name), None);

                let mut details = IndexMap::new();
                details.insert("category".to_string(), Value::String(category.clone()));
                for (key, value) in [
                    ("type", member.type_info),
                    ("params", member.params),
                    ("returns", member.returns),
                    ("properties", member.properties),
                ] {
                    if !value.is_null() {
                        details.insert(key.to_string(), value);
                    }
                }
                node.data.insert(
                    ANY_PLATFORM.to_string(),
                    PlatformData {
                        summary: member.summary.unwrap_or_default(),
                        description: member.description.unwrap_or_default(),
                        details,
                        ..Default::default()
                    },
                );
                module.children.push(node);
            }
        }
        module
    }

    fn summary_of(node: &DocNode) -> String {
        node.data
            .get(ANY_PLATFORM)
            .map(|d| plain_text(&d.summary))
            .unwrap_or_default()
    }
}

/// Render markdown under every `description` key
fn render_descriptions(value: &mut Value, renderer: &ProseRenderer<'_>, page: &str, diag: &mut DiagnosticsCollector) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                match entry {
                    Value::String(text) if key == "description" => {
                        *text = renderer.render(text, page, diag);
                    }
                    other => render_descriptions(other, renderer, page, diag),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                render_descriptions(item, renderer, page, diag);
            }
        }
        _ => {}
    }
}

fn render_data(data: &mut PlatformData, renderer: &ProseRenderer<'_>, page: &str, diag: &mut DiagnosticsCollector) {
    data.summary = renderer.render_inline(&data.summary, page, diag);
    data.description = renderer.render(&data.description, page, diag);
    for value in data.details.values_mut() {
        render_descriptions(value, renderer, page, diag);
    }
}

impl DocumentationSource for DocumentationJs {
    fn core(&self) -> &SourceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SourceCore {
        &mut self.core
    }

    fn read(&mut self, _diag: &mut DiagnosticsCollector) -> DocsResult<()> {
        let (origin, text) = match self.input.take() {
            Some(JsInput::Text(text)) => ("<memory>".to_string(), text),
            Some(JsInput::File(path)) => {
                if !path.exists() {
                    return Err(DocsError::ArchiveNotFound(path));
                }
                (path.display().to_string(), fs::read_to_string(&path)?)
            }
            None => return Err(DocsError::other(format!("{} has no input", self.adapter()))),
        };
        let defs: Vec<JsModuleDef> =
            serde_json::from_str(&text).map_err(|e| DocsError::parse(&origin, e.to_string()))?;

        self.modules = defs.into_iter().map(|def| self.module_node(def)).collect();
        tracing::info!(source = %self.adapter(), origin = %origin, modules = self.modules.len(), "parsed JSON modules");
        Ok(())
    }

    fn collect_symbols(&self) -> Vec<Symbol> {
        let language = self.language();
        self.modules
            .iter()
            .flat_map(|module| module.children.iter())
            .map(|member| {
                Symbol::new(&member.name, &member.url, member.kind_name(), language)
                    .with_summary(Self::summary_of(member))
            })
            .collect()
    }

    fn transform(&mut self, table: &SymbolTable, diag: &mut DiagnosticsCollector) -> DocsResult<()> {
        let renderer = ProseRenderer::new(table, self.prose.clone());
        for module in &mut self.modules {
            let page = module.url.clone();
            module.walk_mut(&mut |node| {
                if let Some(data) = node.data.get_mut(ANY_PLATFORM) {
                    render_data(data, &renderer, &page, diag);
                }
            });
        }
        Ok(())
    }

    fn build_output(&self) -> DocsResult<SourceOutput> {
        let symbols = self.collect_symbols();
        let pages = self
            .modules
            .iter()
            .map(|module| Page {
                url: module.url.clone(),
                title: module.name.clone(),
                language: self.language().to_string(),
                layout: "js".to_string(),
                platforms: Vec::new(),
                content: PageContent::JsModule {
                    module: module.clone(),
                    preview: self.preview,
                },
            })
            .collect();
        let tree = self
            .modules
            .iter()
            .map(|module| {
                Branch::new(&module.name, &module.url)
                    .with_summary(Self::summary_of(module))
                    .with_children(
                        module
                            .children
                            .iter()
                            .map(|m| Branch::new(&m.name, &m.url).with_summary(Self::summary_of(m)))
                            .collect(),
                    )
            })
            .collect();

        Ok(SourceOutput {
            symbols,
            pages,
            tree,
            redirects: Vec::new(),
        })
    }
}
