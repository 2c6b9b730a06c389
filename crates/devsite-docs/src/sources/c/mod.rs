//! C API documentation from Doxygen XML
//!
//! Each platform has its own Doxygen run (`aplite/xml/...`, `basalt/xml/...`).
//! The platforms are read separately and merged by name, so one page
//! documents every platform and records where they differ.

pub mod doxygen;

use crate::archive::Archive;
use crate::config::{url_root_or_default, CSourceConfig};
use crate::diagnostics::{Diagnostic, DiagnosticsCollector, DocsError, DocsResult};
use crate::fragment::Element;
use crate::language::AdapterId;
use crate::merge::PlatformMerger;
use crate::node::{DocNode, DocNodeDef, PlatformId};
use crate::output::{Branch, Page, PageContent, Redirect};
use crate::sources::{DocumentationSource, SourceCore, SourceOutput};
use crate::symbols::{IdMapping, Symbol, SymbolTable};
use crate::transform::{plain_text, DoxygenTransformer, TransformOptions};
use doxygen::{entry_path, load_compound, placeholder_shell, DoxygenReader};
use indexmap::IndexMap;

/// Doxygen source for the `c` and `c_preview` slots
pub struct DocumentationC {
    core: SourceCore,
    config: CSourceConfig,
    url_root: String,
    options: TransformOptions,
    archive: Option<Archive>,
    groups: Vec<DocNode>,
}

impl DocumentationC {
    /// Source reading `config.archive` from disk
    pub fn new(adapter: AdapterId, config: CSourceConfig) -> DocsResult<Self> {
        if !matches!(adapter, AdapterId::C | AdapterId::CPreview) {
            return Err(DocsError::config(format!("{} is not a Doxygen source", adapter)));
        }
        let url_root = url_root_or_default(adapter, config.url_root.as_deref());
        let options = config.transform_options();
        Ok(Self {
            core: SourceCore::new(adapter),
            config,
            url_root,
            options,
            archive: None,
            groups: Vec::new(),
        })
    }

    /// Source reading an archive that is already in memory
    pub fn with_archive(adapter: AdapterId, config: CSourceConfig, archive: Archive) -> DocsResult<Self> {
        let mut source = Self::new(adapter, config)?;
        source.archive = Some(archive);
        Ok(source)
    }

    /// Merged top-level groups
    pub fn groups(&self) -> &[DocNode] {
        &self.groups
    }

    pub fn url_root(&self) -> &str {
        &self.url_root
    }

    fn platforms(&self) -> &[PlatformId] {
        &self.config.platforms
    }

    /// Empty stand-ins for top-level groups some platform lacks, keyed by
    /// platform then group id
    fn placeholders(
        &self,
        archive: &Archive,
        diag: &mut DiagnosticsCollector,
    ) -> DocsResult<IndexMap<PlatformId, IndexMap<String, Element>>> {
        let mut placeholders: IndexMap<PlatformId, IndexMap<String, Element>> = IndexMap::new();
        for id in &self.config.groups {
            let file = format!("group___{}.xml", id);
            let (present, missing): (Vec<&PlatformId>, Vec<&PlatformId>) = self
                .platforms()
                .iter()
                .partition(|p| entry_path(archive, p, &file).is_some());

            let Some(donor) = present.last() else {
                return Err(DocsError::missing_entry(archive.name(), format!("*/xml/{}", file)));
            };
            if missing.is_empty() {
                continue;
            }

            let shell = placeholder_shell(&load_compound(archive, donor, &file)?);
            for platform in missing {
                diag.add(
                    Diagnostic::warning(format!(
                        "group {} is missing on {}, using an empty placeholder from {}",
                        id, platform, donor
                    ))
                    .for_symbol(id.clone())
                    .with_code("platform-placeholder"),
                );
                placeholders
                    .entry(platform.clone())
                    .or_default()
                    .insert(id.clone(), shell.clone());
            }
        }
        Ok(placeholders)
    }

    fn walk_groups<'a>(&'a self, f: &mut impl FnMut(&'a DocNode, &[String])) {
        fn walk<'a>(group: &'a DocNode, trail: &mut Vec<String>, f: &mut impl FnMut(&'a DocNode, &[String])) {
            trail.push(group.name.clone());
            f(group, trail.as_slice());
            for sub in group.groups() {
                walk(sub, trail, f);
            }
            trail.pop();
        }
        let mut trail = Vec::new();
        for group in &self.groups {
            walk(group, &mut trail, f);
        }
    }

    fn symbols_with(&self, summary: impl Fn(&DocNode) -> String) -> Vec<Symbol> {
        let language = self.language();
        let symbol = |node: &DocNode| {
            Symbol::new(&node.name, &node.url, node.kind_name(), language)
                .with_id(&node.id)
                .with_summary(summary(node))
        };
        let mut symbols = Vec::new();
        self.walk_groups(&mut |group, _| {
            symbols.push(symbol(group));
            for child in &group.children {
                match child.def {
                    DocNodeDef::Member { .. } => {
                        symbols.push(symbol(child));
                        symbols.extend(child.children.iter().map(&symbol));
                    }
                    DocNodeDef::Class { .. } => symbols.push(symbol(child)),
                    _ => {}
                }
            }
        });
        symbols
    }

    fn branch(&self, group: &DocNode) -> Branch {
        Branch::new(&group.name, &group.url)
            .with_summary(self.rendered_summary(group))
            .with_children(group.groups().iter().map(|g| self.branch(g)).collect())
    }

    fn rendered_summary(&self, node: &DocNode) -> String {
        node.preferred_data(self.platforms())
            .map(|d| plain_text(&d.summary))
            .unwrap_or_default()
    }
}

/// Render every platform of `node` and its descendants
fn transform_node(
    node: &mut DocNode,
    page: &str,
    table: &SymbolTable,
    language: &str,
    options: &TransformOptions,
    diag: &mut DiagnosticsCollector,
) {
    for (platform, raw) in &node.raw {
        let transformer = DoxygenTransformer::new(table, language, platform, page, options);
        let data = match &node.def {
            DocNodeDef::Group { .. } | DocNodeDef::Class { .. } => transformer.compound_data(raw, diag),
            DocNodeDef::Member { kind } => transformer.member_data(*kind, raw, diag),
            DocNodeDef::Field => transformer.field_data(raw, diag),
            DocNodeDef::EnumValue => transformer.enum_value_data(raw, diag),
        };
        node.data.insert(platform.clone(), data);
    }
    for child in &mut node.children {
        transform_node(child, page, table, language, options, diag);
    }
    if let Some(groups) = node.groups_mut() {
        for group in groups {
            let page = group.url.clone();
            transform_node(group, &page, table, language, options, diag);
        }
    }
}

impl DocumentationSource for DocumentationC {
    fn core(&self) -> &SourceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SourceCore {
        &mut self.core
    }

    fn read(&mut self, diag: &mut DiagnosticsCollector) -> DocsResult<()> {
        let archive = match self.archive.take() {
            Some(archive) => archive,
            None => Archive::open(&self.config.archive)?,
        };
        let placeholders = self.placeholders(&archive, diag)?;
        let empty = IndexMap::new();

        let merger = PlatformMerger::new(self.platforms().iter().cloned());
        let groups = merger.merge_forest(|platform| {
            let overrides = placeholders.get(platform).unwrap_or(&empty);
            DoxygenReader::new(&archive, platform, &self.url_root, overrides)
                .read_groups(&self.config.groups)
        })?;

        tracing::info!(
            source = %self.adapter(),
            archive = archive.name(),
            groups = groups.len(),
            "parsed doxygen"
        );
        self.groups = groups;
        Ok(())
    }

    fn collect_symbols(&self) -> Vec<Symbol> {
        let platforms = self.platforms();
        self.symbols_with(|node| node.summary(platforms))
    }

    fn collect_ids(&self) -> Vec<IdMapping> {
        let mut ids = Vec::new();
        for group in &self.groups {
            group.walk(&mut |node| {
                for id in node.platform_ids.values() {
                    if !id.is_empty() {
                        ids.push(IdMapping::new(id, &node.url));
                    }
                }
            });
        }
        ids
    }

    fn transform(&mut self, table: &SymbolTable, diag: &mut DiagnosticsCollector) -> DocsResult<()> {
        let language = self.adapter().language();
        for group in &mut self.groups {
            let page = group.url.clone();
            transform_node(group, &page, table, language, &self.options, diag);
        }
        Ok(())
    }

    fn build_output(&self) -> DocsResult<SourceOutput> {
        let symbols = self.symbols_with(|node| self.rendered_summary(node));

        let mut pages = Vec::new();
        self.walk_groups(&mut |group, trail| {
            pages.push(Page {
                url: group.url.clone(),
                title: group.name.clone(),
                language: self.language().to_string(),
                layout: "c".to_string(),
                platforms: self.platforms().to_vec(),
                content: PageContent::CGroup {
                    group: group.clone(),
                    menu_path: trail.to_vec(),
                },
            });
        });

        let tree = self.groups.iter().map(|g| self.branch(g)).collect();

        let mut redirects: Vec<Redirect> = Vec::new();
        for mapping in self.collect_ids() {
            if mapping.id.contains("_1") {
                continue;
            }
            let redirect = Redirect::new(format!("{}{}.html", self.url_root, mapping.id), mapping.url);
            if redirect.is_loop() || redirects.iter().any(|r| r.from == redirect.from) {
                continue;
            }
            redirects.push(redirect);
        }

        Ok(SourceOutput {
            symbols,
            pages,
            tree,
            redirects,
        })
    }
}
