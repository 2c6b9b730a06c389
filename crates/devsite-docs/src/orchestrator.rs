//! DocsGenerator - runs every configured source through the pipeline
//!
//! Sources are parsed first, then their symbols and ids are frozen into one
//! [`SymbolTable`] that every source resolves its prose against. The
//! artifacts of all sources are collected into a single [`DocsOutput`] and
//! checked for cross-source problems.

use crate::config::SiteConfig;
use crate::diagnostics::{Diagnostic, DiagnosticsCollector, DocsResult};
use crate::language::{AdapterId, LanguagePriority};
use crate::output::{find_clashes, mislabeled, missing_pages, DocsOutput};
use crate::prose::ProseOptions;
use crate::sources::{
    DocumentationAndroid, DocumentationC, DocumentationIos, DocumentationJs, DocumentationSource,
};
use crate::symbols::SymbolTable;

/// The documentation pipeline
///
/// DocsGenerator coordinates a run:
/// 1. Parse every source
/// 2. Build the symbol table from all parsed sources
/// 3. Resolve cross references in every source
/// 4. Finalize and collect the artifacts
/// 5. Check the combined output
pub struct DocsGenerator {
    /// Sources in [`AdapterId::PRIORITY`] order
    sources: Vec<Box<dyn DocumentationSource>>,
    priority: LanguagePriority,
    skip_docs: bool,
    diagnostics: DiagnosticsCollector,
}

impl Default for DocsGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DocsGenerator {
    /// Generator with no sources
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            priority: LanguagePriority::default(),
            skip_docs: false,
            diagnostics: DiagnosticsCollector::new(),
        }
    }

    /// Generator with one source per configured table
    pub fn from_config(config: &SiteConfig) -> DocsResult<Self> {
        let prose = ProseOptions {
            baseurl: config.baseurl.clone(),
            skip_docs: config.skip_docs,
        };
        let sources = &config.sources;
        let mut generator = Self::new().skip_docs(config.skip_docs);

        for (adapter, c) in [(AdapterId::C, &sources.c), (AdapterId::CPreview, &sources.c_preview)] {
            match c {
                Some(c) => generator = generator.with_source(Box::new(DocumentationC::new(adapter, c.clone())?)),
                None => tracing::info!(source = %adapter, "source not configured"),
            }
        }
        for (adapter, js) in [
            (AdapterId::RockyJs, &sources.rocky_js),
            (AdapterId::PebbleKitJs, &sources.pebblekit_js),
        ] {
            match js {
                Some(js) => {
                    let source = DocumentationJs::new(adapter, js.clone(), prose.clone())?;
                    generator = generator.with_source(Box::new(source));
                }
                None => tracing::info!(source = %adapter, "source not configured"),
            }
        }
        match &sources.pebblekit_android {
            Some(android) => generator = generator.with_source(Box::new(DocumentationAndroid::new(android.clone()))),
            None => tracing::info!(source = %AdapterId::PebbleKitAndroid, "source not configured"),
        }
        match &sources.pebblekit_ios {
            Some(ios) => generator = generator.with_source(Box::new(DocumentationIos::new(ios.clone()))),
            None => tracing::info!(source = %AdapterId::PebbleKitIos, "source not configured"),
        }
        Ok(generator)
    }

    /// Add a source, keeping sources in priority order
    pub fn with_source(mut self, source: Box<dyn DocumentationSource>) -> Self {
        let rank = source.adapter().rank();
        let at = self
            .sources
            .iter()
            .position(|s| s.adapter().rank() > rank)
            .unwrap_or(self.sources.len());
        self.sources.insert(at, source);
        self
    }

    /// Skip generation entirely
    pub fn skip_docs(mut self, skip: bool) -> Self {
        self.skip_docs = skip;
        self
    }

    /// Adapters of the registered sources, in run order
    pub fn adapters(&self) -> Vec<AdapterId> {
        self.sources.iter().map(|s| s.adapter()).collect()
    }

    /// Diagnostics recorded by a run that has not been collected yet
    pub fn diagnostics(&self) -> &DiagnosticsCollector {
        &self.diagnostics
    }

    /// Run the pipeline
    pub fn run(&mut self) -> DocsResult<DocsOutput> {
        if self.skip_docs {
            tracing::info!("skip_docs is set, no documentation generated");
            return Ok(DocsOutput::default());
        }

        // Step 1: Parse
        for source in &mut self.sources {
            source.parse(&mut self.diagnostics)?;
        }

        // Step 2: Symbol table
        let mut builder = SymbolTable::builder(self.priority.clone());
        for source in &self.sources {
            builder.add_symbols(source.symbol_entries()?);
            builder.add_ids(source.language(), source.id_mappings()?, &mut self.diagnostics);
        }
        let table = builder.build();
        tracing::info!(symbols = table.len(), sources = self.sources.len(), "built symbol table");

        // Step 3: Resolve
        for source in &mut self.sources {
            source.resolve(&table, &mut self.diagnostics)?;
        }

        // Step 4: Finalize and collect
        let mut output = DocsOutput::default();
        for source in &mut self.sources {
            source.finalize()?;
            let language = source.language();
            let produced = source.output()?;
            for symbol in mislabeled(&produced.symbols, language) {
                self.diagnostics.add(
                    Diagnostic::error(format!("symbol is tagged {} in {} output", symbol.language, language))
                        .for_symbol(symbol.name.clone())
                        .with_code("mislabeled-symbol"),
                );
            }
            output.symbols.extend(produced.symbols.iter().cloned());
            output.pages.extend(produced.pages.iter().cloned());
            output.tree.insert(language.to_string(), produced.tree.clone());
            output.redirects.extend(produced.redirects.iter().cloned());
        }

        // Step 5: Check
        self.check(&output);
        output.diagnostics = self.diagnostics.take();
        output.table = table;

        tracing::info!(
            symbols = output.symbols.len(),
            pages = output.pages.len(),
            redirects = output.redirects.len(),
            "documentation generated"
        );
        Ok(output)
    }

    fn check(&mut self, output: &DocsOutput) {
        for symbol in output.symbols.iter().filter(|s| s.summary.is_empty()) {
            self.diagnostics.add(
                Diagnostic::hint(format!("{} has no summary", symbol.name))
                    .on_page(symbol.url.clone())
                    .for_symbol(symbol.name.clone())
                    .with_code("missing-summary"),
            );
        }
        for (first, second) in find_clashes(&output.symbols) {
            self.diagnostics.add(
                Diagnostic::warning(format!(
                    "{} is emitted by both {} and {}",
                    first.name, first.language, second.language
                ))
                .on_page(first.url.clone())
                .for_symbol(first.name.clone())
                .with_code("symbol-clash"),
            );
        }
        for symbol in missing_pages(&output.symbols, &output.pages) {
            self.diagnostics.add(
                Diagnostic::warning(format!("no page for {}", symbol.url))
                    .for_symbol(symbol.name.clone())
                    .with_code("missing-page"),
            );
        }
        for (language, tree) in &output.tree {
            for problem in tree.iter().flat_map(|branch| branch.validate()) {
                self.diagnostics.add(
                    Diagnostic::warning(format!("{} tree: {}", language, problem)).with_code("invalid-tree"),
                );
            }
        }
    }
}
