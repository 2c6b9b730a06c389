//! Symbol table and cross-reference lookup
//!
//! The table is built once from every source's parse-phase symbols and id
//! mappings, then handed by reference to each source's resolve phase. It is
//! never mutated after construction.

use crate::diagnostics::{Diagnostic, DiagnosticsCollector};
use crate::language::LanguagePriority;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

lazy_static! {
    /// `lang:Name`, where the language prefix is optional. Prefixes are
    /// lowercase ids with underscores (`c_preview`, `pebblekit_js`), so a
    /// capitalized or numbered prefix stays part of the name.
    static ref SYMBOL_MARKER: Regex = Regex::new(r"^([a-z_]*:)?([A-Za-z0-9_:\. ]*)").unwrap();
}

/// A referenceable documentation symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Raw source id, when the source format has one
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub summary: String,
    pub kind: String,
    pub language: String,
}

impl Symbol {
    /// Create a symbol with no summary or id
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        kind: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            url: url.into(),
            summary: String::new(),
            kind: kind.into(),
            language: language.into(),
        }
    }

    /// Builder: set the raw id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder: set the summary, stripped of surrounding whitespace
    pub fn with_summary(mut self, summary: impl AsRef<str>) -> Self {
        self.summary = summary.as_ref().trim().to_string();
        self
    }
}

/// Raw per-platform id and the url it resolves to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdMapping {
    pub id: String,
    pub url: String,
}

impl IdMapping {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

/// Split a reference marker into its optional language and name
pub fn parse_marker(marker: &str) -> (Option<&str>, &str) {
    match SYMBOL_MARKER.captures(marker) {
        Some(caps) => {
            let language = caps
                .get(1)
                .map(|m| m.as_str().trim_end_matches(':'))
                .filter(|l| !l.is_empty());
            let name = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            (language, name)
        }
        None => (None, marker),
    }
}

/// Immutable lookup table over every symbol of every source
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    priority: LanguagePriority,
    /// Symbols in resolution order
    symbols: Vec<Symbol>,
    /// Lower-cased name to indices into `symbols`
    by_name: HashMap<String, Vec<usize>>,
    /// Language to raw id to url
    ids: HashMap<String, HashMap<String, String>>,
}

impl SymbolTable {
    /// Start building a table with the given language priority
    pub fn builder(priority: LanguagePriority) -> SymbolTableBuilder {
        SymbolTableBuilder {
            priority,
            symbols: Vec::new(),
            ids: HashMap::new(),
        }
    }

    /// Look up a symbol by case-insensitive name.
    ///
    /// With a language, only that language's symbols are candidates;
    /// otherwise the highest priority language wins.
    pub fn lookup(&self, name: &str, language: Option<&str>) -> Option<&Symbol> {
        self.by_name
            .get(&name.to_lowercase())?
            .iter()
            .map(|&i| &self.symbols[i])
            .find(|s| language.map_or(true, |l| s.language == l))
    }

    /// Resolve a `lang:Name` marker
    pub fn resolve_marker(&self, marker: &str) -> Option<&Symbol> {
        let (language, name) = parse_marker(marker);
        self.lookup(name, language)
    }

    /// Url for a raw id within a language
    pub fn lookup_id(&self, language: &str, id: &str) -> Option<&str> {
        self.ids.get(language)?.get(id).map(String::as_str)
    }

    /// Every symbol, in resolution order
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// The language priority used for bare lookups
    pub fn priority(&self) -> &LanguagePriority {
        &self.priority
    }

    /// Number of symbols
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the table has no symbols
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Collects symbols and id mappings before freezing them into a table
#[derive(Debug)]
pub struct SymbolTableBuilder {
    priority: LanguagePriority,
    symbols: Vec<Symbol>,
    ids: HashMap<String, HashMap<String, String>>,
}

impl SymbolTableBuilder {
    /// Add symbols
    pub fn add_symbols(&mut self, symbols: impl IntoIterator<Item = Symbol>) -> &mut Self {
        self.symbols.extend(symbols);
        self
    }

    /// Add raw id mappings for a language.
    ///
    /// A repeated id keeps its first url; a conflicting repeat is reported as
    /// a `duplicate-id` warning.
    pub fn add_ids(
        &mut self,
        language: &str,
        mappings: impl IntoIterator<Item = IdMapping>,
        diagnostics: &mut DiagnosticsCollector,
    ) -> &mut Self {
        let table = self.ids.entry(language.to_string()).or_default();
        for mapping in mappings {
            match table.get(&mapping.id) {
                Some(existing) if existing != &mapping.url => {
                    diagnostics.add(
                        Diagnostic::warning(format!(
                            "id {} maps to both {} and {}",
                            mapping.id, existing, mapping.url
                        ))
                        .for_symbol(mapping.id.clone())
                        .with_code("duplicate-id"),
                    );
                }
                Some(_) => {}
                None => {
                    table.insert(mapping.id, mapping.url);
                }
            }
        }
        self
    }

    /// Freeze the table. Symbols are ordered by language priority, keeping
    /// insertion order within a language and among unlisted languages.
    pub fn build(self) -> SymbolTable {
        let SymbolTableBuilder {
            priority,
            mut symbols,
            ids,
        } = self;

        symbols.sort_by_key(|s| priority.rank(&s.language));

        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, symbol) in symbols.iter().enumerate() {
            by_name.entry(symbol.name.to_lowercase()).or_default().push(i);
        }

        SymbolTable {
            priority,
            symbols,
            by_name,
            ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn window_table(c_first: bool) -> SymbolTable {
        let c = Symbol::new("Window", "/docs/c/User_Interface/Window/", "group", "c");
        let js = Symbol::new("Window", "/docs/pebblejs/#window", "class", "pebblejs");
        let mut builder = SymbolTable::builder(LanguagePriority::default());
        if c_first {
            builder.add_symbols([c, js]);
        } else {
            builder.add_symbols([js, c]);
        }
        builder.build()
    }

    #[test]
    fn test_parse_marker() {
        assert_eq!(parse_marker("Window"), (None, "Window"));
        assert_eq!(parse_marker("pebblejs:Window"), (Some("pebblejs"), "Window"));
        assert_eq!(
            parse_marker("pebblekit_android:com.getpebble.android.kit.PebbleKit"),
            (
                Some("pebblekit_android"),
                "com.getpebble.android.kit.PebbleKit"
            )
        );
    }

    #[test]
    fn test_marker_prefix_is_a_lowercase_language_id() {
        assert_eq!(parse_marker("c_preview:Window"), (Some("c_preview"), "Window"));
        assert_eq!(parse_marker("pebblekit_js:Pebble"), (Some("pebblekit_js"), "Pebble"));
        assert_eq!(parse_marker("pebblekit_ios:PBWatch"), (Some("pebblekit_ios"), "PBWatch"));
        assert_eq!(parse_marker("Rocky:Window"), (None, "Rocky:Window"));
        assert_eq!(parse_marker("c2:Window"), (None, "c2:Window"));
    }

    #[test]
    fn test_bare_lookup_prefers_priority_language() {
        for c_first in [true, false] {
            let table = window_table(c_first);
            let found = table.resolve_marker("Window").unwrap();
            assert_eq!(found.url, "/docs/c/User_Interface/Window/");
        }
    }

    #[test]
    fn test_language_prefix_restricts_lookup() {
        let table = window_table(true);
        let found = table.resolve_marker("pebblejs:Window").unwrap();
        assert_eq!(found.url, "/docs/pebblejs/#window");
        assert!(table.resolve_marker("rockyjs:Window").is_none());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let table = window_table(true);
        assert!(table.lookup("window", None).is_some());
        assert!(table.lookup("WINDOW", Some("c")).is_some());
    }

    #[test]
    fn test_id_mappings_keep_first_and_warn() {
        let mut diagnostics = DiagnosticsCollector::new();
        let mut builder = SymbolTable::builder(LanguagePriority::default());
        builder.add_ids(
            "c",
            [
                IdMapping::new("group___foundation", "/docs/c/Foundation/"),
                IdMapping::new("group___foundation", "/docs/c/Foundation/"),
                IdMapping::new("group___foundation", "/docs/c/Other/"),
            ],
            &mut diagnostics,
        );
        let table = builder.build();

        assert_eq!(
            table.lookup_id("c", "group___foundation"),
            Some("/docs/c/Foundation/")
        );
        assert_eq!(table.lookup_id("c_preview", "group___foundation"), None);
        assert_eq!(diagnostics.with_code("duplicate-id").count(), 1);
    }
}
