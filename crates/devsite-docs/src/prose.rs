//! Double-backtick cross references in prose
//!
//! Markdown anywhere on the site may reference API symbols by name:
//!
//! - ``` ``Window`` ``` links to the highest priority `Window` symbol
//! - ``` ``pebblejs:Window`` ``` restricts the lookup to one language
//! - ``` [the window](``Window``) ``` keeps custom link text
//!
//! Resolved references become markdown links whose title carries a `DOCS:`
//! marker; the link post-processor turns that marker into the `link--docs`
//! class after the markdown has been rendered.

use crate::diagnostics::{Diagnostic, DiagnosticsCollector};
use crate::slug::slug;
use crate::symbols::{parse_marker, Symbol, SymbolTable};
use crate::transform::plain_text;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref LINK_WITH_BACKTICKS: Regex =
        Regex::new(r"(\[([^\]]+)\])\(``([^`]+)``\)").unwrap();
    static ref DOUBLE_BACKTICKS: Regex = Regex::new(r"([^`]+|\A)``([^`]+)``").unwrap();
    static ref ANCHOR: Regex = Regex::new(r#"<a href="([^"]*)"(?: title="([^"]*)")?>"#).unwrap();
    static ref HEADER: Regex = Regex::new(r"<h([1-6])>(.*?)</h[1-6]>").unwrap();
    static ref PLATFORM_PARAGRAPH: Regex = Regex::new(r"<p>\^(CP|LC)\^\s*").unwrap();
}

/// Marker prefix placed in link titles of resolved references
pub const DOCS_MARKER: &str = "DOCS:";

/// Settings for rendering prose
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProseOptions {
    /// Prefix for root-relative links
    pub baseurl: String,
    /// Leave double-backtick markers untouched
    pub skip_docs: bool,
}

/// Rewrites double-backtick markers into markdown links
pub struct CrossReferenceResolver<'a> {
    table: &'a SymbolTable,
}

impl<'a> CrossReferenceResolver<'a> {
    pub fn new(table: &'a SymbolTable) -> Self {
        Self { table }
    }

    /// Rewrite every marker in `markdown`.
    ///
    /// `page` names the document in warnings about unresolved markers.
    pub fn resolve(&self, markdown: &str, page: &str, diag: &mut DiagnosticsCollector) -> String {
        let linked = LINK_WITH_BACKTICKS.replace_all(markdown, |caps: &Captures| {
            let text_in_brackets = &caps[1];
            let text = &caps[2];
            match self.table.resolve_marker(&caps[3]) {
                Some(symbol) => format!("{}{}", text_in_brackets, link_target(symbol)),
                None => {
                    warn_unresolved(diag, &caps[3], page);
                    text.to_string()
                }
            }
        });

        DOUBLE_BACKTICKS
            .replace_all(&linked, |caps: &Captures| {
                let before = &caps[1];
                let marker = &caps[2];
                let (language, name) = parse_marker(marker);
                let shown = match language {
                    Some(language) => &marker[language.len() + 1..],
                    None => marker,
                };
                match self.table.lookup(name, language) {
                    Some(symbol) => format!("{}[`{}`]{}", before, shown, link_target(symbol)),
                    None => {
                        warn_unresolved(diag, marker, page);
                        format!("{}``{}``", before, shown)
                    }
                }
            })
            .into_owned()
    }
}

fn link_target(symbol: &Symbol) -> String {
    format!("({} \"{}{}\")", symbol.url, DOCS_MARKER, symbol.name)
}

fn warn_unresolved(diag: &mut DiagnosticsCollector, marker: &str, page: &str) {
    diag.add(
        Diagnostic::warning(format!("could not find symbol '{}'", marker))
            .on_page(page)
            .for_symbol(marker)
            .with_code("unresolved-backtick"),
    );
}

/// Markdown renderer with cross references and site link conventions
pub struct ProseRenderer<'a> {
    resolver: CrossReferenceResolver<'a>,
    options: ProseOptions,
}

impl<'a> ProseRenderer<'a> {
    pub fn new(table: &'a SymbolTable, options: ProseOptions) -> Self {
        Self {
            resolver: CrossReferenceResolver::new(table),
            options,
        }
    }

    /// Resolve markers and render `markdown` to HTML
    pub fn render(&self, markdown: &str, page: &str, diag: &mut DiagnosticsCollector) -> String {
        let source = if self.options.skip_docs {
            markdown.to_string()
        } else {
            self.resolver.resolve(markdown, page, diag)
        };

        let mut options = comrak::Options::default();
        options.extension.table = true;
        options.extension.strikethrough = true;
        options.extension.autolink = true;
        options.render.unsafe_ = true;

        let html = comrak::markdown_to_html(&source, &options);
        self.post_process(&html)
    }

    /// Render a short snippet without the wrapping paragraph
    pub fn render_inline(&self, markdown: &str, page: &str, diag: &mut DiagnosticsCollector) -> String {
        let html = self.render(markdown, page, diag);
        let trimmed = html.trim();
        match trimmed
            .strip_prefix("<p>")
            .and_then(|s| s.strip_suffix("</p>"))
        {
            Some(inner) if !inner.contains("<p>") => inner.to_string(),
            _ => trimmed.to_string(),
        }
    }

    fn post_process(&self, html: &str) -> String {
        let html = ANCHOR.replace_all(html, |caps: &Captures| {
            let mut href = caps[1].to_string();
            let mut title = caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
            let mut classes = Vec::new();

            if let Some(rest) = title.strip_prefix(DOCS_MARKER) {
                title = rest.to_string();
                classes.push("link--docs");
            }
            if href.starts_with('/') && !href.starts_with("//") {
                href = format!("{}{}", self.options.baseurl, href);
            }

            let mut tag = format!("<a href=\"{}\"", href);
            if !title.is_empty() {
                tag.push_str(&format!(" title=\"{}\"", title));
            }
            if !classes.is_empty() {
                tag.push_str(&format!(" class=\"{}\"", classes.join(" ")));
            }
            tag.push('>');
            tag
        });

        let html = HEADER.replace_all(&html, |caps: &Captures| {
            format!(
                "<h{level} id=\"{id}\" class=\"anchor\">{text}</h{level}>",
                level = &caps[1],
                id = slug(&plain_text(&caps[2])),
                text = &caps[2]
            )
        });

        PLATFORM_PARAGRAPH
            .replace_all(&html, |caps: &Captures| {
                let platform = if &caps[1] == "CP" { "cloudpebble" } else { "local" };
                format!(
                    "<p class=\"platform-specific\" data-sdk-platform=\"{}\">",
                    platform
                )
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LanguagePriority;
    use pretty_assertions::assert_eq;

    fn table() -> SymbolTable {
        let mut builder = SymbolTable::builder(LanguagePriority::default());
        builder.add_symbols([
            Symbol::new("Window", "/docs/pebblejs/#window", "class", "pebblejs"),
            Symbol::new("Window", "/docs/c/User_Interface/Window/", "group", "c"),
            Symbol::new("window_create", "/docs/c/User_Interface/Window/#window_create", "function", "c"),
        ]);
        builder.build()
    }

    #[test]
    fn test_bare_marker_resolves_by_priority() {
        let table = table();
        let mut diag = DiagnosticsCollector::new();
        let out = CrossReferenceResolver::new(&table).resolve("Push a ``Window``.", "/guides/", &mut diag);
        assert_eq!(
            out,
            "Push a [`Window`](/docs/c/User_Interface/Window/ \"DOCS:Window\")."
        );
        assert!(diag.diagnostics().is_empty());
    }

    #[test]
    fn test_language_prefix() {
        let table = table();
        let mut diag = DiagnosticsCollector::new();
        let resolver = CrossReferenceResolver::new(&table);
        assert_eq!(
            resolver.resolve("``pebblejs:Window``", "/p/", &mut diag),
            "[`Window`](/docs/pebblejs/#window \"DOCS:Window\")"
        );
        assert_eq!(resolver.resolve("a ``rockyjs:Window``", "/p/", &mut diag), "a ``Window``");
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn test_unresolved_bare_marker_degrades_to_code() {
        let table = table();
        let mut diag = DiagnosticsCollector::new();
        let renderer = ProseRenderer::new(&table, ProseOptions::default());
        let html = renderer.render("Use ``NotASymbol`` here.", "/guides/x/", &mut diag);

        assert_eq!(html.trim(), "<p>Use <code>NotASymbol</code> here.</p>");
        let warnings: Vec<_> = diag.with_code("unresolved-backtick").collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].symbol.as_deref(), Some("NotASymbol"));
        assert_eq!(warnings[0].page.as_deref(), Some("/guides/x/"));
    }

    #[test]
    fn test_unresolved_link_form_degrades_to_text() {
        let table = table();
        let mut diag = DiagnosticsCollector::new();
        let renderer = ProseRenderer::new(&table, ProseOptions::default());
        let html = renderer.render("[Title](``DoesNotExist``)", "/p/", &mut diag);

        assert_eq!(html.trim(), "<p>Title</p>");
        assert!(!html.contains("<a"));
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn test_rendered_link_carries_docs_class() {
        let table = table();
        let mut diag = DiagnosticsCollector::new();
        let renderer = ProseRenderer::new(
            &table,
            ProseOptions {
                baseurl: "/base".into(),
                skip_docs: false,
            },
        );
        let html = renderer.render("[create it](``window_create``)", "/p/", &mut diag);
        assert_eq!(
            html.trim(),
            "<p><a href=\"/base/docs/c/User_Interface/Window/#window_create\" title=\"window_create\" class=\"link--docs\">create it</a></p>"
        );
    }

    #[test]
    fn test_headers_and_platform_paragraphs() {
        let table = table();
        let mut diag = DiagnosticsCollector::new();
        let renderer = ProseRenderer::new(&table, ProseOptions::default());
        let html = renderer.render("## Getting Started\n\n^CP^ Click run.", "/p/", &mut diag);
        assert!(html.contains("<h2 id=\"getting-started\" class=\"anchor\">Getting Started</h2>"));
        assert!(html.contains("<p class=\"platform-specific\" data-sdk-platform=\"cloudpebble\">Click run.</p>"));
    }

    #[test]
    fn test_skip_docs_leaves_markers() {
        let table = table();
        let mut diag = DiagnosticsCollector::new();
        let renderer = ProseRenderer::new(
            &table,
            ProseOptions {
                baseurl: String::new(),
                skip_docs: true,
            },
        );
        let html = renderer.render_inline("``Window``", "/p/", &mut diag);
        assert_eq!(html, "<code>Window</code>");
        assert!(diag.diagnostics().is_empty());
    }
}
