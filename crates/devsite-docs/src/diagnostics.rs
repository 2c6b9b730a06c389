//! Error types and diagnostics
//!
//! Fatal problems (missing archives, malformed XML/JSON, misuse of the
//! adapter lifecycle) are reported as [`DocsError`]. Everything the pipeline
//! can recover from (unresolved references, placeholder groups, missing
//! summaries) becomes a [`Diagnostic`] recorded in a [`DiagnosticsCollector`].

use std::io::Write;
use std::path::PathBuf;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use thiserror::Error;

/// Result type for devsite-docs operations
pub type DocsResult<T> = Result<T, DocsError>;

/// Main error type for devsite-docs
#[derive(Debug, Error)]
pub enum DocsError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Markup or data parse error
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be decoded
    #[error("Invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Archive could not be opened
    #[error("Archive not found: {0}")]
    ArchiveNotFound(PathBuf),

    /// Zip archive error
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A required file is missing from a source archive
    #[error("File not found in {archive}: {path}")]
    MissingEntry { archive: String, path: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Adapter lifecycle called out of order
    #[error("{source_name} is {actual}, expected {expected}")]
    State {
        source_name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl DocsError {
    /// Create a parse error
    pub fn parse(file: impl Into<String>, message: impl Into<String>) -> Self {
        DocsError::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        DocsError::Config(message.into())
    }

    /// Create a missing archive entry error
    pub fn missing_entry(archive: impl Into<String>, path: impl Into<String>) -> Self {
        DocsError::MissingEntry {
            archive: archive.into(),
            path: path.into(),
        }
    }

    /// Create a generic error
    pub fn other(message: impl Into<String>) -> Self {
        DocsError::Other(message.into())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticSeverity {
    /// Error - the output is incomplete
    Error,
    /// Warning - generation continues with degraded output
    Warning,
    /// Info - informational message
    Info,
    /// Hint - suggestion for improving the source docs
    Hint,
}

impl DiagnosticSeverity {
    /// Get display string
    pub fn display(&self) -> &'static str {
        match self {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
            DiagnosticSeverity::Info => "info",
            DiagnosticSeverity::Hint => "hint",
        }
    }

    /// Terminal color used by [`DiagnosticsCollector::print`]
    pub fn color(&self) -> Color {
        match self {
            DiagnosticSeverity::Error => Color::Red,
            DiagnosticSeverity::Warning => Color::Yellow,
            DiagnosticSeverity::Info => Color::Blue,
            DiagnosticSeverity::Hint => Color::Cyan,
        }
    }
}

/// A diagnostic message
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Severity level
    pub severity: DiagnosticSeverity,
    /// Message
    pub message: String,
    /// Url of the page being processed
    pub page: Option<String>,
    /// Symbol the diagnostic is about
    pub symbol: Option<String>,
    /// Diagnostic code (for categorization)
    pub code: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(severity: DiagnosticSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            page: None,
            symbol: None,
            code: None,
        }
    }

    /// Create an error diagnostic
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Error, message)
    }

    /// Create a warning diagnostic
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Warning, message)
    }

    /// Create an info diagnostic
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Info, message)
    }

    /// Create a hint diagnostic
    pub fn hint(message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Hint, message)
    }

    /// Set the page url
    pub fn on_page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }

    /// Set the symbol name
    pub fn for_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Set the diagnostic code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Format the diagnostic for display
    pub fn format(&self) -> String {
        let mut result = String::new();

        if let Some(ref page) = self.page {
            result.push_str(page);
            result.push_str(": ");
        }

        result.push_str(self.severity.display());

        if let Some(ref code) = self.code {
            result.push('[');
            result.push_str(code);
            result.push(']');
        }

        result.push_str(": ");
        result.push_str(&self.message);

        if let Some(ref symbol) = self.symbol {
            result.push_str(" (");
            result.push_str(symbol);
            result.push(')');
        }

        result
    }

    fn trace(&self) {
        let page = self.page.as_deref().unwrap_or("-");
        let code = self.code.as_deref().unwrap_or("-");
        match self.severity {
            DiagnosticSeverity::Error => {
                tracing::error!(page, code, symbol = ?self.symbol, "{}", self.message)
            }
            DiagnosticSeverity::Warning => {
                tracing::warn!(page, code, symbol = ?self.symbol, "{}", self.message)
            }
            DiagnosticSeverity::Info => {
                tracing::info!(page, code, symbol = ?self.symbol, "{}", self.message)
            }
            DiagnosticSeverity::Hint => {
                tracing::debug!(page, code, symbol = ?self.symbol, "{}", self.message)
            }
        }
    }
}

/// Collector for diagnostics during a pipeline run
#[derive(Debug, Default)]
pub struct DiagnosticsCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticsCollector {
    /// Create a new collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic. The diagnostic is also emitted as a tracing event.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        diagnostic.trace();
        self.diagnostics.push(diagnostic);
    }

    /// Add an error
    pub fn error(&mut self, message: impl Into<String>) {
        self.add(Diagnostic::error(message));
    }

    /// Add a warning
    pub fn warning(&mut self, message: impl Into<String>) {
        self.add(Diagnostic::warning(message));
    }

    /// Add an info message
    pub fn info(&mut self, message: impl Into<String>) {
        self.add(Diagnostic::info(message));
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == DiagnosticSeverity::Error)
    }

    /// Get all diagnostics
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics carrying the given code
    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.diagnostics
            .iter()
            .filter(move |d| d.code.as_deref() == Some(code))
    }

    /// Get error count
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
            .count()
    }

    /// Get warning count
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Warning)
            .count()
    }

    /// Move every diagnostic out of the collector
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Print all diagnostics and a summary line to stderr
    pub fn print(&self, color: bool) -> std::io::Result<()> {
        let choice = if color {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        let mut stderr = StandardStream::stderr(choice);

        for diagnostic in &self.diagnostics {
            if let Some(ref page) = diagnostic.page {
                stderr.set_color(ColorSpec::new().set_dimmed(true))?;
                write!(stderr, "{}", page)?;
                stderr.reset()?;
                write!(stderr, ": ")?;
            }

            stderr.set_color(
                ColorSpec::new()
                    .set_fg(Some(diagnostic.severity.color()))
                    .set_bold(true),
            )?;
            write!(stderr, "{}", diagnostic.severity.display())?;
            stderr.reset()?;

            if let Some(ref code) = diagnostic.code {
                stderr.set_color(ColorSpec::new().set_dimmed(true))?;
                write!(stderr, "[{}]", code)?;
                stderr.reset()?;
            }
            write!(stderr, ": {}", diagnostic.message)?;
            if let Some(ref symbol) = diagnostic.symbol {
                write!(stderr, " ({})", symbol)?;
            }
            writeln!(stderr)?;
        }

        let errors = self.error_count();
        let warnings = self.warning_count();
        if errors > 0 || warnings > 0 {
            writeln!(stderr, "\n{} error(s), {} warning(s)", errors, warnings)?;
        }
        Ok(())
    }
}

impl From<Vec<Diagnostic>> for DiagnosticsCollector {
    /// Wrap diagnostics that were already traced when first recorded
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}
