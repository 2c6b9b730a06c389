//! devsite-docs: Documentation pipeline for the developer site
//!
//! This crate turns the SDK reference material into one cross-linked set of
//! symbols, pages, navigation trees and redirects:
//! - Reading per-platform Doxygen XML and merging the platforms by name
//! - Reading JSON module lists for the JavaScript APIs
//! - Scraping javadoc and appledoc archives for the mobile SDKs
//! - Resolving Doxygen refs and double-backtick prose references against a
//!   symbol table built from every source
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐ ┌──────────────┐ ┌──────────────┐ ┌──────────────┐
//! │ Doxygen XML  │ │ JSON modules │ │   javadoc    │ │   appledoc   │
//! │ (per platf.) │ │              │ │              │ │              │
//! └──────┬───────┘ └──────┬───────┘ └──────┬───────┘ └──────┬───────┘
//!        │ merge          │                │                │
//!        └────────────────┴───────┬────────┴────────────────┘
//!                                 ▼
//!                       ┌───────────────────┐
//!                       │ DocNode forest +  │
//!                       │   symbol entries  │
//!                       └─────────┬─────────┘
//!                                 ▼
//!                       ┌───────────────────┐
//!                       │    SymbolTable    │
//!                       └─────────┬─────────┘
//!                                 ▼ resolve
//!          ┌──────────┬───────────┴──────────┬───────────┐
//!          ▼          ▼                      ▼           ▼
//!     ┌─────────┐ ┌───────┐            ┌──────────┐ ┌───────────┐
//!     │ symbols │ │ pages │            │   tree   │ │ redirects │
//!     └─────────┘ └───────┘            └──────────┘ └───────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use devsite_docs::{DocsGenerator, SiteConfig};
//! use std::path::Path;
//!
//! let config = SiteConfig::load(Path::new("devsite.toml")).expect("config");
//! let output = DocsGenerator::from_config(&config)
//!     .and_then(|mut generator| generator.run())
//!     .expect("documentation");
//! output.write_json(Path::new("_data/docs")).expect("write");
//! ```

// Core types
pub mod language;
pub mod node;
pub mod output;
pub mod symbols;

// Input handling
pub mod archive;
pub mod config;
pub mod fragment;

// Processing
pub mod merge;
pub mod prose;
pub mod slug;
pub mod transform;

// Sources and orchestration
pub mod orchestrator;
pub mod sources;

// Utilities
pub mod diagnostics;

// Re-exports for convenience
pub use archive::Archive;
pub use config::{CSourceConfig, HtmlSourceConfig, JsSourceConfig, SiteConfig, SourcesConfig};
pub use diagnostics::{
    Diagnostic, DiagnosticSeverity, DiagnosticsCollector, DocsError, DocsResult,
};
pub use fragment::{parse_html, parse_xml, Element, Markup};
pub use language::{AdapterId, LanguagePriority};
pub use merge::PlatformMerger;
pub use node::{DocNode, DocNodeDef, MemberKind, PlatformData};
pub use orchestrator::DocsGenerator;
pub use output::{Branch, DocsOutput, Page, PageContent, Redirect};
pub use prose::{CrossReferenceResolver, ProseOptions, ProseRenderer};
pub use sources::{
    AdapterState, DocumentationAndroid, DocumentationC, DocumentationIos, DocumentationJs,
    DocumentationSource, SourceOutput,
};
pub use symbols::{Symbol, SymbolTable};
pub use transform::{DoxygenTransformer, SimpleSectKind, TransformOptions};

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
