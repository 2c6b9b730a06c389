//! devsite-docs: build the developer site's documentation data
//!
//! Reads a `devsite.toml` site configuration, runs every configured source
//! through the documentation pipeline and writes `symbols.json`,
//! `pages.json`, `tree.json` and `redirects.json` into the output directory.

use anyhow::{bail, Context, Result};
use clap::Parser;
use devsite_docs::{DiagnosticsCollector, DocsGenerator, SiteConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "devsite-docs", version, about = "Generate cross-linked SDK documentation data")]
struct Cli {
    /// Site configuration file
    #[arg(short = 'c', long, default_value = "devsite.toml")]
    config: PathBuf,

    /// Output directory for the generated JSON
    #[arg(short = 'o', long, default_value = "_data/docs")]
    out: PathBuf,

    /// Skip documentation generation regardless of the configuration
    #[arg(long)]
    skip_docs: bool,

    /// Disable colored diagnostics
    #[arg(long)]
    no_color: bool,
}

fn main() -> Result<()> {
    // DEVSITE_LOG sets the log level, default "info"
    let filter = EnvFilter::try_from_env("DEVSITE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = SiteConfig::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    if cli.skip_docs {
        config.skip_docs = true;
    }

    let mut generator = DocsGenerator::from_config(&config).context("failed to set up documentation sources")?;
    let mut output = generator.run().context("documentation generation failed")?;

    output
        .write_json(&cli.out)
        .with_context(|| format!("failed to write {}", cli.out.display()))?;
    tracing::info!(out = %cli.out.display(), "wrote documentation data");

    let diagnostics = DiagnosticsCollector::from(std::mem::take(&mut output.diagnostics));
    diagnostics
        .print(!cli.no_color)
        .context("failed to print diagnostics")?;
    if diagnostics.has_errors() {
        bail!("{} error(s) while generating documentation", diagnostics.error_count());
    }
    Ok(())
}
