//! Site configuration
//!
//! Loaded from a TOML file:
//!
//! ```toml
//! baseurl = ""
//! skip_docs = false
//!
//! [sources.c]
//! archive = "downloads/sdk-docs.zip"
//! platforms = ["aplite", "basalt"]
//!
//! [sources.rocky_js]
//! json = "data/rocky.json"
//! preview = true
//!
//! [sources.pebblekit_ios]
//! archive = "downloads/pebblekit-ios.zip"
//! ```
//!
//! Relative paths are resolved against the directory holding the config file.

use crate::diagnostics::{DocsError, DocsResult};
use crate::language::AdapterId;
use crate::transform::{SimpleSectKind, TransformOptions};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Skip documentation generation and double-backtick resolution
    pub skip_docs: bool,
    /// Prefix for root-relative links in rendered prose
    pub baseurl: String,
    pub sources: SourcesConfig,
}

/// One optional table per source; absent sources are not generated
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourcesConfig {
    pub c: Option<CSourceConfig>,
    pub c_preview: Option<CSourceConfig>,
    pub rocky_js: Option<JsSourceConfig>,
    pub pebblekit_js: Option<JsSourceConfig>,
    pub pebblekit_android: Option<HtmlSourceConfig>,
    pub pebblekit_ios: Option<HtmlSourceConfig>,
}

/// Doxygen XML source
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CSourceConfig {
    /// Zip file or directory holding `<platform>/xml/*.xml`
    pub archive: PathBuf,
    /// Defaults to the adapter's url root
    #[serde(default)]
    pub url_root: Option<String>,
    /// Platforms in canonical order, oldest first
    #[serde(default = "default_platforms")]
    pub platforms: Vec<String>,
    /// Top-level Doxygen group ids
    #[serde(default = "default_groups")]
    pub groups: Vec<String>,
    #[serde(default = "default_admonitions")]
    pub admonitions: Vec<SimpleSectKind>,
    #[serde(default = "default_image_root")]
    pub image_root: String,
    #[serde(default)]
    pub heading_offset: u8,
}

/// JSON module list
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsSourceConfig {
    pub json: PathBuf,
    #[serde(default)]
    pub url_root: Option<String>,
    /// Mark the generated pages as a preview API
    #[serde(default)]
    pub preview: bool,
}

/// Javadoc or appledoc HTML archive
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HtmlSourceConfig {
    pub archive: PathBuf,
    #[serde(default)]
    pub url_root: Option<String>,
}

fn default_platforms() -> Vec<String> {
    vec!["aplite".to_string(), "basalt".to_string()]
}

fn default_groups() -> Vec<String> {
    ["foundation", "graphics", "u_i", "smartstrap", "worker", "standard_c"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_admonitions() -> Vec<SimpleSectKind> {
    SimpleSectKind::DEFAULT_ADMONITIONS.to_vec()
}

fn default_image_root() -> String {
    TransformOptions::default().image_root
}

impl CSourceConfig {
    /// Config with defaults for everything but the archive path
    pub fn new(archive: impl Into<PathBuf>) -> Self {
        Self {
            archive: archive.into(),
            url_root: None,
            platforms: default_platforms(),
            groups: default_groups(),
            admonitions: default_admonitions(),
            image_root: default_image_root(),
            heading_offset: 0,
        }
    }

    /// Options for the Doxygen transformer
    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            admonitions: self.admonitions.clone(),
            image_root: self.image_root.clone(),
            heading_offset: self.heading_offset,
        }
    }
}

impl SiteConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> DocsResult<Self> {
        let source = fs::read_to_string(path).map_err(|e| {
            DocsError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let config = Self::from_toml(&source, base)?;
        tracing::debug!(config = %path.display(), "loaded site config");
        Ok(config)
    }

    /// Parse TOML, resolving relative paths against `base`
    pub fn from_toml(source: &str, base: &Path) -> DocsResult<Self> {
        let mut config: SiteConfig = toml::from_str(source)?;
        config.resolve_paths(base);
        config.validate()?;
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        let sources = &mut self.sources;
        for c in [&mut sources.c, &mut sources.c_preview].into_iter().flatten() {
            resolve(&mut c.archive);
        }
        for js in [&mut sources.rocky_js, &mut sources.pebblekit_js]
            .into_iter()
            .flatten()
        {
            resolve(&mut js.json);
        }
        for html in [&mut sources.pebblekit_android, &mut sources.pebblekit_ios]
            .into_iter()
            .flatten()
        {
            resolve(&mut html.archive);
        }
    }

    /// Check values serde cannot
    pub fn validate(&self) -> DocsResult<()> {
        if !self.baseurl.is_empty() && (!self.baseurl.starts_with('/') || self.baseurl.ends_with('/')) {
            return Err(DocsError::config(format!(
                "baseurl must start with '/' and not end with one: {:?}",
                self.baseurl
            )));
        }
        let sources = &self.sources;
        for (id, c) in [(AdapterId::C, &sources.c), (AdapterId::CPreview, &sources.c_preview)] {
            let Some(c) = c else { continue };
            if c.platforms.is_empty() {
                return Err(DocsError::config(format!("{}: no platforms configured", id)));
            }
            if c.groups.is_empty() {
                return Err(DocsError::config(format!("{}: no groups configured", id)));
            }
            check_url_root(id, c.url_root.as_deref())?;
        }
        for (id, js) in [
            (AdapterId::RockyJs, &sources.rocky_js),
            (AdapterId::PebbleKitJs, &sources.pebblekit_js),
        ] {
            if let Some(js) = js {
                check_url_root(id, js.url_root.as_deref())?;
            }
        }
        for (id, html) in [
            (AdapterId::PebbleKitAndroid, &sources.pebblekit_android),
            (AdapterId::PebbleKitIos, &sources.pebblekit_ios),
        ] {
            if let Some(html) = html {
                check_url_root(id, html.url_root.as_deref())?;
            }
        }
        Ok(())
    }
}

fn check_url_root(id: AdapterId, root: Option<&str>) -> DocsResult<()> {
    match root {
        Some(root) if !(root.starts_with('/') && root.ends_with('/')) => Err(DocsError::config(
            format!("{}: url_root must start and end with '/': {:?}", id, root),
        )),
        _ => Ok(()),
    }
}

/// Url root from config, else the adapter default
pub fn url_root_or_default(id: AdapterId, root: Option<&str>) -> String {
    root.map(str::to_string)
        .unwrap_or_else(|| id.default_url_root().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = SiteConfig::from_toml(
            r#"
            [sources.c]
            archive = "sdk.zip"
            "#,
            Path::new("/site"),
        )
        .unwrap();

        let c = config.sources.c.unwrap();
        assert_eq!(c.archive, PathBuf::from("/site/sdk.zip"));
        assert_eq!(c.platforms, vec!["aplite", "basalt"]);
        assert_eq!(c.groups.len(), 6);
        assert_eq!(c.admonitions, vec![SimpleSectKind::Return, SimpleSectKind::Note]);
        assert!(config.sources.pebblekit_ios.is_none());
        assert!(!config.skip_docs);
    }

    #[test]
    fn test_full_config() {
        let config = SiteConfig::from_toml(
            r#"
            baseurl = "/devsite"
            skip_docs = true

            [sources.c_preview]
            archive = "/abs/preview"
            url_root = "/docs/c/preview/"
            admonitions = ["return", "note", "warning"]
            heading_offset = 1

            [sources.rocky_js]
            json = "rocky.json"
            preview = true
            "#,
            Path::new("cfg"),
        )
        .unwrap();

        assert_eq!(config.baseurl, "/devsite");
        let preview = config.sources.c_preview.unwrap();
        assert_eq!(preview.archive, PathBuf::from("/abs/preview"));
        assert_eq!(preview.transform_options().heading_offset, 1);
        assert_eq!(preview.admonitions.len(), 3);
        let rocky = config.sources.rocky_js.unwrap();
        assert_eq!(rocky.json, PathBuf::from("cfg/rocky.json"));
        assert!(rocky.preview);
    }

    #[test]
    fn test_invalid_values_are_fatal() {
        let bad_root = SiteConfig::from_toml(
            "[sources.pebblekit_ios]\narchive = \"x\"\nurl_root = \"docs\"",
            Path::new("."),
        );
        assert!(matches!(bad_root, Err(DocsError::Config(_))));

        let bad_kind = SiteConfig::from_toml(
            "[sources.c]\narchive = \"x\"\nadmonitions = [\"nope\"]",
            Path::new("."),
        );
        assert!(matches!(bad_kind, Err(DocsError::Toml(_))));

        let unknown = SiteConfig::from_toml("colour = true", Path::new("."));
        assert!(unknown.is_err());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devsite.toml");
        fs::write(&path, "[sources.pebblekit_js]\njson = \"pkjs.json\"\n").unwrap();

        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(
            config.sources.pebblekit_js.unwrap().json,
            dir.path().join("pkjs.json")
        );
        assert!(SiteConfig::load(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_url_root_default() {
        assert_eq!(url_root_or_default(AdapterId::C, None), "/docs/c/");
        assert_eq!(url_root_or_default(AdapterId::C, Some("/c/")), "/c/");
    }
}
