//! In-memory source archives
//!
//! Doxygen output, javadoc and appledoc bundles arrive either as a zip file
//! or as an unpacked directory. Both are read eagerly into a path → bytes
//! map so the adapters can look entries up by relative path.

use crate::diagnostics::{DocsError, DocsResult};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use walkdir::WalkDir;

/// A read-only set of files addressed by `/`-separated relative paths
#[derive(Debug, Clone, Default)]
pub struct Archive {
    name: String,
    entries: BTreeMap<String, Vec<u8>>,
}

impl Archive {
    /// Open a `.zip` file or a directory
    pub fn open(path: &Path) -> DocsResult<Self> {
        if !path.exists() {
            return Err(DocsError::ArchiveNotFound(path.to_path_buf()));
        }
        if path.is_dir() {
            Self::from_dir(path)
        } else {
            Self::from_zip(path)
        }
    }

    /// Build an archive from in-memory entries
    pub fn from_entries<I, P, B>(name: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (P, B)>,
        P: Into<String>,
        B: Into<Vec<u8>>,
    {
        Self {
            name: name.into(),
            entries: entries
                .into_iter()
                .map(|(p, b)| (normalize(&p.into()), b.into()))
                .collect(),
        }
    }

    fn from_dir(root: &Path) -> DocsResult<Self> {
        let mut entries = BTreeMap::new();
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(|e| DocsError::other(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(root)
                .map_err(|e| DocsError::other(e.to_string()))?;
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            entries.insert(key, fs::read(entry.path())?);
        }
        tracing::debug!(root = %root.display(), entries = entries.len(), "loaded directory archive");
        Ok(Self {
            name: root.display().to_string(),
            entries,
        })
    }

    fn from_zip(path: &Path) -> DocsResult<Self> {
        let mut zip = zip::ZipArchive::new(File::open(path)?)?;
        let mut entries = BTreeMap::new();
        for i in 0..zip.len() {
            let mut file = zip.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut bytes = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut bytes)?;
            entries.insert(normalize(file.name()), bytes);
        }
        tracing::debug!(archive = %path.display(), entries = entries.len(), "loaded zip archive");
        Ok(Self {
            name: path.display().to_string(),
            entries,
        })
    }

    /// Display name (file or directory path)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether an entry exists
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Raw bytes of an entry
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    /// Entry decoded as UTF-8 (lossily); a missing entry is an error
    pub fn read_to_string(&self, path: &str) -> DocsResult<String> {
        self.get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .ok_or_else(|| DocsError::missing_entry(&self.name, path))
    }

    /// Every entry path, sorted
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize(path: &str) -> String {
    path.trim_start_matches("./")
        .trim_start_matches('/')
        .replace('\\', "/")
}
