//! Documentation source identities and the language priority order
//!
//! Bare cross references (``` ``Window`` ```) resolve to the first matching
//! symbol in [`AdapterId::PRIORITY`] order. The order is an explicit list
//! rather than a side effect of whichever adapter happened to run first.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a documentation source slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterId {
    /// Released C SDK (Doxygen)
    C,
    /// Preview C SDK (Doxygen)
    CPreview,
    /// Rocky.js API (JSON)
    RockyJs,
    /// PebbleKit JS API (JSON)
    PebbleKitJs,
    /// PebbleKit Android (javadoc)
    PebbleKitAndroid,
    /// PebbleKit iOS (appledoc)
    PebbleKitIos,
}

impl AdapterId {
    /// Fixed resolution priority, highest first
    pub const PRIORITY: [AdapterId; 6] = [
        AdapterId::C,
        AdapterId::CPreview,
        AdapterId::RockyJs,
        AdapterId::PebbleKitJs,
        AdapterId::PebbleKitAndroid,
        AdapterId::PebbleKitIos,
    ];

    /// Language tag stamped on every symbol and page this source emits
    pub fn language(&self) -> &'static str {
        match self {
            AdapterId::C => "c",
            AdapterId::CPreview => "c_preview",
            AdapterId::RockyJs => "rockyjs",
            AdapterId::PebbleKitJs => "pebblekit_js",
            AdapterId::PebbleKitAndroid => "pebblekit_android",
            AdapterId::PebbleKitIos => "pebblekit_ios",
        }
    }

    /// Position in [`AdapterId::PRIORITY`]
    pub fn rank(&self) -> usize {
        Self::PRIORITY
            .iter()
            .position(|id| id == self)
            .unwrap_or(Self::PRIORITY.len())
    }

    /// Default url root of the generated pages
    pub fn default_url_root(&self) -> &'static str {
        match self {
            AdapterId::C => "/docs/c/",
            AdapterId::CPreview => "/docs/c/preview/",
            AdapterId::RockyJs => "/docs/rockyjs/",
            AdapterId::PebbleKitJs => "/docs/pebblekit-js/",
            AdapterId::PebbleKitAndroid => "/docs/pebblekit-android/",
            AdapterId::PebbleKitIos => "/docs/pebblekit-ios/",
        }
    }

    /// Parse a language tag
    pub fn from_language(language: &str) -> Option<AdapterId> {
        Self::PRIORITY
            .iter()
            .copied()
            .find(|id| id.language() == language)
    }
}

impl fmt::Display for AdapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.language())
    }
}

/// Ordered list of language tags used for bare-name lookups
///
/// Languages absent from the list rank after every listed language, in the
/// order they were first seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePriority {
    order: Vec<String>,
}

impl LanguagePriority {
    /// Create a priority list from explicit language tags
    pub fn new<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            order: languages.into_iter().map(Into::into).collect(),
        }
    }

    /// Rank of a language; unknown languages share the lowest priority
    pub fn rank(&self, language: &str) -> usize {
        self.order
            .iter()
            .position(|l| l == language)
            .unwrap_or(self.order.len())
    }

    /// Listed languages, highest priority first
    pub fn languages(&self) -> &[String] {
        &self.order
    }
}

impl Default for LanguagePriority {
    fn default() -> Self {
        Self::new(AdapterId::PRIORITY.iter().map(|id| id.language()))
    }
}
