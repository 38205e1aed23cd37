//! @ai:module:intent Configuration for forward merges and strips, loadable from TOML
//! @ai:module:layer infrastructure
//! @ai:module:public_api MergeConfig, WhitespaceMode
//! @ai:module:depends_on marker, merge, error

use crate::error::{Error, Result};
use crate::marker::{MarkerPattern, DEFAULT_ANNOTATION_PATTERN};
use crate::merge::{MergeMarkers, NewAnnotationPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// @ai:intent How content lines are compared during alignment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhitespaceMode {
    #[default]
    Exact,
    IgnoreTrailing,
}

impl WhitespaceMode {
    /// @ai:intent Key used for equality; never the text that gets emitted
    /// @ai:effects pure
    pub fn key<'a>(&self, line: &'a str) -> &'a str {
        match self {
            WhitespaceMode::Exact => line,
            WhitespaceMode::IgnoreTrailing => line.trim_end(),
        }
    }
}

/// @ai:intent Settings for a merge or strip run
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    #[serde(default = "default_annotation_pattern")]
    pub annotation_pattern: String,
    #[serde(default)]
    pub markers: MergeMarkers,
    #[serde(default)]
    pub new_annotations: NewAnnotationPolicy,
    #[serde(default)]
    pub whitespace: WhitespaceMode,
    /// File extensions (without the dot) visited in tree mode; empty means every file.
    #[serde(default)]
    pub include_extensions: Vec<String>,
    /// Directory names never descended into in tree mode.
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
}

fn default_annotation_pattern() -> String {
    DEFAULT_ANNOTATION_PATTERN.to_string()
}

fn default_exclude_dirs() -> Vec<String> {
    vec!["target".to_string(), "node_modules".to_string(), "__pycache__".to_string()]
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            annotation_pattern: default_annotation_pattern(),
            markers: MergeMarkers::default(),
            new_annotations: NewAnnotationPolicy::default(),
            whitespace: WhitespaceMode::default(),
            include_extensions: Vec::new(),
            exclude_dirs: default_exclude_dirs(),
        }
    }
}

impl MergeConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists
    /// @ai:effects fs:read
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_toml(&content).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// @ai:effects pure
    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// @ai:intent Compile the annotation pattern
    /// @ai:post Err(InvalidPattern) if the pattern is not a valid regex
    pub fn marker(&self) -> Result<MarkerPattern> {
        MarkerPattern::new(&self.annotation_pattern)
    }

    /// @ai:intent Check the pattern and the markers together before any file is touched
    /// @ai:post Err(InvalidPattern) or Err(InvalidMarker); Ok carries the compiled pattern
    pub fn validate(&self) -> Result<MarkerPattern> {
        let marker = self.marker()?;
        self.markers.validate(&marker)?;
        Ok(marker)
    }

    /// @ai:intent Whether tree mode should visit a file with this name
    /// @ai:effects pure
    pub fn includes_file(&self, path: &Path) -> bool {
        if self.include_extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.include_extensions.iter().any(|e| e == ext))
            .unwrap_or(false)
    }

    /// @ai:effects pure
    pub fn excludes_dir(&self, name: &str) -> bool {
        self.exclude_dirs.iter().any(|d| d == name)
    }
}
