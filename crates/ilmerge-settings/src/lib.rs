//! Merge configuration model.
//!
//! `MergerSettings` is the persisted shape of a merge configuration file: a
//! `General` section naming what gets merged and where it goes, and an
//! `Advanced` section with the tool's behavior switches. Both sections are
//! always present after parsing, even when the file omits them.

mod de;
mod sections;

pub use sections::{specified, AdvancedSettings, GeneralSettings, DEFAULT_FILE_ALIGNMENT};

use serde::{Deserialize, Serialize};

/// Errors raised while decoding or encoding a configuration.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("configuration text is empty")]
    Empty,

    #[error("malformed configuration at line {line}, column {column}: {message}")]
    Malformed {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Root configuration aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergerSettings {
    #[serde(rename = "General", default, deserialize_with = "de::null_as_default")]
    pub general: GeneralSettings,

    #[serde(rename = "Advanced", default, deserialize_with = "de::null_as_default")]
    pub advanced: AdvancedSettings,
}

impl MergerSettings {
    /// Parse configuration text.
    ///
    /// Unknown fields are ignored. Blank text is rejected rather than read as
    /// an empty configuration; callers that treat a missing file as "use
    /// defaults" must check for that before parsing.
    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        if text.trim().is_empty() {
            return Err(SettingsError::Empty);
        }

        serde_json::from_str(text).map_err(|e| SettingsError::Malformed {
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        })
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// `SearchDirectories` is written sorted and deduplicated so unchanged
    /// inputs produce byte-identical output.
    pub fn to_json(&self) -> Result<String, SettingsError> {
        let mut snapshot = self.clone();
        snapshot.advanced.search_directories.sort();
        snapshot.advanced.search_directories.dedup();
        serde_json::to_string_pretty(&snapshot).map_err(SettingsError::Serialize)
    }
}
