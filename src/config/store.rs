//! Configuration file I/O
//!
//! Reading the merge configuration is lenient: no path or a missing file
//! means "use defaults". Only a file that exists but cannot be read is an
//! error. Parsing is strict: malformed JSON always aborts the run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ilmerge_settings::{MergerSettings, SettingsError};
use sha2::{Digest, Sha256};

use crate::paths;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("error reading configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error deserializing configuration: {0}")]
    Parse(#[source] SettingsError),

    #[error("error serializing configuration: {0}")]
    Serialize(#[source] SettingsError),

    #[error("output file is not set, no place to write the configuration snapshot")]
    NoOutputFile,

    #[error("error writing configuration snapshot {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Read the raw configuration text.
///
/// Returns an empty string when `path` is unset or does not name an
/// existing file.
pub fn load_config(path: Option<&Path>) -> Result<String, ConfigError> {
    let path = match path {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => {
            log::warn!("Path for configuration file is empty. Default values will be applied.");
            return Ok(String::new());
        }
    };

    if !path.is_file() {
        log::info!(
            "Using default configuration. A custom configuration file was not found at: {}",
            path.display()
        );
        return Ok(String::new());
    }

    log::info!("Loading configuration from: {}", path.display());
    let bytes = fs::read(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let text = String::from_utf8(bytes).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidData, e),
    })?;

    log::info!(
        "Configuration file loaded successfully (sha256 {}).",
        digest(text.as_bytes())
    );

    // editors on Windows like to prepend a byte-order mark
    Ok(text
        .strip_prefix('\u{feff}')
        .map(str::to_string)
        .unwrap_or(text))
}

/// Parse raw configuration text into the settings model.
pub fn parse_config(text: &str) -> Result<MergerSettings, ConfigError> {
    log::info!("Deserializing configuration.");
    let settings = MergerSettings::from_json(text).map_err(ConfigError::Parse)?;
    log::info!("Configuration file deserialized successfully.");
    Ok(settings)
}

/// Serialize the settings model.
pub fn serialize_config(settings: &MergerSettings) -> Result<String, ConfigError> {
    settings.to_json().map_err(ConfigError::Serialize)
}

/// Write the resolved configuration next to the output file as
/// `<outputBaseName>.merge.json`, returning the path written.
pub fn write_snapshot(settings: &MergerSettings) -> Result<PathBuf, ConfigError> {
    let output = ilmerge_settings::specified(&settings.general.output_file)
        .ok_or(ConfigError::NoOutputFile)?;
    let path = paths::snapshot_path(Path::new(output));

    let json = serialize_config(settings)?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|source| ConfigError::Snapshot {
            path: path.clone(),
            source,
        })?;
    }

    log::info!("Saving current configuration to: {}", path.display());
    fs::write(&path, &json).map_err(|source| ConfigError::Snapshot {
        path: path.clone(),
        source,
    })?;
    log::debug!("Snapshot sha256 {}", digest(json.as_bytes()));

    Ok(path)
}

fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
