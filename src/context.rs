//! Build context handed to the task by the host build.
//!
//! The context is assembled once per invocation and never mutated: an
//! optional TOML context file forms the base layer and values passed on the
//! command line are layered over it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::deep_merge;
use crate::paths;

/// Context errors
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("failed to read context file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse context file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid build context: {0}")]
    Invalid(String),

    #[error("required build property is not set: {0}")]
    Missing(&'static str),
}

/// Values the host build knows about the project being merged.
///
/// Text fields use the empty string for "not provided", matching how build
/// properties arrive from the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildContext {
    /// Merge configuration file (JSON). Absent or missing means defaults.
    pub configuration_file: Option<PathBuf>,

    pub solution_dir: String,
    pub solution_path: String,
    pub project_dir: String,
    pub project_file_name: String,
    pub project_path: String,
    pub target_dir: String,
    pub target_path: String,
    pub target_file_name: String,
    pub intermediate_output_path: String,
    pub target_framework_version: String,
    pub target_architecture: String,

    /// Direct path to the merge executable published by the tool's package.
    pub console_path: String,

    /// Signing key configured on the project.
    pub key_file: String,

    /// Reference assemblies copied next to the build output. May contain
    /// symbol and documentation files as well.
    pub input_assemblies: Vec<String>,

    /// Extra directories the tool should search for references.
    pub additional_locations: Vec<String>,

    /// Directory holding this task's binary. Defaults to the directory of
    /// the running executable.
    pub task_dir: Option<PathBuf>,
}

impl BuildContext {
    /// Build a context from an optional TOML file overlaid with `overrides`.
    ///
    /// `overrides` is a JSON object keyed by field name; `null` entries are
    /// treated as "not given" and leave the file's value in place.
    pub fn from_layers(file: Option<&Path>, overrides: Value) -> Result<Self, ContextError> {
        let base = match file {
            Some(path) => load_toml(path)?,
            None => Value::Object(Default::default()),
        };

        let merged = deep_merge(base, overrides);
        serde_json::from_value(merged).map_err(|e| ContextError::Invalid(e.to_string()))
    }

    /// Check the properties the pipeline cannot run without.
    pub fn validate(&self) -> Result<(), ContextError> {
        if self.target_dir.trim().is_empty() {
            return Err(ContextError::Missing("target_dir"));
        }
        if self.target_file_name.trim().is_empty() && self.target_path.trim().is_empty() {
            return Err(ContextError::Missing("target_file_name"));
        }
        if self.target_framework_version.trim().is_empty() {
            return Err(ContextError::Missing("target_framework_version"));
        }
        Ok(())
    }

    /// Final location of the build's own assembly.
    pub fn target_path(&self) -> PathBuf {
        if !self.target_path.is_empty() {
            PathBuf::from(&self.target_path)
        } else {
            Path::new(&self.target_dir).join(&self.target_file_name)
        }
    }

    /// The assembly that becomes the primary merge input: the intermediate
    /// output when the build reports one, the final target otherwise.
    pub fn primary_assembly(&self) -> PathBuf {
        if !self.intermediate_output_path.is_empty() {
            PathBuf::from(&self.intermediate_output_path)
        } else {
            self.target_path()
        }
    }

    /// Resolve a possibly relative path against the project directory.
    pub fn project_relative(&self, path: &Path) -> PathBuf {
        paths::absolutize(path, Path::new(&self.project_dir))
    }

    /// Directory of this task's binary.
    pub fn task_dir(&self) -> Option<PathBuf> {
        self.task_dir.clone().or_else(|| {
            std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf))
        })
    }

    /// Log every input at the start of a run.
    pub fn log_inputs(&self) {
        log::info!("SolutionDir: {}", self.solution_dir);
        log::info!("SolutionPath: {}", self.solution_path);
        log::info!("ProjectDir: {}", self.project_dir);
        log::info!("ProjectFileName: {}", self.project_file_name);
        log::info!("ProjectPath: {}", self.project_path);
        log::info!("TargetDir: {}", self.target_dir);
        log::info!("TargetPath: {}", self.target_path);
        log::info!("IntermediateOutputPath: {}", self.intermediate_output_path);
        log::info!("TargetFileName: {}", self.target_file_name);
        log::info!("TargetFrameworkVersion: {}", self.target_framework_version);
        log::info!("TargetArchitecture: {}", self.target_architecture);
        log::info!("ILMergeConsolePath: {}", self.console_path);
        log::info!("KeyFile: {}", self.key_file);
        log::info!(
            "ConfigurationFilePath: {}",
            self.configuration_file
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        );
        log::debug!("InputAssemblies: {:?}", self.input_assemblies);
        log::debug!("AdditionalLocations: {:?}", self.additional_locations);
    }
}

fn load_toml(path: &Path) -> Result<Value, ContextError> {
    let contents = fs::read_to_string(path).map_err(|source| ContextError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let table: toml::Value = toml::from_str(&contents).map_err(|e| ContextError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(toml_to_json(table))
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}
