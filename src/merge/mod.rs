//! Merge invocation
//!
//! The resolved settings are mapped onto a typed [`MergeParameters`] value
//! and handed to a [`MergeTool`]. Only the tool implementation knows how the
//! external merger is actually driven (see [`process`]).

pub mod process;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ilmerge_settings::{specified, MergerSettings};

pub use process::ProcessMergeTool;

/// Invalid settings values caught while building the parameters
#[derive(Debug, thiserror::Error)]
pub enum ParameterError {
    #[error("output file is not set")]
    MissingOutputFile,

    #[error("no input assemblies to merge")]
    NoInputs,

    #[error("invalid TargetKind {0:?}, expected library, exe, winexe or SameAsPrimaryAssembly")]
    InvalidTargetKind(String),

    #[error("invalid Version {0:?}, expected major.minor[.build[.revision]]")]
    InvalidVersion(String),

    #[error("invalid TargetPlatform {0:?}, expected \"<kind>, <frameworkDir>\"")]
    InvalidTargetPlatform(String),

    #[error("invalid value {value:?} for {field}, expected true or false")]
    InvalidFlag { field: &'static str, value: String },
}

/// Errors surfaced by a merge tool
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("merge tool exited with {}: {output}", exit_label(.code))]
    Failed { code: Option<i32>, output: String },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "no exit code".to_string(),
    }
}

/// Merge errors
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("invalid merge parameters: {0}")]
    Parameters(#[from] ParameterError),

    #[error("cannot create output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("merge failed: {0}")]
    Tool(#[from] ToolError),
}

/// Output assembly kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Library,
    Exe,
    WinExe,
    SameAsPrimaryAssembly,
}

impl TargetKind {
    /// Spelling used on the tool's command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Library => "library",
            TargetKind::Exe => "exe",
            TargetKind::WinExe => "winexe",
            TargetKind::SameAsPrimaryAssembly => "SameAsPrimaryAssembly",
        }
    }
}

impl FromStr for TargetKind {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "library" | "dll" => Ok(TargetKind::Library),
            "exe" => Ok(TargetKind::Exe),
            "winexe" => Ok(TargetKind::WinExe),
            "sameasprimaryassembly" => Ok(TargetKind::SameAsPrimaryAssembly),
            _ => Err(ParameterError::InvalidTargetKind(s.to_string())),
        }
    }
}

/// `major.minor[.build[.revision]]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyVersion {
    pub major: u16,
    pub minor: u16,
    pub build: Option<u16>,
    pub revision: Option<u16>,
}

impl FromStr for AssemblyVersion {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParameterError::InvalidVersion(s.to_string());

        let parts = s
            .trim()
            .split('.')
            .map(|p| p.trim().parse::<u16>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;

        match parts.as_slice() {
            [major, minor] => Ok(Self {
                major: *major,
                minor: *minor,
                build: None,
                revision: None,
            }),
            [major, minor, build] => Ok(Self {
                major: *major,
                minor: *minor,
                build: Some(*build),
                revision: None,
            }),
            [major, minor, build, revision] => Ok(Self {
                major: *major,
                minor: *minor,
                build: Some(*build),
                revision: Some(*revision),
            }),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for AssemblyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(build) = self.build {
            write!(f, ".{}", build)?;
            if let Some(revision) = self.revision {
                write!(f, ".{}", revision)?;
            }
        }
        Ok(())
    }
}

/// Runtime generation plus, optionally, its framework directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPlatform {
    pub kind: String,
    pub directory: Option<String>,
}

impl FromStr for TargetPlatform {
    type Err = ParameterError;

    /// `"v4, C:\Windows\Microsoft.NET\Framework\v4.0.30319"`; empty
    /// components are dropped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',').map(str::trim).filter(|p| !p.is_empty());
        let kind = parts
            .next()
            .ok_or_else(|| ParameterError::InvalidTargetPlatform(s.to_string()))?;
        let directory = parts.next().map(str::to_string);
        if parts.next().is_some() {
            return Err(ParameterError::InvalidTargetPlatform(s.to_string()));
        }
        Ok(Self {
            kind: kind.to_string(),
            directory,
        })
    }
}

/// One duplicate-type allowance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateType {
    /// Every type may be duplicated.
    All,
    Named(String),
}

impl DuplicateType {
    /// `"*"` allows every type; anything else is a comma-separated list of
    /// type names.
    pub fn parse_list(value: &str) -> Vec<DuplicateType> {
        if value.trim() == "*" {
            return vec![DuplicateType::All];
        }
        value
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| DuplicateType::Named(name.to_string()))
            .collect()
    }
}

/// Everything the merge tool is told, in typed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeParameters {
    /// Primary assembly first.
    pub input_assemblies: Vec<PathBuf>,
    pub output_file: PathBuf,
    pub key_file: Option<PathBuf>,
    pub delay_sign: bool,
    pub target_platform: Option<TargetPlatform>,
    /// Configured directories followed by the directory of every input.
    pub search_directories: Vec<PathBuf>,

    pub allow_multiple_assembly_level_attributes: bool,
    pub allow_wild_cards: bool,
    pub allow_zero_pe_kind: bool,
    pub allow_duplicate_types: Vec<DuplicateType>,
    pub attribute_file: Option<PathBuf>,
    pub closed: bool,
    pub copy_attributes: bool,
    pub debug_info: bool,
    pub internalize: bool,
    pub exclude_file: Option<PathBuf>,
    pub log: bool,
    pub log_file: Option<PathBuf>,
    /// Reference other assemblies by public key token rather than full key.
    pub public_key_tokens: bool,
    pub file_alignment: u32,
    pub target_kind: Option<TargetKind>,
    pub version: Option<AssemblyVersion>,
    pub union_merge: bool,
    pub xml_documentation: bool,
}

impl MergeParameters {
    pub fn from_settings(settings: &MergerSettings) -> Result<Self, ParameterError> {
        let general = &settings.general;
        let advanced = &settings.advanced;

        let output_file = specified(&general.output_file)
            .map(PathBuf::from)
            .ok_or(ParameterError::MissingOutputFile)?;

        let input_assemblies: Vec<PathBuf> = general
            .input_assemblies
            .iter()
            .filter(|i| !i.trim().is_empty())
            .map(PathBuf::from)
            .collect();
        if input_assemblies.is_empty() {
            return Err(ParameterError::NoInputs);
        }

        let mut search_directories: Vec<PathBuf> = Vec::new();
        let configured = advanced.search_directories.iter().map(PathBuf::from);
        let input_dirs = input_assemblies
            .iter()
            .filter_map(|i| i.parent())
            .filter(|d| !d.as_os_str().is_empty())
            .map(Path::to_path_buf);
        for dir in configured.chain(input_dirs) {
            if !search_directories.contains(&dir) {
                search_directories.push(dir);
            }
        }

        let log_file = specified(&advanced.log_file).map(PathBuf::from);
        let log = parse_flag("Log", &advanced.log)?.unwrap_or(false) || log_file.is_some();

        Ok(Self {
            input_assemblies,
            output_file,
            key_file: specified(&general.key_file).map(PathBuf::from),
            delay_sign: advanced.delay_sign,
            target_platform: specified(&general.target_platform)
                .map(str::parse)
                .transpose()?,
            search_directories,
            allow_multiple_assembly_level_attributes: advanced
                .allow_multiple_assembly_level_attributes,
            allow_wild_cards: advanced.allow_wild_cards,
            allow_zero_pe_kind: advanced.allow_zero_pe_kind,
            allow_duplicate_types: specified(&advanced.allow_duplicate_type)
                .map(DuplicateType::parse_list)
                .unwrap_or_default(),
            attribute_file: specified(&advanced.attribute_file).map(PathBuf::from),
            closed: advanced.closed,
            copy_attributes: advanced.copy_attributes,
            debug_info: advanced.debug_info,
            internalize: advanced.internalize,
            exclude_file: specified(&advanced.exclude_file).map(PathBuf::from),
            log,
            log_file,
            public_key_tokens: parse_flag("PublicKeyTokens", &advanced.public_key_tokens)?
                .unwrap_or(true),
            file_alignment: advanced.effective_file_alignment(),
            target_kind: specified(&advanced.target_kind).map(str::parse).transpose()?,
            version: specified(&advanced.version).map(str::parse).transpose()?,
            union_merge: advanced.union_merge,
            xml_documentation: advanced.xml_documentation,
        })
    }
}

/// `None` when unset, otherwise the boolean the text spells.
fn parse_flag(field: &'static str, value: &Option<String>) -> Result<Option<bool>, ParameterError> {
    let Some(text) = specified(value) else {
        return Ok(None);
    };
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(Some(true)),
        "false" | "0" | "no" => Ok(Some(false)),
        _ => Err(ParameterError::InvalidFlag {
            field,
            value: text.to_string(),
        }),
    }
}

/// What a successful merge reports back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// The primary assembly was strong-named but the output is not.
    pub strong_name_lost: bool,
}

/// Adapter over the external merger.
pub trait MergeTool {
    fn merge(&self, params: &MergeParameters) -> Result<MergeOutcome, ToolError>;
}

impl<T: MergeTool + ?Sized> MergeTool for &T {
    fn merge(&self, params: &MergeParameters) -> Result<MergeOutcome, ToolError> {
        (**self).merge(params)
    }
}

/// Maps settings onto a tool invocation and interprets the result.
pub struct MergeOrchestrator<T: MergeTool> {
    tool: T,
}

impl<T: MergeTool> MergeOrchestrator<T> {
    pub fn new(tool: T) -> Self {
        Self { tool }
    }

    /// Run one merge.
    ///
    /// Tool failures are logged with their full output and returned; they
    /// never panic.
    pub fn invoke(&self, settings: &MergerSettings) -> Result<MergeOutcome, MergeError> {
        log::info!("Setting up merge.");
        let params = MergeParameters::from_settings(settings)?;

        ensure_output_dir(&params.output_file)?;

        let count = params.input_assemblies.len();
        log::info!(
            "Merging {} assembl{} to '{}'.",
            count,
            if count == 1 { "y" } else { "ies" },
            params.output_file.display()
        );

        let outcome = match self.tool.merge(&params) {
            Ok(outcome) => outcome,
            Err(e) => {
                if let ToolError::Failed { output, .. } = &e {
                    for line in output.lines() {
                        log::error!("{}", line);
                    }
                }
                return Err(e.into());
            }
        };

        if outcome.strong_name_lost {
            log::info!("StrongNameLost = true");
        }
        Ok(outcome)
    }
}

fn ensure_output_dir(output_file: &Path) -> Result<(), MergeError> {
    let Some(dir) = output_file.parent().filter(|d| !d.as_os_str().is_empty()) else {
        return Ok(());
    };
    if dir.is_dir() {
        return Ok(());
    }

    log::warn!(
        "Output directory not found. An attempt to create the directory will be made: {}",
        dir.display()
    );
    fs::create_dir_all(dir).map_err(|source| MergeError::OutputDirectory {
        path: dir.to_path_buf(),
        source,
    })?;
    log::info!("Output directory created.");
    Ok(())
}
