//! `General` and `Advanced` configuration sections.

use serde::{Deserialize, Serialize};

use crate::de;

/// File alignment used when the configured value is missing or not positive.
pub const DEFAULT_FILE_ALIGNMENT: i32 = 512;

/// Returns the value when it is set to something other than whitespace.
///
/// Optional text fields treat `null`, `""` and blank strings alike: the
/// value was not specified.
pub fn specified(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// What gets merged and where the result goes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GeneralSettings {
    /// Assemblies to merge. The first entry is the primary assembly.
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub input_assemblies: Vec<String>,

    #[serde(default)]
    pub output_file: Option<String>,

    /// Strong-name key file. Unset means the output is not signed.
    #[serde(default)]
    pub key_file: Option<String>,

    /// `"<kind>, <frameworkDir>"`, e.g. `"v4, C:\Windows\Microsoft.NET\Framework\v4.0.30319"`.
    #[serde(default)]
    pub target_platform: Option<String>,

    /// Explicit path to the merge executable, bypassing discovery.
    #[serde(rename = "AlternativeILMergePath", default)]
    pub alternative_ilmerge_path: Option<String>,
}

/// Merge behavior switches forwarded to the tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AdvancedSettings {
    /// `"*"` for every type, otherwise a comma-separated list of type names.
    #[serde(default)]
    pub allow_duplicate_type: Option<String>,

    #[serde(default)]
    pub allow_multiple_assembly_level_attributes: bool,

    #[serde(default)]
    pub allow_wild_cards: bool,

    #[serde(default)]
    pub allow_zero_pe_kind: bool,

    #[serde(default)]
    pub attribute_file: Option<String>,

    /// Closed-world merge: pull in every referenced assembly.
    #[serde(default)]
    pub closed: bool,

    #[serde(default)]
    pub copy_attributes: bool,

    #[serde(default = "default_debug_info")]
    pub debug_info: bool,

    #[serde(default)]
    pub delay_sign: bool,

    /// Remove merged inputs from the target directory and replace the
    /// build's target with the merged output.
    #[serde(default)]
    pub delete_copies_overwrite_target: bool,

    #[serde(default)]
    pub exclude_file: Option<String>,

    #[serde(default = "default_file_alignment")]
    pub file_alignment: i32,

    #[serde(default)]
    pub internalize: bool,

    #[serde(default, deserialize_with = "de::flag_text")]
    pub log: Option<String>,

    #[serde(default)]
    pub log_file: Option<String>,

    #[serde(default, deserialize_with = "de::flag_text")]
    pub public_key_tokens: Option<String>,

    #[serde(default, deserialize_with = "de::null_as_default")]
    pub search_directories: Vec<String>,

    /// `library`, `exe`, `winexe` or `SameAsPrimaryAssembly`.
    #[serde(default)]
    pub target_kind: Option<String>,

    #[serde(default)]
    pub union_merge: bool,

    /// Assembly version for the output, `major.minor[.build[.revision]]`.
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub xml_documentation: bool,
}

fn default_debug_info() -> bool {
    true
}

fn default_file_alignment() -> i32 {
    DEFAULT_FILE_ALIGNMENT
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            allow_duplicate_type: None,
            allow_multiple_assembly_level_attributes: false,
            allow_wild_cards: false,
            allow_zero_pe_kind: false,
            attribute_file: None,
            closed: false,
            copy_attributes: false,
            debug_info: default_debug_info(),
            delay_sign: false,
            delete_copies_overwrite_target: false,
            exclude_file: None,
            file_alignment: DEFAULT_FILE_ALIGNMENT,
            internalize: false,
            log: None,
            log_file: None,
            public_key_tokens: None,
            search_directories: Vec::new(),
            target_kind: None,
            union_merge: false,
            version: None,
            xml_documentation: false,
        }
    }
}

impl AdvancedSettings {
    /// File alignment to hand to the tool: the configured value, or 512 when
    /// it is not positive.
    pub fn effective_file_alignment(&self) -> u32 {
        if self.file_alignment > 0 {
            self.file_alignment as u32
        } else {
            DEFAULT_FILE_ALIGNMENT as u32
        }
    }

    /// Adds a search directory unless an equivalent path is already listed.
    ///
    /// Returns `true` when the directory was added.
    pub fn add_search_directory(&mut self, dir: &str) -> bool {
        let candidate = std::path::Path::new(dir);
        if self
            .search_directories
            .iter()
            .any(|existing| std::path::Path::new(existing) == candidate)
        {
            return false;
        }
        self.search_directories.push(dir.to_string());
        true
    }
}
