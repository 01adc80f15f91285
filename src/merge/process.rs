//! Runs the merge executable as a child process.
//!
//! This is the only place that knows the tool's command-line syntax. On
//! non-Windows hosts the executable is started through a runtime launcher
//! such as `mono`.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::{DuplicateType, MergeOutcome, MergeParameters, MergeTool, ToolError};

/// Line fragment the tool prints when the output loses the primary
/// assembly's strong name.
pub const STRONG_NAME_LOST_MARKER: &str = "had a strong name, but the output does not";

/// Merge tool backed by the real executable.
#[derive(Debug, Clone)]
pub struct ProcessMergeTool {
    executable: PathBuf,
    runtime: Option<PathBuf>,
}

impl ProcessMergeTool {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            runtime: None,
        }
    }

    /// Start the executable through `runtime` (e.g. `mono`).
    pub fn with_runtime(mut self, runtime: Option<PathBuf>) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Command-line arguments for one merge, inputs last.
    pub fn arguments(params: &MergeParameters) -> Vec<String> {
        let mut args = vec![format!("/out:{}", params.output_file.display())];

        if let Some(key_file) = &params.key_file {
            args.push(format!("/keyfile:{}", key_file.display()));
            if params.delay_sign {
                args.push("/delaysign".to_string());
            }
        }

        if params.log {
            match &params.log_file {
                Some(file) => args.push(format!("/log:{}", file.display())),
                None => args.push("/log".to_string()),
            }
        }

        if params.internalize {
            match &params.exclude_file {
                Some(file) => args.push(format!("/internalize:{}", file.display())),
                None => args.push("/internalize".to_string()),
            }
        }

        if let Some(kind) = params.target_kind {
            args.push(format!("/target:{}", kind.as_str()));
        }
        if params.closed {
            args.push("/closed".to_string());
        }
        if !params.debug_info {
            args.push("/ndebug".to_string());
        }
        if let Some(version) = params.version {
            args.push(format!("/ver:{}", version));
        }
        if params.copy_attributes {
            args.push("/copyattrs".to_string());
        }
        if params.allow_multiple_assembly_level_attributes {
            args.push("/allowMultiple".to_string());
        }
        if params.xml_documentation {
            args.push("/xmldocs".to_string());
        }
        if let Some(file) = &params.attribute_file {
            args.push(format!("/attr:{}", file.display()));
        }

        if let Some(platform) = &params.target_platform {
            match &platform.directory {
                Some(dir) => args.push(format!("/targetplatform:{},{}", platform.kind, dir)),
                None => args.push(format!("/targetplatform:{}", platform.kind)),
            }
        }

        if !params.public_key_tokens {
            args.push("/useFullPublicKeyForReferences".to_string());
        }
        if params.allow_wild_cards {
            args.push("/wildcards".to_string());
        }
        if params.allow_zero_pe_kind {
            args.push("/zeroPeKind".to_string());
        }

        for allowance in &params.allow_duplicate_types {
            match allowance {
                DuplicateType::All => args.push("/allowDup".to_string()),
                DuplicateType::Named(name) => args.push(format!("/allowDup:{}", name)),
            }
        }

        if params.union_merge {
            args.push("/union".to_string());
        }
        args.push(format!("/align:{}", params.file_alignment));

        for dir in &params.search_directories {
            args.push(format!("/lib:{}", dir.display()));
        }

        args.extend(params.input_assemblies.iter().map(|p| p.display().to_string()));
        args
    }

    fn command(&self, params: &MergeParameters) -> Command {
        let mut command = match &self.runtime {
            Some(runtime) => {
                let mut c = Command::new(runtime);
                c.arg(&self.executable);
                c
            }
            None => Command::new(&self.executable),
        };
        command
            .args(Self::arguments(params))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }
}

impl MergeTool for ProcessMergeTool {
    fn merge(&self, params: &MergeParameters) -> Result<MergeOutcome, ToolError> {
        log::info!("Loading merge tool from '{}'.", self.executable.display());
        let program = self.runtime.as_ref().unwrap_or(&self.executable);

        let output = self
            .command(params)
            .output()
            .map_err(|source| ToolError::Spawn {
                program: program.clone(),
                source,
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        for line in text.lines() {
            log::debug!("{}", line);
        }

        if !output.status.success() {
            return Err(ToolError::Failed {
                code: output.status.code(),
                output: text,
            });
        }

        Ok(MergeOutcome {
            strong_name_lost: strong_name_lost(&text),
        })
    }
}

fn strong_name_lost(output: &str) -> bool {
    output.lines().any(|line| line.contains(STRONG_NAME_LOST_MARKER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::{AssemblyVersion, TargetKind, TargetPlatform};

    fn params() -> MergeParameters {
        MergeParameters {
            input_assemblies: vec![PathBuf::from("/out/App.dll"), PathBuf::from("/libs/Dep.dll")],
            output_file: PathBuf::from("/out/merged/App.dll"),
            key_file: None,
            delay_sign: false,
            target_platform: None,
            search_directories: vec![PathBuf::from("/out")],
            allow_multiple_assembly_level_attributes: false,
            allow_wild_cards: false,
            allow_zero_pe_kind: false,
            allow_duplicate_types: Vec::new(),
            attribute_file: None,
            closed: false,
            copy_attributes: false,
            debug_info: true,
            internalize: false,
            exclude_file: None,
            log: false,
            log_file: None,
            public_key_tokens: true,
            file_alignment: 512,
            target_kind: None,
            version: None,
            union_merge: false,
            xml_documentation: false,
        }
    }

    #[test]
    fn test_minimal_arguments() {
        assert_eq!(
            ProcessMergeTool::arguments(&params()),
            vec![
                "/out:/out/merged/App.dll",
                "/align:512",
                "/lib:/out",
                "/out/App.dll",
                "/libs/Dep.dll",
            ]
        );
    }

    #[test]
    fn test_full_arguments() {
        let p = MergeParameters {
            key_file: Some(PathBuf::from("/keys/app.snk")),
            delay_sign: true,
            target_platform: Some(TargetPlatform {
                kind: "v4".to_string(),
                directory: Some("/fw/v4.0.30319".to_string()),
            }),
            allow_multiple_assembly_level_attributes: true,
            allow_wild_cards: true,
            allow_zero_pe_kind: true,
            allow_duplicate_types: vec![
                DuplicateType::Named("A".to_string()),
                DuplicateType::Named("B".to_string()),
            ],
            attribute_file: Some(PathBuf::from("/attr.dll")),
            closed: true,
            copy_attributes: true,
            debug_info: false,
            internalize: true,
            exclude_file: Some(PathBuf::from("/exclude.txt")),
            log: true,
            log_file: Some(PathBuf::from("/merge.log")),
            public_key_tokens: false,
            file_alignment: 4096,
            target_kind: Some(TargetKind::WinExe),
            version: Some("1.2.3.4".parse::<AssemblyVersion>().unwrap()),
            union_merge: true,
            xml_documentation: true,
            ..params()
        };

        let args = ProcessMergeTool::arguments(&p);
        for expected in [
            "/keyfile:/keys/app.snk",
            "/delaysign",
            "/log:/merge.log",
            "/internalize:/exclude.txt",
            "/target:winexe",
            "/closed",
            "/ndebug",
            "/ver:1.2.3.4",
            "/copyattrs",
            "/allowMultiple",
            "/xmldocs",
            "/attr:/attr.dll",
            "/targetplatform:v4,/fw/v4.0.30319",
            "/useFullPublicKeyForReferences",
            "/wildcards",
            "/zeroPeKind",
            "/allowDup:A",
            "/allowDup:B",
            "/union",
            "/align:4096",
        ] {
            assert!(args.iter().any(|a| a == expected), "{expected} missing from {args:?}");
        }
        assert_eq!(args.last().map(String::as_str), Some("/libs/Dep.dll"));
    }

    #[test]
    fn test_allow_dup_wildcard() {
        let p = MergeParameters {
            allow_duplicate_types: vec![DuplicateType::All],
            ..params()
        };
        let args = ProcessMergeTool::arguments(&p);
        assert_eq!(args.iter().filter(|a| a.starts_with("/allowDup")).count(), 1);
        assert!(args.iter().any(|a| a == "/allowDup"));
    }

    #[test]
    fn test_delay_sign_needs_key_file() {
        let p = MergeParameters {
            delay_sign: true,
            ..params()
        };
        assert!(!ProcessMergeTool::arguments(&p).iter().any(|a| a == "/delaysign"));
    }

    #[test]
    fn test_strong_name_marker() {
        assert!(strong_name_lost(
            "Merging...\nILMerge: Important! Primary assembly had a strong name, but the output does not.\n"
        ));
        assert!(!strong_name_lost("Merging...\nDone."));
    }

    #[test]
    fn test_spawn_failure_is_tool_error() {
        let tool = ProcessMergeTool::new("/nonexistent/ILMerge.exe");
        let err = tool.merge(&params()).unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }
}
