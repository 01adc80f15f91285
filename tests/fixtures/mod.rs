//! Shared fixtures for the integration tests: a throwaway solution tree on
//! disk and a merge tool that records what it was asked to do.

#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use ilmerge_task::merge::{MergeOutcome, MergeParameters, MergeTool, ToolError};
use ilmerge_task::BuildContext;
use tempfile::TempDir;

/// Solution layout under a temporary directory:
///
/// ```text
/// <root>/App.sln
/// <root>/src/App/            project dir
/// <root>/src/App/obj/        intermediate output
/// <root>/out/                target dir
/// <root>/task/build/         task binary dir (empty)
/// ```
pub struct Workspace {
    root: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let root = TempDir::new().expect("create temp dir");
        let ws = Self { root };
        for dir in [ws.project_dir(), ws.project_dir().join("obj"), ws.target_dir(), ws.task_dir()] {
            fs::create_dir_all(dir).expect("create layout");
        }
        ws
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn project_dir(&self) -> PathBuf {
        self.root().join("src").join("App")
    }

    pub fn target_dir(&self) -> PathBuf {
        self.root().join("out")
    }

    /// Two levels below the root, so the package-folder scan stays inside
    /// the workspace.
    pub fn task_dir(&self) -> PathBuf {
        self.root().join("task").join("build")
    }

    pub fn target_path(&self) -> PathBuf {
        self.target_dir().join("App.dll")
    }

    pub fn config_path(&self) -> PathBuf {
        self.project_dir().join("ILMergeConfig.json")
    }

    /// Create a file (and its parent directories).
    pub fn touch(&self, path: &Path, contents: &str) -> PathBuf {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, contents).expect("write file");
        path.to_path_buf()
    }

    pub fn write_config(&self, json: &str) -> PathBuf {
        self.touch(&self.config_path(), json)
    }

    /// Put a merge executable into the target directory.
    pub fn install_tool(&self) -> PathBuf {
        self.touch(&self.target_dir().join("ILMerge.exe"), "MZ")
    }

    pub fn context(&self) -> BuildContext {
        let text = |p: PathBuf| p.to_string_lossy().into_owned();
        BuildContext {
            configuration_file: Some(self.config_path()),
            solution_dir: text(self.root().to_path_buf()),
            solution_path: text(self.root().join("App.sln")),
            project_dir: text(self.project_dir()),
            project_file_name: "App.csproj".to_string(),
            project_path: text(self.project_dir().join("App.csproj")),
            target_dir: text(self.target_dir()),
            target_path: text(self.target_path()),
            target_file_name: "App.dll".to_string(),
            target_framework_version: "v4.7.2".to_string(),
            target_architecture: "x86".to_string(),
            task_dir: Some(self.task_dir()),
            ..Default::default()
        }
    }
}

/// Merge tool fake. Records every call and, like the real tool, writes the
/// output assembly (plus debug symbols) when asked.
#[derive(Default)]
pub struct RecordingTool {
    pub calls: RefCell<Vec<MergeParameters>>,
    pub write_output: bool,
    pub fail: bool,
}

impl RecordingTool {
    pub fn writing_output() -> Self {
        Self {
            write_output: true,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn only_call(&self) -> MergeParameters {
        let calls = self.calls.borrow();
        assert_eq!(calls.len(), 1, "expected exactly one merge");
        calls[0].clone()
    }
}

impl MergeTool for RecordingTool {
    fn merge(&self, params: &MergeParameters) -> Result<MergeOutcome, ToolError> {
        self.calls.borrow_mut().push(params.clone());
        if self.fail {
            return Err(ToolError::Failed {
                code: Some(1),
                output: "An exception occurred during merging:".to_string(),
            });
        }
        if self.write_output {
            fs::write(&params.output_file, "merged").map_err(|source| ToolError::Spawn {
                program: PathBuf::from("recording"),
                source,
            })?;
            fs::write(params.output_file.with_extension("pdb"), "merged pdb").map_err(|source| {
                ToolError::Spawn {
                    program: PathBuf::from("recording"),
                    source,
                }
            })?;
        }
        Ok(MergeOutcome::default())
    }
}

/// JSON string literal for a path, escaped like the configuration expects.
pub fn json_path(path: &Path) -> String {
    serde_json::to_string(&path.to_string_lossy()).expect("path to json")
}
