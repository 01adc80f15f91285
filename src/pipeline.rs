//! Pipeline orchestration for one merge task invocation
//!
//! Stages, in order:
//! - Validate the build context
//! - Load the configuration and substitute build properties
//! - Parse and resolve settings
//! - Locate the merge executable
//! - Write the configuration snapshot
//! - Merge
//! - Reconcile the target directory (opt-in)
//!
//! Any failure stops the pipeline. [`MergeTask::execute`] reduces the result
//! to the single boolean the host build expects.

use std::error::Error as _;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{
    load_config, parse_config, resolve_tool_path, write_snapshot, ConfigError, FrameworkTable,
    MergerSettings, PlatformResolver, ResolveError, SettingsResolver, TokenSubstitutor,
};
use crate::context::{BuildContext, ContextError};
use crate::locator::{ExecutableLocator, FileSystem, OsFileSystem, SearchRoots, ToolIdentity};
use crate::merge::{MergeError, MergeOrchestrator, MergeOutcome, MergeTool};
use crate::reconcile::{OutputReconciler, ReconcileReport};

/// Task errors
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("build context error: {0}")]
    Context(#[from] ContextError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Merge(#[from] MergeError),
}

impl TaskError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            TaskError::Config(_) => 1,
            TaskError::Resolve(ResolveError::AlternativePathMissing { .. })
            | TaskError::Resolve(ResolveError::Platform(_)) => 1,
            TaskError::Resolve(_) => 2,
            TaskError::Merge(MergeError::Parameters(_)) => 1,
            TaskError::Merge(_) => 3,
            TaskError::Context(_) => 4,
        }
    }
}

/// Result type for task operations
pub type TaskResult<T> = Result<T, TaskError>;

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub settings: MergerSettings,
    pub tool_path: PathBuf,
    pub outcome: MergeOutcome,
    /// Written configuration snapshot, if the write succeeded.
    pub snapshot: Option<PathBuf>,
    /// Present when reconciliation was requested.
    pub reconciliation: Option<ReconcileReport>,
}

/// One merge task invocation.
pub struct MergeTask<F: FileSystem = OsFileSystem> {
    context: BuildContext,
    tool: ToolIdentity,
    platforms: Box<dyn PlatformResolver>,
    fs: F,
}

impl MergeTask<OsFileSystem> {
    pub fn new(context: BuildContext) -> Self {
        Self {
            context,
            tool: ToolIdentity::default(),
            platforms: Box::new(FrameworkTable::from_env()),
            fs: OsFileSystem,
        }
    }
}

impl<F: FileSystem> MergeTask<F> {
    pub fn with_tool_identity(mut self, tool: ToolIdentity) -> Self {
        self.tool = tool;
        self
    }

    pub fn with_platforms(mut self, platforms: impl PlatformResolver + 'static) -> Self {
        self.platforms = Box::new(platforms);
        self
    }

    /// Search for the executable through another file system.
    pub fn with_file_system<G: FileSystem>(self, fs: G) -> MergeTask<G> {
        MergeTask {
            context: self.context,
            tool: self.tool,
            platforms: self.platforms,
            fs,
        }
    }

    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Load, substitute and parse the configuration. No configuration text
    /// means default settings.
    pub fn load_settings(&self) -> TaskResult<MergerSettings> {
        let raw = load_config(self.context.configuration_file.as_deref())?;
        if raw.trim().is_empty() {
            return Ok(MergerSettings::default());
        }

        let text = TokenSubstitutor::from_context(&self.context).substitute(&raw);
        Ok(parse_config(&text)?)
    }

    /// Run the whole pipeline. `connect` builds the merge tool once its
    /// executable is known.
    pub fn run<T, C>(&self, connect: C) -> TaskResult<TaskReport>
    where
        T: MergeTool,
        C: FnOnce(&Path) -> T,
    {
        self.context.log_inputs();
        self.context.validate()?;

        let settings = self.load_settings()?;
        let settings = SettingsResolver::new(&self.context, &*self.platforms).resolve(settings)?;

        let locator = ExecutableLocator::new(
            &self.fs,
            self.tool.clone(),
            SearchRoots::from_context(&self.context),
        );
        let tool_path = resolve_tool_path(&settings, &locator)?;

        // diagnostics only, a failed write never fails the run
        let snapshot = match write_snapshot(&settings) {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("Unable to save configuration snapshot: {}", e);
                None
            }
        };

        let outcome = MergeOrchestrator::new(connect(&tool_path)).invoke(&settings)?;

        let reconciliation = if settings.advanced.delete_copies_overwrite_target {
            let report = OutputReconciler::from_context(&self.context).reconcile(&settings);
            let failed = report.failures().count();
            if failed > 0 {
                log::warn!("{} file(s) could not be reconciled, see errors above.", failed);
            }
            Some(report)
        } else {
            None
        };

        Ok(TaskReport {
            settings,
            tool_path,
            outcome,
            snapshot,
            reconciliation,
        })
    }

    /// Run and reduce the result to success or failure, logging the cause.
    pub fn execute<T, C>(&self, connect: C) -> bool
    where
        T: MergeTool,
        C: FnOnce(&Path) -> T,
    {
        match self.run(connect) {
            Ok(_) => true,
            Err(e) => {
                log_failure(&e);
                false
            }
        }
    }
}

/// Log an error with its whole `source()` chain.
pub fn log_failure(error: &TaskError) {
    log::error!("{}", error);
    let mut source = error.source();
    while let Some(cause) = source {
        log::error!("  caused by: {}", cause);
        source = cause.source();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::LocateError;
    use crate::merge::{ParameterError, ToolError};

    #[test]
    fn test_exit_codes() {
        assert_eq!(TaskError::Context(ContextError::Missing("target_dir")).exit_code(), 4);
        assert_eq!(TaskError::Config(ConfigError::NoOutputFile).exit_code(), 1);
        assert_eq!(
            TaskError::Resolve(ResolveError::AlternativePathMissing {
                executable: "ILMerge.exe".to_string(),
                path: PathBuf::from("/x"),
            })
            .exit_code(),
            1
        );
        assert_eq!(
            TaskError::Resolve(ResolveError::ConsolePathMissing(LocateError::ConsolePathMissing {
                executable: "ILMerge.exe".to_string(),
                path: PathBuf::from("/x"),
            }))
            .exit_code(),
            2
        );
        assert_eq!(
            TaskError::Merge(MergeError::Parameters(ParameterError::NoInputs)).exit_code(),
            1
        );
        assert_eq!(
            TaskError::Merge(MergeError::Tool(ToolError::Failed {
                code: Some(1),
                output: String::new(),
            }))
            .exit_code(),
            3
        );
    }

    #[test]
    fn test_invalid_context_stops_before_loading() {
        struct NeverCalled;
        impl MergeTool for NeverCalled {
            fn merge(&self, _: &crate::merge::MergeParameters) -> Result<MergeOutcome, ToolError> {
                panic!("merge tool must not run");
            }
        }

        let task = MergeTask::new(BuildContext::default());
        let err = task.run(|_| NeverCalled).unwrap_err();
        assert!(matches!(err, TaskError::Context(ContextError::Missing("target_dir"))));
        assert!(!task.execute(|_| NeverCalled));
    }
}
