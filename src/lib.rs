//! ILMerge build task
//!
//! Merges a project's build output with its dependent assemblies using the
//! ILMerge tool, after compilation. The task reads an optional JSON merge
//! configuration, fills the gaps from the build context, finds the merge
//! executable, runs it and optionally replaces the build's target with the
//! merged assembly.

pub mod config;
pub mod context;
pub mod locator;
pub mod merge;
pub mod paths;
pub mod pipeline;
pub mod reconcile;

pub use config::{MergerSettings, SettingsResolver, TokenSubstitutor};
pub use context::BuildContext;
pub use locator::{ExecutableLocator, FileSystem, OsFileSystem, ToolIdentity};
pub use merge::{MergeOrchestrator, MergeOutcome, MergeParameters, MergeTool, ProcessMergeTool};
pub use pipeline::{MergeTask, TaskError, TaskReport};
pub use reconcile::{OutputReconciler, ReconcileReport};
