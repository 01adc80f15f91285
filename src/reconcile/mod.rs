//! Post-merge cleanup of the build's target directory
//!
//! After a merge the target directory still holds copies of every merged
//! input. Reconciliation removes them (with their debug symbols) and puts
//! the merged output in place of the build's own target. The merged output
//! is copied, never moved.
//!
//! Every file is handled on its own: a failure is recorded in the report
//! and the remaining files are still processed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ilmerge_settings::{specified, MergerSettings};

use crate::context::BuildContext;
use crate::paths;

/// What was attempted for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Delete,
    Copy { from: PathBuf },
}

/// How it went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Done,
    /// Nothing to do, the source or target does not exist.
    Absent,
    /// Left alone because it is the merged output itself.
    Kept,
    Failed(String),
}

/// Outcome for a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub step: Step,
    pub path: PathBuf,
    pub status: ItemStatus,
}

/// Result of one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub items: Vec<ItemOutcome>,
}

impl ReconcileReport {
    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.items
            .iter()
            .filter(|i| matches!(i.status, ItemStatus::Failed(_)))
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Paths removed.
    pub fn deleted(&self) -> Vec<&Path> {
        self.with(|step| matches!(step, Step::Delete))
    }

    /// Paths written.
    pub fn copied(&self) -> Vec<&Path> {
        self.with(|step| matches!(step, Step::Copy { .. }))
    }

    fn with(&self, pred: impl Fn(&Step) -> bool) -> Vec<&Path> {
        self.items
            .iter()
            .filter(|i| i.status == ItemStatus::Done && pred(&i.step))
            .map(|i| i.path.as_path())
            .collect()
    }

    fn record(&mut self, step: Step, path: PathBuf, status: ItemStatus) {
        match &status {
            ItemStatus::Done => match &step {
                Step::Delete => log::info!("Deleted {}", path.display()),
                Step::Copy { from } => {
                    log::info!("Copied {} to {}", from.display(), path.display())
                }
            },
            ItemStatus::Absent => log::debug!("Nothing to do for {}", path.display()),
            ItemStatus::Kept => log::info!("Keeping merged output {}", path.display()),
            ItemStatus::Failed(reason) => log::error!("{}: {}", path.display(), reason),
        }
        self.items.push(ItemOutcome { step, path, status });
    }
}

/// Removes merged copies from the target directory and promotes the merged
/// output to the build's target path.
#[derive(Debug, Clone)]
pub struct OutputReconciler {
    target_dir: PathBuf,
    target_path: PathBuf,
}

impl OutputReconciler {
    pub fn new(target_dir: impl Into<PathBuf>, target_path: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            target_path: target_path.into(),
        }
    }

    pub fn from_context(context: &BuildContext) -> Self {
        Self::new(&context.target_dir, context.target_path())
    }

    pub fn reconcile(&self, settings: &MergerSettings) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let Some(output) = specified(&settings.general.output_file).map(PathBuf::from) else {
            log::warn!("No output file configured, nothing to reconcile.");
            return report;
        };
        let protected = [output.clone(), paths::debug_symbols_for(&output)];

        let inputs = &settings.general.input_assemblies;
        log::info!(
            "Deleting merged assembl{}",
            if inputs.len() == 1 { "y" } else { "ies" }
        );
        for input in inputs {
            // inputs may come from other projects; only their copies in the
            // target directory are removed
            let Some(name) = Path::new(input).file_name() else {
                continue;
            };
            self.delete_with_symbols(&self.target_dir.join(name), &protected, &mut report);
        }

        log::info!("Overwriting output target");
        self.delete_with_symbols(&self.target_path, &protected, &mut report);

        if paths::same_path(&output, &self.target_path) {
            report.record(
                Step::Copy { from: output.clone() },
                self.target_path.clone(),
                ItemStatus::Kept,
            );
            return report;
        }

        copy_if_present(&output, &self.target_path, &mut report);
        copy_if_present(
            &paths::debug_symbols_for(&output),
            &paths::debug_symbols_for(&self.target_path),
            &mut report,
        );

        report
    }

    fn delete_with_symbols(&self, file: &Path, protected: &[PathBuf], report: &mut ReconcileReport) {
        for path in [file.to_path_buf(), paths::debug_symbols_for(file)] {
            if protected.iter().any(|p| paths::same_path(p, &path)) {
                report.record(Step::Delete, path, ItemStatus::Kept);
                continue;
            }
            let status = delete_file(&path);
            report.record(Step::Delete, path, status);
        }
    }
}

fn delete_file(path: &Path) -> ItemStatus {
    if !path.is_file() {
        return ItemStatus::Absent;
    }
    match fs::remove_file(path) {
        Ok(()) => ItemStatus::Done,
        Err(e) if e.kind() == io::ErrorKind::NotFound => ItemStatus::Absent,
        Err(e) => ItemStatus::Failed(format!("cannot delete: {}", e)),
    }
}

fn copy_if_present(from: &Path, to: &Path, report: &mut ReconcileReport) {
    let step = Step::Copy {
        from: from.to_path_buf(),
    };
    if !from.is_file() {
        report.record(step, to.to_path_buf(), ItemStatus::Absent);
        return;
    }
    let status = match fs::copy(from, to) {
        Ok(_) => ItemStatus::Done,
        Err(e) => ItemStatus::Failed(format!("cannot copy from {}: {}", from.display(), e)),
    };
    report.record(step, to.to_path_buf(), status);
}
