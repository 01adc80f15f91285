//! Merge executable discovery
//!
//! Strategies run in a fixed order and the first hit wins:
//! 1. Console path property published by the tool's package (must exist)
//! 2. Directory of this task's binary
//! 3. The build's target directory
//! 4. `<solution>/packages/<Prefix>` or `<Prefix>.*`, highest version only
//! 5. Package folder scan two levels above this task's binary, over every
//!    directory whose name starts with the prefix, in enumeration order
//!
//! Strategies 4 and 5 deliberately differ: the solution layout is
//! version-sorted, the package scan takes the first directory that holds the
//! executable anywhere below it.

mod fs;
mod version;

pub use fs::{FileSystem, OsFileSystem};
pub use version::{compare_names, highest_version, version_key};

use std::fmt;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::context::BuildContext;
use crate::paths;

/// Name of the merge tool's executable and package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolIdentity {
    /// File name of the executable, e.g. `ILMerge.exe`.
    pub executable: String,

    /// Package directory prefix, e.g. `ILMerge` for `ILMerge.3.0.41`.
    pub package_prefix: String,
}

impl Default for ToolIdentity {
    fn default() -> Self {
        Self {
            executable: "ILMerge.exe".to_string(),
            package_prefix: "ILMerge".to_string(),
        }
    }
}

impl ToolIdentity {
    /// Matches solution package directories `<prefix>` and `<prefix>.*`,
    /// ignoring case. The bare name is what an unversioned restore creates.
    fn package_matcher(&self) -> GlobSet {
        let prefix = globset::escape(&self.package_prefix);
        let mut builder = GlobSetBuilder::new();
        for pattern in [prefix.clone(), format!("{prefix}.*")] {
            let glob = GlobBuilder::new(&pattern)
                .case_insensitive(true)
                .literal_separator(true)
                .build()
                .expect("escaped prefix forms a valid glob");
            builder.add(glob);
        }
        builder.build().expect("escaped prefix forms a valid glob set")
    }

    /// True when `name` starts with the package prefix, ignoring case.
    fn has_package_prefix(&self, name: &str) -> bool {
        let prefix = self.package_prefix.as_bytes();
        name.len() >= prefix.len() && name.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix)
    }
}

/// Search strategies in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    ConsolePath,
    TaskDirectory,
    TargetDirectory,
    SolutionPackages,
    PackageFolder,
}

impl Strategy {
    pub const ORDER: [Strategy; 5] = [
        Strategy::ConsolePath,
        Strategy::TaskDirectory,
        Strategy::TargetDirectory,
        Strategy::SolutionPackages,
        Strategy::PackageFolder,
    ];
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::ConsolePath => "$(ILMergeConsolePath)",
            Strategy::TaskDirectory => "task location",
            Strategy::TargetDirectory => "target dir",
            Strategy::SolutionPackages => "solution dir",
            Strategy::PackageFolder => "package folder",
        };
        f.write_str(name)
    }
}

/// Where the search starts from. Empty entries skip their strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRoots {
    pub console_path: Option<PathBuf>,
    pub task_dir: Option<PathBuf>,
    pub target_dir: Option<PathBuf>,
    pub solution_dir: Option<PathBuf>,
}

impl SearchRoots {
    pub fn from_context(context: &BuildContext) -> Self {
        let non_empty = |s: &str| (!s.trim().is_empty()).then(|| PathBuf::from(s));
        Self {
            console_path: non_empty(&context.console_path),
            task_dir: context.task_dir(),
            target_dir: non_empty(&context.target_dir),
            solution_dir: non_empty(&context.solution_dir),
        }
    }
}

/// A located executable and the strategy that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub path: PathBuf,
    pub strategy: Strategy,
}

/// Outcome of a single strategy: a hit, or a note on why it missed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Found(PathBuf),
    Missed(String),
}

/// Locator errors
#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    /// The console path property names a file that is not there.
    #[error("{executable} was not found at $(ILMergeConsolePath): {path}")]
    ConsolePathMissing { executable: String, path: PathBuf },

    /// Every strategy missed.
    #[error("{executable} was not found ({} locations tried)", .attempts.len())]
    NotFound {
        executable: String,
        attempts: Vec<String>,
    },
}

/// Runs the search strategies against a file system.
pub struct ExecutableLocator<F: FileSystem> {
    fs: F,
    tool: ToolIdentity,
    roots: SearchRoots,
}

impl<F: FileSystem> ExecutableLocator<F> {
    pub fn new(fs: F, tool: ToolIdentity, roots: SearchRoots) -> Self {
        Self { fs, tool, roots }
    }

    pub fn tool(&self) -> &ToolIdentity {
        &self.tool
    }

    /// Try each strategy in order and return the first hit.
    ///
    /// Misses are logged as they happen and repeated as warnings when
    /// nothing is found.
    pub fn locate(&self) -> Result<Located, LocateError> {
        let mut attempts = Vec::new();

        for strategy in Strategy::ORDER {
            match self.probe(strategy)? {
                Probe::Found(path) => {
                    log::info!(
                        "{} found at ({}): {}",
                        self.tool.executable,
                        strategy,
                        path.display()
                    );
                    return Ok(Located { path, strategy });
                }
                Probe::Missed(note) => {
                    log::info!("{}", note);
                    attempts.push(note);
                }
            }
        }

        for note in &attempts {
            log::warn!("{}", note);
        }
        log::warn!(
            "Unable to determine custom package location or, location was determined but an {} package folder was not found.",
            self.tool.package_prefix
        );

        Err(LocateError::NotFound {
            executable: self.tool.executable.clone(),
            attempts,
        })
    }

    /// Run a single strategy.
    pub fn probe(&self, strategy: Strategy) -> Result<Probe, LocateError> {
        match strategy {
            Strategy::ConsolePath => self.probe_console_path(),
            Strategy::TaskDirectory => Ok(self.probe_directory(strategy, self.roots.task_dir.as_deref())),
            Strategy::TargetDirectory => {
                Ok(self.probe_directory(strategy, self.roots.target_dir.as_deref()))
            }
            Strategy::SolutionPackages => Ok(self.probe_solution_packages()),
            Strategy::PackageFolder => Ok(self.probe_package_folder()),
        }
    }

    fn missed(&self, strategy: Strategy, location: impl fmt::Display) -> Probe {
        Probe::Missed(format!(
            "{} not found at ({}): {}",
            self.tool.executable, strategy, location
        ))
    }

    fn probe_console_path(&self) -> Result<Probe, LocateError> {
        let Some(console_path) = &self.roots.console_path else {
            return Ok(Probe::Missed(format!(
                "Variable $(ILMergeConsolePath) is not available. For a better experience please make sure you are using the latest version of {}'s package.",
                self.tool.package_prefix
            )));
        };

        let cwd = std::env::current_dir().unwrap_or_default();
        let path = paths::absolutize(console_path, &cwd);
        if self.fs.is_file(&path) {
            Ok(Probe::Found(path))
        } else {
            Err(LocateError::ConsolePathMissing {
                executable: self.tool.executable.clone(),
                path,
            })
        }
    }

    fn probe_directory(&self, strategy: Strategy, dir: Option<&Path>) -> Probe {
        match dir {
            Some(dir) => match self.executable_in(dir) {
                Some(path) => Probe::Found(path),
                None => self.missed(strategy, dir.display()),
            },
            None => self.missed(strategy, "<not set>"),
        }
    }

    /// `<dir>/<exe>` or `<dir>/tools/<exe>`.
    fn executable_in(&self, dir: &Path) -> Option<PathBuf> {
        [dir.join(&self.tool.executable), dir.join("tools").join(&self.tool.executable)]
            .into_iter()
            .find(|candidate| self.fs.is_file(candidate))
    }

    /// Directories directly under `root` whose name passes `keep`, in
    /// enumeration order.
    fn child_dirs_where(&self, root: &Path, keep: impl Fn(&str) -> bool) -> Vec<PathBuf> {
        match self.fs.child_dirs(root) {
            Ok(dirs) => dirs
                .into_iter()
                .filter(|d| d.file_name().and_then(|n| n.to_str()).is_some_and(&keep))
                .collect(),
            Err(e) => {
                log::debug!("Cannot list {}: {}", root.display(), e);
                Vec::new()
            }
        }
    }

    fn probe_solution_packages(&self) -> Probe {
        let strategy = Strategy::SolutionPackages;
        let Some(solution_dir) = &self.roots.solution_dir else {
            return self.missed(strategy, "<not set>");
        };

        let packages = solution_dir.join("packages");
        if !self.fs.is_dir(&packages) {
            return self.missed(strategy, solution_dir.display());
        }

        let matcher = self.tool.package_matcher();
        let dirs = self.child_dirs_where(&packages, |name| matcher.is_match(name));
        let Some(latest) = highest_version(&dirs) else {
            return self.missed(strategy, solution_dir.display());
        };
        log::debug!("Latest {} package: {}", self.tool.package_prefix, latest.display());

        match self.executable_in(latest) {
            Some(path) => Probe::Found(path),
            None => self.missed(strategy, solution_dir.display()),
        }
    }

    fn probe_package_folder(&self) -> Probe {
        let strategy = Strategy::PackageFolder;
        let Some(task_dir) = &self.roots.task_dir else {
            return self.missed(strategy, "<task location unknown>");
        };
        log::info!("Task lib location: {}", task_dir.display());

        let Some(root) = task_dir.parent().and_then(Path::parent) else {
            return Probe::Missed(format!(
                "Unable to determine package root two levels above {}.",
                task_dir.display()
            ));
        };
        log::info!("Package location: {}", root.display());

        let dirs = self.child_dirs_where(root, |name| self.tool.has_package_prefix(name));
        if dirs.is_empty() {
            return Probe::Missed(format!(
                "No folder starting with '{}' was found under {}.",
                self.tool.package_prefix,
                root.display()
            ));
        }

        for dir in &dirs {
            if let Some(path) = self.fs.find_file(dir, &self.tool.executable) {
                log::info!("Executable found by dynamic search at: {}", dir.display());
                return Probe::Found(path);
            }
        }

        self.missed(strategy, root.display())
    }
}
