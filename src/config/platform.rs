//! Target framework to merge-platform mapping.
//!
//! The merge tool wants its platform as `"<kind>, <frameworkDir>"`, where
//! `kind` is the runtime generation (`v1`, `v1.1`, `v2`, `v4`) and
//! `frameworkDir` the installed .NET Framework directory for that runtime.

/// Windows directory assumed when the environment does not name one.
pub const DEFAULT_WINDOWS_DIR: &str = r"C:\Windows";

/// Platform mapping errors
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("unsupported target framework version: {0:?}")]
    UnsupportedFramework(String),
}

/// Maps a build's framework version and architecture to a platform
/// descriptor.
pub trait PlatformResolver {
    fn target_platform(
        &self,
        framework_version: &str,
        architecture: &str,
    ) -> Result<String, PlatformError>;
}

/// Built-in table of .NET Framework runtimes.
#[derive(Debug, Clone)]
pub struct FrameworkTable {
    windows_dir: String,
}

/// `(kind, runtime directory)` per framework generation.
const RUNTIMES: &[(&str, &str)] = &[
    ("v1", "v1.0.3705"),
    ("v1.1", "v1.1.4322"),
    ("v2", "v2.0.50727"),
    ("v4", "v4.0.30319"),
];

/// Architectures that install into `Framework64`.
const ARCH_64: &[&str] = &["x64", "amd64", "arm64", "ia64"];

impl FrameworkTable {
    pub fn new(windows_dir: impl Into<String>) -> Self {
        Self {
            windows_dir: windows_dir.into(),
        }
    }

    /// Take the Windows directory from `WINDIR`/`windir`.
    pub fn from_env() -> Self {
        let windows_dir = std::env::var("WINDIR")
            .or_else(|_| std::env::var("windir"))
            .ok()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_WINDOWS_DIR.to_string());
        Self::new(windows_dir)
    }

    fn runtime_for(framework_version: &str) -> Option<(&'static str, &'static str)> {
        let version = framework_version
            .trim()
            .trim_start_matches(['v', 'V']);
        let mut parts = version.split('.');
        let major: u32 = parts.next()?.parse().ok()?;
        let minor: u32 = parts.next().unwrap_or("0").parse().ok()?;

        let kind = match (major, minor) {
            (1, 0) => "v1",
            (1, 1) => "v1.1",
            (2, _) | (3, _) => "v2",
            (4, _) => "v4",
            _ => return None,
        };
        RUNTIMES.iter().copied().find(|(k, _)| *k == kind)
    }
}

impl Default for FrameworkTable {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOWS_DIR)
    }
}

impl PlatformResolver for FrameworkTable {
    fn target_platform(
        &self,
        framework_version: &str,
        architecture: &str,
    ) -> Result<String, PlatformError> {
        let (kind, runtime) = Self::runtime_for(framework_version)
            .ok_or_else(|| PlatformError::UnsupportedFramework(framework_version.to_string()))?;

        let is_64 = ARCH_64
            .iter()
            .any(|a| a.eq_ignore_ascii_case(architecture.trim()));
        let framework = if is_64 { "Framework64" } else { "Framework" };

        let windows_dir = self.windows_dir.trim_end_matches(['\\', '/']);
        Ok(format!(
            r"{kind}, {windows_dir}\Microsoft.NET\{framework}\{runtime}"
        ))
    }
}
