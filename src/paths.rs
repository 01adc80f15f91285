//! Lexical path helpers.
//!
//! Nothing here touches the file system: paths are combined and cleaned the
//! way the build system reports them, so a file that does not exist yet
//! (the merge output, say) can still be named absolutely.

use std::path::{Component, Path, PathBuf};

/// Extension of the debug-symbol sidecar kept next to an assembly.
pub const DEBUG_SYMBOL_EXTENSION: &str = "pdb";

/// Suffix of the resolved-configuration snapshot written next to the output.
pub const SNAPSHOT_SUFFIX: &str = ".merge.json";

/// Drop `.` components and fold `..` into the preceding component.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                // `..` above the root stays at the root; above a relative
                // start it has to be kept
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Make `path` absolute by resolving it against `base`.
///
/// Rooted paths are returned cleaned but otherwise as given. When `base`
/// itself is relative the process working directory anchors it.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        return normalize(path);
    }

    let joined = base.join(path);
    if joined.is_absolute() {
        return normalize(&joined);
    }

    match std::env::current_dir() {
        Ok(cwd) => normalize(&cwd.join(joined)),
        Err(_) => normalize(&joined),
    }
}

/// `App.dll` -> `App.pdb`.
pub fn debug_symbols_for(assembly: &Path) -> PathBuf {
    assembly.with_extension(DEBUG_SYMBOL_EXTENSION)
}

/// `<dir>/App.dll` -> `<dir>/App.merge.json`.
pub fn snapshot_path(output_file: &Path) -> PathBuf {
    let stem = output_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = format!("{stem}{SNAPSHOT_SUFFIX}");
    match output_file.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// Component-wise path equality after cleaning.
pub fn same_path(a: &Path, b: &Path) -> bool {
    normalize(a) == normalize(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_folds_parent_components() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("../a/./b")), PathBuf::from("../a/b"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn test_absolutize_rooted_path_kept() {
        let result = absolutize(Path::new("/keys/app.snk"), Path::new("/proj"));
        assert_eq!(result, PathBuf::from("/keys/app.snk"));
    }

    #[test]
    fn test_absolutize_relative_against_base() {
        let result = absolutize(Path::new("../keys/app.snk"), Path::new("/src/proj"));
        assert_eq!(result, PathBuf::from("/src/keys/app.snk"));
    }

    #[test]
    fn test_absolutize_relative_base_uses_cwd() {
        let result = absolutize(Path::new("app.snk"), Path::new("proj"));
        assert!(result.is_absolute());
        assert!(result.ends_with("proj/app.snk"));
    }

    #[test]
    fn test_debug_symbols_for() {
        assert_eq!(
            debug_symbols_for(Path::new("/out/App.dll")),
            PathBuf::from("/out/App.pdb")
        );
    }

    #[test]
    fn test_snapshot_path() {
        assert_eq!(
            snapshot_path(Path::new("/out/merged/App.dll")),
            PathBuf::from("/out/merged/App.merge.json")
        );
        assert_eq!(
            snapshot_path(Path::new("App.exe")),
            PathBuf::from("App.merge.json")
        );
    }

    #[test]
    fn test_same_path() {
        assert!(same_path(Path::new("/out/App.dll"), Path::new("/out/./App.dll")));
        assert!(same_path(Path::new("/out/"), Path::new("/out")));
        assert!(!same_path(Path::new("/out/App.dll"), Path::new("/obj/App.dll")));
    }
}
