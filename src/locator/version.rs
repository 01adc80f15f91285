//! Version keys from package directory names.
//!
//! `ILMerge.3.0.41` -> `"3041"`. The key is the rightmost dotted numeric run
//! with the dots removed, compared as text. Digit groups of different widths
//! therefore do not compare numerically: `1.10.0` keys as `"1100"` and sorts
//! below `1.9.0`, keyed `"190"`. The run must start with a dot, so digits
//! glued to the name (`Tool7.1.2`) are not part of the key.

use std::cmp::Ordering;
use std::path::Path;
use std::sync::OnceLock;

use regex_lite::Regex;

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\.\d+(\.\d+)+").expect("version pattern is valid"))
}

/// Comparison key for the trailing version in `name`; empty when there is
/// none, which sorts below every real version.
pub fn version_key(name: &str) -> String {
    version_pattern()
        .find_iter(name)
        .last()
        .map(|m| m.as_str().replace('.', ""))
        .unwrap_or_default()
}

/// Order two names by their version keys.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    version_key(a).cmp(&version_key(b))
}

/// The path whose final component carries the highest version key.
///
/// On equal keys the earliest path in `dirs` wins.
pub fn highest_version<P: AsRef<Path>>(dirs: &[P]) -> Option<&P> {
    let name_of = |p: &P| {
        p.as_ref()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    };

    dirs.iter().reduce(|best, candidate| {
        if compare_names(&name_of(candidate), &name_of(best)) == Ordering::Greater {
            candidate
        } else {
            best
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_version_key() {
        assert_eq!(version_key("Tool.7.1.2"), "712");
        assert_eq!(version_key("ILMerge.3.0.41"), "3041");
        assert_eq!(version_key("ILMerge"), "");
        assert_eq!(version_key("ILMerge.Tools"), "");
        // a single number is not a version
        assert_eq!(version_key("ILMerge.3"), "");
    }

    #[test]
    fn test_version_key_needs_leading_dot() {
        // digits glued to the name are not part of the version
        assert_eq!(version_key("Tool7.1.2"), "12");
        assert_eq!(version_key("Net45.3.0"), "30");
    }

    #[test]
    fn test_version_key_picks_trailing_group() {
        assert_eq!(version_key("Tool.1.2-build.20.5.7"), "2057");
        assert_eq!(version_key("Pkg.2.0.0-rc.1.5"), "15");
    }

    #[test]
    fn test_compare_equal_width_groups() {
        assert_eq!(compare_names("Tool.2.0.1", "Tool.1.9.9"), Ordering::Greater);
        assert_eq!(compare_names("Tool.1.9.9", "Tool.2.0.1"), Ordering::Less);
        assert_eq!(compare_names("Tool.1.0.0", "Other.1.0.0"), Ordering::Equal);
        assert_eq!(compare_names("Tool", "Tool.0.0.1"), Ordering::Less);
    }

    #[test]
    fn test_highest_version() {
        let dirs = vec![
            PathBuf::from("/packages/ILMerge.2.14.1208"),
            PathBuf::from("/packages/ILMerge.3.0.29"),
            PathBuf::from("/packages/ILMerge.Tools"),
        ];
        assert_eq!(
            highest_version(&dirs),
            Some(&PathBuf::from("/packages/ILMerge.3.0.29"))
        );
    }

    #[test]
    fn test_highest_version_tie_keeps_first() {
        let dirs = vec![
            PathBuf::from("/p/ILMerge.Tools"),
            PathBuf::from("/p/ILMerge.Console"),
        ];
        assert_eq!(highest_version(&dirs), Some(&PathBuf::from("/p/ILMerge.Tools")));
    }

    #[test]
    fn test_highest_version_empty() {
        let dirs: Vec<PathBuf> = Vec::new();
        assert!(highest_version(&dirs).is_none());
    }
}
