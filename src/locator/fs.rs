//! File-system port used by the executable search.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// The slice of the file system the locator looks at.
pub trait FileSystem {
    fn is_file(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    /// Immediate subdirectories of `dir`, in enumeration order.
    fn child_dirs(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// First file named `file_name` (ASCII case-insensitive) anywhere under
    /// `root`, in traversal order.
    fn find_file(&self, root: &Path, file_name: &str) -> Option<PathBuf>;
}

impl<F: FileSystem + ?Sized> FileSystem for &F {
    fn is_file(&self, path: &Path) -> bool {
        (**self).is_file(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        (**self).is_dir(path)
    }

    fn child_dirs(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        (**self).child_dirs(dir)
    }

    fn find_file(&self, root: &Path, file_name: &str) -> Option<PathBuf> {
        (**self).find_file(root, file_name)
    }
}

/// The real file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn child_dirs(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut dirs = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        Ok(dirs)
    }

    fn find_file(&self, root: &Path, file_name: &str) -> Option<PathBuf> {
        WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(Result::ok)
            .find(|entry| {
                entry.file_type().is_file()
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| name.eq_ignore_ascii_case(file_name))
            })
            .map(walkdir::DirEntry::into_path)
    }
}
