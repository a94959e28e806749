//! Recursive file discovery under a scan root.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::LoadError;

/// A file found under the scan root.
///
/// `dirname` is the directory of the file relative to the scan root, always
/// `/`-separated and empty for files directly under the root. `basename` is
/// the file name with the configured extension removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub absolute_path: PathBuf,
    pub dirname: String,
    pub basename: String,
}

impl FileInfo {
    /// Location of the file relative to the scan root, without extension
    /// (e.g. `admin/dashboard`). Used to look up the controller registered
    /// for this file.
    pub fn module_key(&self) -> String {
        if self.dirname.is_empty() {
            self.basename.clone()
        } else {
            format!("{}/{}", self.dirname, self.basename)
        }
    }
}

/// Recursively list the files under `root` for which `predicate` returns true.
///
/// Traversal is depth-first with entries sorted by file name, so two passes
/// over an unchanged tree yield the same order. Directories are always
/// descended into and never handed to the predicate.
///
/// # Errors
///
/// Symbolic links are followed. Any unreadable entry (a missing root, a
/// dangling link, a link loop) aborts the walk with [`LoadError::Walk`]; no
/// partial result is returned.
pub fn walk(
    root: &Path,
    predicate: &dyn Fn(&FileInfo) -> bool,
    extension: &str,
) -> Result<Vec<FileInfo>, LoadError> {
    let root = root.canonicalize().map_err(|source| LoadError::Walk {
        path: root.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in WalkDir::new(&root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|err| LoadError::Walk {
            path: err.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone()),
            source: err.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let file = describe(&root, entry.path(), extension);
        if predicate(&file) {
            files.push(file);
        }
    }
    Ok(files)
}

fn describe(root: &Path, path: &Path, extension: &str) -> FileInfo {
    let dirname = path
        .parent()
        .and_then(|parent| parent.strip_prefix(root).ok())
        .map(|relative| {
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default();

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let basename = match name.strip_suffix(extension) {
        Some(stem) if !extension.is_empty() && !stem.is_empty() => stem.to_string(),
        _ => name,
    };

    FileInfo {
        absolute_path: path.to_path_buf(),
        dirname,
        basename,
    }
}
