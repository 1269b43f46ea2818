//! Locating the Rust sources a pass scans.

use std::path::{Path, PathBuf};

use error_stack::{Report, ResultExt};
use tracing::debug;

use crate::error::{Error, Result};

/// A directory holding a crate root (`lib.rs` or `main.rs`) and its modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRoot {
    /// Directory that is scanned.
    pub dir:   PathBuf,
    /// Name used in logs, usually the package name.
    pub label: String,
}

impl SourceRoot {
    /// A root labelled after its directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let label = dir.display().to_string();
        Self { dir, label }
    }
}

/// Check if a directory should be skipped during scanning
fn should_skip_directory(dir: &Path) -> bool {
    dir.file_name().is_some_and(|name| {
        let name_str = name.to_string_lossy();
        name_str.starts_with('.') || name_str == "target"
    })
}

/// Every `.rs` file below `root`, sorted so that passes are deterministic.
///
/// # Errors
///
/// [`Error::SourceRoot`] when `root` itself cannot be read. Unreadable
/// subdirectories are skipped.
pub fn source_files(root: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(root).change_context(Error::SourceRoot {
        path: root.to_path_buf(),
    })?;

    let mut files = Vec::new();
    let mut pending: Vec<PathBuf> = entries.flatten().map(|entry| entry.path()).collect();
    while let Some(path) = pending.pop() {
        if path.is_dir() {
            if should_skip_directory(&path) {
                continue;
            }
            match std::fs::read_dir(&path) {
                Ok(entries) => pending.extend(entries.flatten().map(|entry| entry.path())),
                Err(e) => debug!("Skipping unreadable directory '{}': {}", path.display(), e),
            }
        } else if path.extension().is_some_and(|extension| extension == "rs") {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Module segments for `file` relative to its crate's source `root`.
///
/// `lib.rs` and `main.rs` at the root are the crate root, `mod.rs` names its
/// directory, and any other file names itself.
pub(super) fn module_segments(root: &Path, file: &Path) -> Vec<String> {
    let Ok(relative) = file.strip_prefix(root) else {
        return Vec::new();
    };

    let mut segments: Vec<String> = relative
        .with_extension("")
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();

    match segments.last().map(String::as_str) {
        Some("mod") => {
            segments.pop();
        },
        Some("lib" | "main") if segments.len() == 1 => segments.clear(),
        _ => {},
    }
    segments
}

/// Source directory of the library target of dependency `name`, located with `cargo metadata`.
///
/// Dashes and underscores in package names are treated as equivalent.
///
/// # Errors
///
/// [`Error::Dependency`] when `cargo metadata` fails or the package has no library target.
pub fn dependency_root(manifest_dir: &Path, name: &str) -> Result<SourceRoot> {
    let failure = || Error::Dependency {
        name: name.to_string(),
    };

    let metadata = cargo_metadata::MetadataCommand::new()
        .current_dir(manifest_dir)
        .exec()
        .change_context_lazy(failure)?;

    let wanted = name.replace('-', "_");
    let package = metadata
        .packages
        .iter()
        .find(|package| package.name.as_str().replace('-', "_") == wanted)
        .ok_or_else(|| Report::new(failure()))?;

    let library = package
        .targets
        .iter()
        .find(|target| target.is_lib())
        .ok_or_else(|| Report::new(failure()))?;

    let dir = library
        .src_path
        .parent()
        .ok_or_else(|| Report::new(failure()))?;

    debug!("Dependency '{}' sources at '{}'", package.name, dir);
    Ok(SourceRoot {
        dir:   dir.as_std_path().to_path_buf(),
        label: package.name.to_string(),
    })
}
