//! Writing rendered builders into the output directory.

mod render;

use std::fs;
use std::path::{Path, PathBuf};

use error_stack::{Report, ResultExt};
pub use render::{HEADER, render_source};
use tracing::debug;

use crate::error::{Error, Result};
use crate::plan::BuilderPlan;

/// Subdirectory of the output directory that holds builder files.
pub const BUILDER_DIR: &str = "buildergen";

/// Destination for planned builders.
pub trait Emit {
    /// Render and persist `plan`, returning where it went.
    ///
    /// # Errors
    ///
    /// [`Error::Render`] or [`Error::WriteBuilder`]; both concern this builder only.
    fn emit(&mut self, plan: &BuilderPlan) -> Result<PathBuf>;
}

/// Writes each builder to `<out_dir>/buildergen/<Unit>.rs`.
#[derive(Debug, Clone)]
pub struct FileEmitter {
    dir: PathBuf,
}

impl FileEmitter {
    /// Create the builder directory under `out_dir`.
    ///
    /// # Errors
    ///
    /// [`Error::OutputDirectory`] when the directory cannot be created.
    pub fn prepare(out_dir: &Path) -> Result<Self> {
        let dir = out_dir.join(BUILDER_DIR);
        fs::create_dir_all(&dir).change_context_lazy(|| Error::OutputDirectory { path: dir.clone() })?;
        Ok(Self { dir })
    }

    /// The builder directory under `out_dir`, if an earlier pass created it.
    #[must_use]
    pub fn existing(out_dir: &Path) -> Option<Self> {
        let dir = out_dir.join(BUILDER_DIR);
        dir.is_dir().then_some(Self { dir })
    }

    /// Delete every builder file in the directory that `keep` does not list.
    ///
    /// Returns the removed paths, sorted.
    ///
    /// # Errors
    ///
    /// [`Error::StaleBuilders`] when the directory cannot be listed or a file
    /// cannot be deleted.
    pub fn remove_stale(&self, keep: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.dir).change_context_lazy(|| Error::StaleBuilders {
            path: self.dir.clone(),
        })?;

        let mut removed = Vec::new();
        for entry in entries {
            let path = entry
                .change_context_lazy(|| Error::StaleBuilders {
                    path: self.dir.clone(),
                })?
                .path();
            if path.extension().is_none_or(|extension| extension != "rs") || keep.contains(&path) {
                continue;
            }
            fs::remove_file(&path).change_context_lazy(|| Error::StaleBuilders { path: path.clone() })?;
            debug!("Removed stale {}", path.display());
            removed.push(path);
        }
        removed.sort();
        Ok(removed)
    }

    /// Directory builders are written to.
    #[must_use]
    pub fn dir(&self) -> &Path { &self.dir }

    /// Path of the file for `unit`.
    #[must_use]
    pub fn path_of(&self, unit: &str) -> PathBuf { self.dir.join(format!("{unit}.rs")) }
}

impl Emit for FileEmitter {
    fn emit(&mut self, plan: &BuilderPlan) -> Result<PathBuf> {
        let source = render_source(plan).map_err(|reason| {
            Report::new(Error::Render {
                unit: plan.unit.clone(),
                reason,
            })
        })?;

        let path = self.path_of(&plan.unit);
        if fs::read_to_string(&path).is_ok_and(|existing| existing == source) {
            debug!("{} is up to date", path.display());
            return Ok(path);
        }

        fs::write(&path, source).change_context_lazy(|| Error::WriteBuilder { path: path.clone() })?;
        debug!("Wrote {}", path.display());
        Ok(path)
    }
}
