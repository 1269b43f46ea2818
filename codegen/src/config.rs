//! Settings for one generation pass.

use std::path::{Path, PathBuf};

use crate::host::SourceRoot;

/// What a pass scans, where it writes, and what it tells cargo.
///
/// ```no_run
/// let report = buildergen_codegen::Config::from_env()
///     .dependency("shared-models")
///     .generate()?;
/// # Ok::<(), error_stack::Report<buildergen_codegen::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub(crate) out_dir:          Option<PathBuf>,
    pub(crate) manifest_dir:     Option<PathBuf>,
    pub(crate) roots:            Vec<SourceRoot>,
    pub(crate) dependencies:     Vec<String>,
    pub(crate) rerun_if_changed: bool,
    pub(crate) cargo_directives: bool,
}

impl Config {
    /// An empty configuration: no roots, no output directory, no cargo output.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Configuration for the build script of the current package.
    ///
    /// Reads `OUT_DIR`, scans `$CARGO_MANIFEST_DIR/src` labelled with
    /// `CARGO_PKG_NAME`, and prints cargo directives.
    #[must_use]
    pub fn from_env() -> Self {
        let manifest_dir = std::env::var_os("CARGO_MANIFEST_DIR").map(PathBuf::from);
        let label = std::env::var("CARGO_PKG_NAME").ok();

        let roots = manifest_dir
            .as_ref()
            .map(|dir| {
                let mut root = SourceRoot::new(dir.join("src"));
                if let Some(label) = label {
                    root.label = label;
                }
                root
            })
            .into_iter()
            .collect();

        Self {
            out_dir: std::env::var_os("OUT_DIR").map(PathBuf::from),
            manifest_dir,
            roots,
            dependencies: Vec::new(),
            rerun_if_changed: true,
            cargo_directives: true,
        }
    }

    /// Write builders below `dir` instead of `OUT_DIR`.
    #[must_use]
    pub fn out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(dir.into());
        self
    }

    /// Directory whose `Cargo.toml` anchors `cargo metadata` for [`Self::dependency`].
    #[must_use]
    pub fn manifest_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.manifest_dir = Some(dir.into());
        self
    }

    /// Also scan the crate rooted at `dir`.
    #[must_use]
    pub fn source_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.roots.push(SourceRoot::new(dir));
        self
    }

    /// Also scan the library sources of dependency `name`.
    ///
    /// Types declared there can be targets of `builder_of` markers.
    #[must_use]
    pub fn dependency(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(name.into());
        self
    }

    /// Print `cargo:rerun-if-changed` for every scanned root and file.
    #[must_use]
    pub const fn rerun_if_changed(mut self, enabled: bool) -> Self {
        self.rerun_if_changed = enabled;
        self
    }

    /// Print `cargo:warning` for every error diagnostic.
    #[must_use]
    pub const fn cargo_directives(mut self, enabled: bool) -> Self {
        self.cargo_directives = enabled;
        self
    }

    /// Configured output directory, if any.
    #[must_use]
    pub fn output_dir(&self) -> Option<&Path> { self.out_dir.as_deref() }

    /// Configured source roots, dependencies excluded.
    #[must_use]
    pub fn roots(&self) -> &[SourceRoot] { &self.roots }

    /// Run a pass with this configuration.
    ///
    /// # Errors
    ///
    /// See [`crate::Generator::run`].
    pub fn generate(self) -> crate::Result<crate::PassReport> { crate::Generator::new(self).run() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_methods_accumulate() {
        let config = Config::new()
            .out_dir("out")
            .source_root("a/src")
            .source_root("b/src")
            .dependency("shared")
            .rerun_if_changed(true);

        assert_eq!(config.output_dir(), Some(Path::new("out")));
        let dirs: Vec<_> = config.roots().iter().map(|root| root.dir.clone()).collect();
        assert_eq!(dirs, [PathBuf::from("a/src"), PathBuf::from("b/src")]);
        assert_eq!(config.dependencies, ["shared"]);
        assert!(config.rerun_if_changed);
        assert!(!config.cargo_directives);
    }
}
