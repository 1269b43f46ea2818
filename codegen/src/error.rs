//! Pass-level failures.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for pass-level operations of `buildergen_codegen`
pub type Result<T> = std::result::Result<T, error_stack::Report<Error>>;

/// Failures that abort a whole generation pass.
///
/// Problems with a single directive are [`crate::Diagnostic`]s instead.
#[derive(Error, Debug)]
pub enum Error {
    /// No output directory was configured and `OUT_DIR` is unset.
    #[error("Missing output directory: set OUT_DIR or configure one with `Config::out_dir`")]
    MissingOutputDirectory,

    /// The builder output directory could not be created.
    #[error("Cannot create output directory {}", path.display())]
    OutputDirectory {
        /// Directory that could not be created.
        path: PathBuf,
    },

    /// Builder files left by an earlier pass could not be removed.
    #[error("Cannot remove stale builders from {}", path.display())]
    StaleBuilders {
        /// File or directory that could not be cleared.
        path: PathBuf,
    },

    /// A configured source root could not be read.
    #[error("Cannot read source root {}", path.display())]
    SourceRoot {
        /// The unreadable root.
        path: PathBuf,
    },

    /// A configured dependency could not be located with `cargo metadata`.
    #[error("Cannot locate sources of dependency `{name}`")]
    Dependency {
        /// Package name as configured.
        name: String,
    },

    /// A plan could not be turned into Rust tokens.
    #[error("Cannot render builder `{unit}`: {reason}")]
    Render {
        /// Unit being rendered.
        unit:   String,
        /// What went wrong.
        reason: String,
    },

    /// A rendered builder could not be written.
    #[error("Cannot write builder file {}", path.display())]
    WriteBuilder {
        /// Destination file.
        path: PathBuf,
    },
}
