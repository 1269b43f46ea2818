//! Build-script side of `buildergen`.
//!
//! A pass scans the crate's sources for builder directives
//! (`#[derive(Builder)]`, `#[buildergen::builder]` and
//! `#[buildergen::builder_of(..)]`), plans one builder per directive, and
//! writes each to `$OUT_DIR/buildergen/<Unit>.rs`, where the attribute macros
//! of the `buildergen` crate include it.
//!
//! ```no_run
//! // build.rs
//! fn main() -> buildergen_codegen::Result<()> {
//!     let _log = buildergen_codegen::init_tracing();
//!     buildergen_codegen::generate().map(|_| ())
//! }
//! ```
//!
//! Problems with a single directive never fail the build script. They are
//! collected as [`Diagnostic`]s, printed as `cargo:warning` lines, and the
//! builder in question is not written, so the include in user code fails to
//! compile at the directive.

mod config;
mod describe;
mod descriptor;
mod diagnostics;
mod emit;
mod error;
mod generator;
pub mod host;
mod logging;
mod plan;
mod resolve;
mod router;

pub use config::Config;
pub use descriptor::{Base, CollectionKind, TransformError, TypeDescriptor};
pub use diagnostics::{Diagnostic, Diagnostics, Location, Severity};
pub use emit::{BUILDER_DIR, Emit, FileEmitter, HEADER, render_source};
pub use error::{Error, Result};
pub use generator::{Generator, PassReport, generate as generate_with};
pub use logging::{LOG_ENV, LOG_FILE, init_tracing, init_tracing_in};
pub use plan::{BuilderPlan, Construction, DEFAULT_SUFFIX, PlannedField, Target};
pub use router::{Outcome, route};

/// Run a pass for the build script of the current package.
///
/// # Errors
///
/// See [`Generator::run`].
pub fn generate() -> Result<PassReport> { Config::from_env().generate() }
