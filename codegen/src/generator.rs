//! One generation pass: scan, route, plan, emit.

use std::path::{Path, PathBuf};

use error_stack::Report;
use tracing::{info, warn};

use crate::config::Config;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::emit::{Emit, FileEmitter};
use crate::error::{Error, Result};
use crate::host::{Introspect, SourceRoot, SourceTree, dependency_root};
use crate::router::route;

/// What a finished pass produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Builder files written (or found up to date), in emission order.
    pub written:     Vec<PathBuf>,
    /// Builder files of earlier passes that this pass no longer produces.
    pub removed:     Vec<PathBuf>,
    /// Every diagnostic raised during the pass.
    pub diagnostics: Vec<Diagnostic>,
}

impl PassReport {
    /// Whether any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool { self.diagnostics.iter().any(Diagnostic::is_error) }
}

/// Runs passes for a [`Config`].
#[derive(Debug, Clone)]
pub struct Generator {
    config: Config,
}

impl Generator {
    /// A generator for `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self { Self { config } }

    /// Scan the configured roots and dependencies, then generate.
    ///
    /// # Errors
    ///
    /// [`Error::SourceRoot`] or [`Error::Dependency`] when sources cannot be
    /// located, and the errors of [`Self::run_with`].
    pub fn run(&self) -> Result<PassReport> {
        let roots = self.roots()?;
        let tree = SourceTree::load(&roots)?;
        let report = self.run_with(&tree)?;

        if self.config.rerun_if_changed {
            for root in &roots {
                println!("cargo:rerun-if-changed={}", root.dir.display());
            }
            for file in tree.files() {
                println!("cargo:rerun-if-changed={}", file.display());
            }
        }
        Ok(report)
    }

    /// Generate builders for every directive `host` reports.
    ///
    /// A pass with no directives writes nothing and needs no output
    /// directory. Failures of a single builder become error diagnostics.
    /// Builder files an earlier pass wrote and this one did not are deleted.
    ///
    /// # Errors
    ///
    /// [`Error::MissingOutputDirectory`] or [`Error::OutputDirectory`] when
    /// there is something to write but nowhere to write it, and
    /// [`Error::StaleBuilders`] when old builder files cannot be deleted.
    pub fn run_with(&self, host: &impl Introspect) -> Result<PassReport> {
        let mut diagnostics = Diagnostics::new();
        diagnostics.extend(host.diagnostics().iter().cloned());

        if host.directives().is_empty() {
            diagnostics.note("no builder directives found; nothing to generate", None);
            let removed = match self.config.out_dir.as_deref().and_then(FileEmitter::existing) {
                Some(emitter) => emitter.remove_stale(&[])?,
                None => Vec::new(),
            };
            return Ok(self.finish(Vec::new(), removed, diagnostics));
        }

        let out_dir = self
            .config
            .out_dir
            .as_deref()
            .ok_or_else(|| Report::new(Error::MissingOutputDirectory))?;
        let mut emitter = FileEmitter::prepare(out_dir)?;

        let written = generate(host, &mut emitter, &mut diagnostics);
        let removed = emitter.remove_stale(&written)?;
        info!(
            "Generated {} builders in {}, removed {} stale",
            written.len(),
            emitter.dir().display(),
            removed.len()
        );
        Ok(self.finish(written, removed, diagnostics))
    }

    fn roots(&self) -> Result<Vec<SourceRoot>> {
        let mut roots = self.config.roots.clone();
        if self.config.dependencies.is_empty() {
            return Ok(roots);
        }

        let manifest_dir = self
            .config
            .manifest_dir
            .as_deref()
            .or_else(|| roots.first().and_then(|root| root.dir.parent()))
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        for name in &self.config.dependencies {
            roots.push(dependency_root(&manifest_dir, name)?);
        }
        Ok(roots)
    }

    fn finish(&self, written: Vec<PathBuf>, removed: Vec<PathBuf>, diagnostics: Diagnostics) -> PassReport {
        if self.config.cargo_directives {
            for diagnostic in diagnostics.iter().filter(|diagnostic| diagnostic.is_error()) {
                println!("cargo:warning={diagnostic}");
            }
        }
        PassReport {
            written,
            removed,
            diagnostics: diagnostics.into_vec(),
        }
    }
}

/// Route every directive of `host` and emit each plan through `emitter`.
///
/// Returns the paths written. Routing and emission failures are pushed onto
/// `diagnostics`; later builders are still attempted.
pub fn generate(host: &impl Introspect, emitter: &mut impl Emit, diagnostics: &mut Diagnostics) -> Vec<PathBuf> {
    let mut written = Vec::new();
    for outcome in route(host) {
        diagnostics.append(outcome.diagnostics);
        match outcome.result {
            Ok(plan) => match emitter.emit(&plan) {
                Ok(path) => written.push(path),
                Err(report) => {
                    warn!("{report:?}");
                    diagnostics.error(report.current_context().to_string(), plan.location.clone());
                },
            },
            Err(diagnostic) => diagnostics.push(diagnostic),
        }
    }
    written
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "tests should panic on unexpected values")]
mod tests {
    use super::*;
    use crate::plan::BuilderPlan;

    #[derive(Default)]
    struct Recording {
        units: Vec<String>,
    }

    impl Emit for Recording {
        fn emit(&mut self, plan: &BuilderPlan) -> Result<PathBuf> {
            if plan.unit.starts_with("Broken") {
                return Err(Report::new(Error::Render {
                    unit:   plan.unit.clone(),
                    reason: "refused".to_string(),
                }));
            }
            self.units.push(plan.unit.clone());
            Ok(PathBuf::from(format!("{}.rs", plan.unit)))
        }
    }

    const SOURCE: &str = r"
        #[derive(Builder)] pub struct Pair { pub a: String, pub b: Option<String> }
        #[derive(Builder)] pub struct Broken { pub x: u8 }
        #[derive(Builder)] pub enum Color { Red }
    ";

    #[test]
    fn failures_do_not_stop_later_builders() {
        let tree = SourceTree::from_sources([("lib.rs", SOURCE)]);
        let mut emitter = Recording::default();
        let mut diagnostics = Diagnostics::new();

        let written = generate(&tree, &mut emitter, &mut diagnostics);

        assert_eq!(written, [PathBuf::from("PairBuilder.rs")]);
        assert_eq!(emitter.units, ["PairBuilder"]);
        let errors: Vec<_> = diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.is_error())
            .map(|diagnostic| diagnostic.message.clone())
            .collect();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("Cannot render builder `BrokenBuilder`"));
        assert!(errors[1].contains("not on enum `Color`"));
    }

    #[test]
    fn no_directives_needs_no_output_directory() {
        let tree = SourceTree::from_sources([("lib.rs", "pub struct Plain { a: u8 }")]);
        let report = Generator::new(Config::new()).run_with(&tree).expect("nothing to write");

        assert!(report.written.is_empty());
        assert!(!report.has_errors());
        assert_eq!(report.diagnostics.len(), 1);
    }

    #[test]
    fn directives_without_output_directory_are_fatal() {
        let tree = SourceTree::from_sources([("lib.rs", SOURCE)]);
        let error = Generator::new(Config::new()).run_with(&tree).expect_err("no out dir");
        assert!(matches!(error.current_context(), Error::MissingOutputDirectory));
    }
}
