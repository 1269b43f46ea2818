//! Tracing setup for build scripts.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Environment variable holding the `EnvFilter` directives for a pass.
pub const LOG_ENV: &str = "BUILDERGEN_LOG";

/// Log file written next to the generated builders.
pub const LOG_FILE: &str = "buildergen.log";

/// Default filter when [`LOG_ENV`] is unset or invalid
const DEFAULT_FILTER: &str = "warn";

/// Install a subscriber for the current build script.
///
/// Events go to stderr, which cargo shows with `-vv`, and also to
/// `$OUT_DIR/buildergen.log` when `OUT_DIR` is set. Returns the guard of the
/// file writer, which must be kept alive until the pass ends. Calling this
/// twice, or after another subscriber was installed, leaves the existing one
/// in place.
pub fn init_tracing() -> Option<WorkerGuard> {
    let out_dir = std::env::var_os("OUT_DIR");
    init_tracing_in(out_dir.as_deref().map(Path::new))
}

/// Like [`init_tracing`], with the log file placed in `log_dir`.
pub fn init_tracing_in(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let (file_layer, guard) = log_dir.map_or((None, None), |dir| {
        let appender = tracing_appender::rolling::never(dir, LOG_FILE);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true);
        (Some(layer), Some(guard))
    });

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false);

    let installed = Registry::default()
        .with(env_filter())
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    installed.ok().and(guard)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_keeps_the_first_subscriber() {
        let dir = tempfile::tempdir().ok();
        let first = init_tracing_in(dir.as_ref().map(tempfile::TempDir::path));
        let second = init_tracing_in(dir.as_ref().map(tempfile::TempDir::path));

        assert!(second.is_none());
        drop(first);
    }
}
