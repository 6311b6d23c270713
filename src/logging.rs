use std::env;
use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

/// When set, log lines are appended to this file instead of stderr.
pub const LOG_FILE_ENV: &str = "SIGSLEEP_LOG_FILE";

/// Installs the global subscriber. Logging is off unless `RUST_LOG` asks for it,
/// the fixture's stdout/stderr are what tests assert on.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_ansi(false);

    // a subscriber may already be installed (tests), so init errors are dropped
    match env::var_os(LOG_FILE_ENV).filter(|p| !p.is_empty()) {
        Some(path) => match file_appender(Path::new(&path)) {
            Ok(appender) => {
                let _ = builder.with_writer(appender).try_init();
            }
            Err(e) => {
                let _ = builder.with_writer(std::io::stderr).try_init();
                tracing::warn!("can't log to {:?}, using stderr: {}", path, e);
            }
        },
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
}

// A non-rotating appender writes synchronously, nothing is left sitting in a
// buffer when the process calls exit().
fn file_appender(path: &Path) -> Result<RollingFileAppender, tracing_appender::rolling::InitError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sigsleep.log".to_string());

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
}
