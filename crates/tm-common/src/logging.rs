use std::panic;
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Subscriber settings resolved from `TM_LOG_*` variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Daily-rotated `<dir>/<app>.log` when set; stdout otherwise.
    pub log_dir: Option<PathBuf>,
    /// Also run the default panic hook (prints the backtrace to stderr).
    pub include_backtrace: bool,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            log_dir: lookup("TM_LOG_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
            include_backtrace: lookup("TM_LOG_INCLUDE_BACKTRACE")
                .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}

/// Route panics through `tracing::error!` with thread and location fields.
/// Installed once per process; later calls are no-ops.
pub fn install_tracing_panic_hook(app_name: &'static str) {
    static INSTALLED: OnceLock<()> = OnceLock::new();

    INSTALLED.get_or_init(|| {
        let forward_to_default = LoggingConfig::from_env().include_backtrace;
        let default_hook = panic::take_hook();

        panic::set_hook(Box::new(move |info| {
            let current = std::thread::current();
            let site = info.location().map_or_else(
                || "unknown".to_string(),
                |loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()),
            );

            tracing::error!(
                application = app_name,
                thread = current.name().unwrap_or("unnamed"),
                location = %site,
                panic_message = %panic_text(info.payload()),
                "panic captured"
            );

            if forward_to_default {
                default_hook(info);
            }
        }));
    });
}

fn panic_text(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn rotating_file_writer(app_name: &'static str, config: &LoggingConfig) -> Option<BoxMakeWriter> {
    let dir = config.log_dir.as_ref()?;
    if let Err(err) = std::fs::create_dir_all(dir) {
        eprintln!("failed to create TM_LOG_DIR {}: {err}; logging to stdout", dir.display());
        return None;
    }

    let appender = tracing_appender::rolling::daily(dir, format!("{app_name}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Some(BoxMakeWriter::new(non_blocking))
}

/// Install the global subscriber. `RUST_LOG` drives filtering (default `info`);
/// `TM_LOG_DIR` switches output to a daily-rotated file.
pub fn init_tracing_subscriber(app_name: &'static str) {
    init_tracing_with(app_name, &LoggingConfig::from_env());
}

pub fn init_tracing_with(app_name: &'static str, config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);

    if let Some(writer) = rotating_file_writer(app_name, config) {
        let _ = builder.with_writer(writer).try_init();
    } else {
        let _ = builder.try_init();
    }
}
