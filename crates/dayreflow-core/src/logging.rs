//! Logging bootstrap.
//!
//! The library only emits `tracing` events. Hosts that have no subscriber of
//! their own can call [`init_logging`] once at startup to print them.
//!
//! `DAYREFLOW_LOG` takes precedence over the level passed in and accepts any
//! `EnvFilter` directive, e.g. `dayreflow_core::engine=debug,warn`.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "DAYREFLOW_LOG";

static ACTIVE_LEVEL: OnceLock<&'static str> = OnceLock::new();

/// Install a formatted stderr subscriber at `level`.
///
/// Calling again with the same level is a no-op.
///
/// # Errors
/// - `level` is not one of trace|debug|info|warn|error
/// - logging was already initialized with another level
/// - another global subscriber is already installed
pub fn init_logging(level: &str) -> Result<(), String> {
    let level = normalize_level(level)?;

    if let Some(active) = ACTIVE_LEVEL.get() {
        if *active == level {
            return Ok(());
        }
        return Err(format!(
            "logging already initialized with level `{active}`; refusing to switch to `{level}`"
        ));
    }

    let filter = match std::env::var(LOG_ENV_VAR) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives.trim())
            .map_err(|err| format!("invalid {LOG_ENV_VAR} value: {err}"))?,
        _ => EnvFilter::new(level),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| format!("failed to install subscriber: {err}"))?;

    // A racing caller may have won; its level is the one in effect.
    let active = *ACTIVE_LEVEL.get_or_init(|| level);
    tracing::debug!(level = active, "logging initialized");
    Ok(())
}

/// `debug` in debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}
