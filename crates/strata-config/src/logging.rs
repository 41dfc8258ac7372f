//! Structured logging utilities for Strata components.
//!
//! Provides consistent logging with component prefixes and structured fields.
//!
//! # Usage
//!
//! ```ignore
//! use strata_config::log_resolve_debug;
//!
//! log_resolve_debug!("Resolved to local copy", hash = hash.as_str());
//! log_recovery_warn!("Local copy still missing after recovery", hash = hash.as_str());
//! ```

/// Component identifiers for log filtering
pub struct Component;

impl Component {
    pub const RESOLVE: &'static str = "RESOLVE";
    pub const READ: &'static str = "READ";
    pub const RECOVERY: &'static str = "RECOVERY";
    pub const COPY: &'static str = "COPY";
    pub const CLI: &'static str = "CLI";
}

/// Log levels for runtime configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Map a `-v` count onto a level, starting from `Warn`.
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => LogLevel::Warn,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

// === RESOLVE logging macros ===

#[macro_export]
macro_rules! log_resolve_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = "RESOLVE", $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_resolve_warn {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::warn!(component = "RESOLVE", $($key = $value,)* $msg)
    };
}

// === READ logging macros ===

#[macro_export]
macro_rules! log_read_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = "READ", $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_read_warn {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::warn!(component = "READ", $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_read_error {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::error!(component = "READ", $($key = $value,)* $msg)
    };
}

// === RECOVERY logging macros ===

#[macro_export]
macro_rules! log_recovery_info {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::info!(component = "RECOVERY", $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_recovery_warn {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::warn!(component = "RECOVERY", $($key = $value,)* $msg)
    };
}

// === COPY logging macros ===

#[macro_export]
macro_rules! log_copy_info {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::info!(component = "COPY", $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_copy_warn {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::warn!(component = "COPY", $($key = $value,)* $msg)
    };
}

// === CLI logging macros ===

#[macro_export]
macro_rules! log_cli_info {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::info!(component = "CLI", $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_cli_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = "CLI", $($key = $value,)* $msg)
    };
}

/// Initialize logging with the given level filter.
/// Call this once at application startup.
///
/// `STRATA_LOG` wins over `RUST_LOG`; both win over `level`.
pub fn init_logging(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_env("STRATA_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
