//! FILENAME: core/pivot-dataset/src/logging.rs
// PURPOSE: Category-tagged logging on top of the `log` facade.
//
// The host application owns the logger. Every line goes out under the
// `pivot_dataset` target as `[CATEGORY] message`, so a host can route or
// filter the whole subsystem with one directive.

/// Target used for every log line emitted by this crate.
pub const LOG_TARGET: &str = "pivot_dataset";

#[macro_export]
macro_rules! log_debug {
    ($cat:expr, $($arg:tt)*) => {
        ::log::debug!(target: $crate::logging::LOG_TARGET, "[{}] {}", $cat, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($cat:expr, $($arg:tt)*) => {
        ::log::info!(target: $crate::logging::LOG_TARGET, "[{}] {}", $cat, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($cat:expr, $($arg:tt)*) => {
        ::log::warn!(target: $crate::logging::LOG_TARGET, "[{}] {}", $cat, format_args!($($arg)*))
    };
}
