//! Logging macros for ergonomic log message formatting.
//!
//! Each macro formats its message like `format!` and returns the
//! `Result<()>` of the log call. A context can be passed before a `;`.
//!
//! # Examples
//!
//! ```
//! use rust_amqp_logger::prelude::*;
//! use rust_amqp_logger::transport::MemoryBroker;
//! use rust_amqp_logger::{error, info};
//! use std::sync::Arc;
//!
//! let broker = MemoryBroker::new();
//! let logger = LoggerBuilder::new()
//!     .broker(Arc::new(broker.clone()))
//!     .queue("logs")?;
//!
//! // Basic logging
//! info!(logger, "Server started")?;
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port)?;
//!
//! // With a context
//! let ctx = LogContext::new().with_field("port", port);
//! error!(logger, ctx; "Bind failed on port {}", port)?;
//!
//! assert_eq!(broker.queue_len("logs"), 3);
//! # Ok::<(), LoggerError>(())
//! ```

/// Log a message at an explicit level.
///
/// ```
/// # use rust_amqp_logger::prelude::*;
/// # use rust_amqp_logger::transport::MemoryBroker;
/// # use std::sync::Arc;
/// # let broker = Arc::new(MemoryBroker::new());
/// # let logger = LoggerBuilder::new().broker(broker).exchange("events")?;
/// use rust_amqp_logger::log;
/// log!(logger, LogLevel::Notice, "Simple message")?;
/// log!(logger, LogLevel::Error, "Error code: {}", 500)?;
/// # Ok::<(), LoggerError>(())
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $context:expr; $($arg:tt)+) => {
        $crate::LeveledLogger::log(&$logger, $level, &format!($($arg)+), &$context)
    };
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $crate::LeveledLogger::log(
            &$logger,
            $level,
            &format!($($arg)+),
            &$crate::LogContext::new(),
        )
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $context:expr; $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $context; $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $context:expr; $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $context; $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a notice-level message.
#[macro_export]
macro_rules! notice {
    ($logger:expr, $context:expr; $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Notice, $context; $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Notice, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warning {
    ($logger:expr, $context:expr; $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warning, $context; $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warning, $($arg)+)
    };
}

/// Log an error-level message.
///
/// ```
/// # use rust_amqp_logger::prelude::*;
/// # use rust_amqp_logger::transport::MemoryBroker;
/// # use std::sync::Arc;
/// # let broker = Arc::new(MemoryBroker::new());
/// # let logger = LoggerBuilder::new().broker(broker).queue("logs")?;
/// use rust_amqp_logger::error;
/// let ctx = LogContext::new().with_field("path", "/etc/app.toml");
/// error!(logger, ctx; "Failed to open file: {}", "config.toml")?;
/// # Ok::<(), LoggerError>(())
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $context:expr; $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $context; $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a critical-level message.
#[macro_export]
macro_rules! critical {
    ($logger:expr, $context:expr; $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Critical, $context; $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Critical, $($arg)+)
    };
}

/// Log an alert-level message.
#[macro_export]
macro_rules! alert {
    ($logger:expr, $context:expr; $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Alert, $context; $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Alert, $($arg)+)
    };
}

/// Log an emergency-level message.
#[macro_export]
macro_rules! emergency {
    ($logger:expr, $context:expr; $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Emergency, $context; $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Emergency, $($arg)+)
    };
}
