//! Leveled logging contract

use super::error::Result;
use super::log_context::LogContext;
use super::log_level::LogLevel;

/// A logger with one entry point per severity.
///
/// Implementors provide [`log`](LeveledLogger::log); every severity method
/// forwards to it unchanged with its fixed level. Nothing is filtered: each
/// call is exactly one publish attempt.
pub trait LeveledLogger {
    fn log(&self, level: LogLevel, message: &str, context: &LogContext) -> Result<()>;

    #[inline]
    fn debug(&self, message: &str, context: &LogContext) -> Result<()> {
        self.log(LogLevel::Debug, message, context)
    }

    #[inline]
    fn info(&self, message: &str, context: &LogContext) -> Result<()> {
        self.log(LogLevel::Info, message, context)
    }

    #[inline]
    fn notice(&self, message: &str, context: &LogContext) -> Result<()> {
        self.log(LogLevel::Notice, message, context)
    }

    #[inline]
    fn warning(&self, message: &str, context: &LogContext) -> Result<()> {
        self.log(LogLevel::Warning, message, context)
    }

    #[inline]
    fn error(&self, message: &str, context: &LogContext) -> Result<()> {
        self.log(LogLevel::Error, message, context)
    }

    #[inline]
    fn critical(&self, message: &str, context: &LogContext) -> Result<()> {
        self.log(LogLevel::Critical, message, context)
    }

    #[inline]
    fn alert(&self, message: &str, context: &LogContext) -> Result<()> {
        self.log(LogLevel::Alert, message, context)
    }

    #[inline]
    fn emergency(&self, message: &str, context: &LogContext) -> Result<()> {
        self.log(LogLevel::Emergency, message, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recording {
        calls: Mutex<Vec<(LogLevel, String, usize)>>,
    }

    impl LeveledLogger for Recording {
        fn log(&self, level: LogLevel, message: &str, context: &LogContext) -> Result<()> {
            self.calls.lock().push((level, message.to_string(), context.len()));
            Ok(())
        }
    }

    #[test]
    fn test_each_method_forwards_its_level() {
        let logger = Recording::default();
        let ctx = LogContext::new().with_field("k", "v");

        logger.debug("m", &ctx).unwrap();
        logger.info("m", &ctx).unwrap();
        logger.notice("m", &ctx).unwrap();
        logger.warning("m", &ctx).unwrap();
        logger.error("m", &ctx).unwrap();
        logger.critical("m", &ctx).unwrap();
        logger.alert("m", &ctx).unwrap();
        logger.emergency("m", &ctx).unwrap();

        let calls = logger.calls.lock();
        let levels: Vec<LogLevel> = calls.iter().map(|(level, _, _)| *level).collect();
        assert_eq!(levels, LogLevel::ALL.to_vec());
        assert!(calls.iter().all(|(_, msg, fields)| msg == "m" && *fields == 1));
    }
}
