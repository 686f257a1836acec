use std::sync::Arc;

const LOG_TARGET: &str = "gdi";

/// Sink for diagnostics emitted while loading and converting discs.
pub trait DiscLogger: Send + Sync + std::fmt::Debug {
    fn error(&self, message: &str);

    fn warn(&self, message: &str);

    /// Verbose tracing, off unless debug logging is enabled.
    fn log(&self, message: &str);

    fn info(&self, message: &str);
}

/// Forwards every message to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCrateLogger;

impl DiscLogger for LogCrateLogger {
    fn error(&self, message: &str) {
        log::error!(target: LOG_TARGET, "{message}");
    }

    fn warn(&self, message: &str) {
        log::warn!(target: LOG_TARGET, "{message}");
    }

    fn log(&self, message: &str) {
        log::debug!(target: LOG_TARGET, "{message}");
    }

    fn info(&self, message: &str) {
        log::info!(target: LOG_TARGET, "{message}");
    }
}

pub type SharedLogger = Arc<dyn DiscLogger>;

pub fn default_logger() -> SharedLogger {
    Arc::new(LogCrateLogger)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Level {
        Error,
        Warn,
        Log,
        Info,
    }

    /// Captures messages so tests can assert on reported diagnostics.
    #[derive(Debug, Default)]
    pub struct MemoryLogger {
        pub messages: Mutex<Vec<(Level, String)>>,
    }

    impl MemoryLogger {
        pub fn count(&self, level: Level) -> usize {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .filter(|(l, _)| *l == level)
                .count()
        }

        pub fn contains(&self, level: Level, needle: &str) -> bool {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .any(|(l, m)| *l == level && m.contains(needle))
        }

        fn push(&self, level: Level, message: &str) {
            self.messages
                .lock()
                .unwrap()
                .push((level, message.to_string()));
        }
    }

    impl DiscLogger for MemoryLogger {
        fn error(&self, message: &str) {
            self.push(Level::Error, message);
        }

        fn warn(&self, message: &str) {
            self.push(Level::Warn, message);
        }

        fn log(&self, message: &str) {
            self.push(Level::Log, message);
        }

        fn info(&self, message: &str) {
            self.push(Level::Info, message);
        }
    }

    #[test]
    fn memory_logger_records_levels() {
        let logger = MemoryLogger::default();
        logger.error("bad line");
        logger.info("done");
        logger.info("done again");

        assert_eq!(logger.count(Level::Error), 1);
        assert_eq!(logger.count(Level::Info), 2);
        assert!(logger.contains(Level::Error, "bad"));
        assert!(!logger.contains(Level::Warn, "bad"));
    }
}
