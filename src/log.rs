//! Логирование через внедряемый [`Logger`].
//!
//! Компоненты получают `Arc<dyn Logger>` вместо обращения к глобальному логгеру.
//! [`TracingLogger`] пишет в `tracing`, [`NoOpLogger`] всё отбрасывает.

use std::fmt::Arguments;


#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, args: Arguments<'_>);

    fn trace(&self, args: Arguments<'_>) {
        self.log(LogLevel::Trace, args);
    }

    fn debug(&self, args: Arguments<'_>) {
        self.log(LogLevel::Debug, args);
    }

    fn info(&self, args: Arguments<'_>) {
        self.log(LogLevel::Info, args);
    }

    fn warn(&self, args: Arguments<'_>) {
        self.log(LogLevel::Warn, args);
    }

    fn error(&self, args: Arguments<'_>) {
        self.log(LogLevel::Error, args);
    }
}


/// Пишет в `tracing` с target `kazi`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        match level {
            LogLevel::Trace => tracing::trace!(target: "kazi", "{}", args),
            LogLevel::Debug => tracing::debug!(target: "kazi", "{}", args),
            LogLevel::Info => tracing::info!(target: "kazi", "{}", args),
            LogLevel::Warn => tracing::warn!(target: "kazi", "{}", args),
            LogLevel::Error => tracing::error!(target: "kazi", "{}", args),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    #[inline]
    fn log(&self, _level: LogLevel, _args: Arguments<'_>) {}
}


#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $($arg:tt)*) => {
        $logger.trace(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {
        $logger.error(format_args!($($arg)*))
    };
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(LogLevel, String)>>);

    impl Logger for Recorder {
        fn log(&self, level: LogLevel, args: Arguments<'_>) {
            self.0.lock().unwrap().push((level, args.to_string()));
        }
    }

    #[test]
    fn level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn macros_route_to_matching_level() {
        let recorder = Arc::new(Recorder::default());
        let logger: Arc<dyn Logger> = recorder.clone();

        log_debug!(logger, "created with {} jobs", 3);
        log_warn!(logger, "interrupted");
        log_error!(logger, "failed: {}", "boom");

        let entries = recorder.0.lock().unwrap();
        assert_eq!(
            *entries,
            vec![
                (LogLevel::Debug, "created with 3 jobs".to_string()),
                (LogLevel::Warn, "interrupted".to_string()),
                (LogLevel::Error, "failed: boom".to_string()),
            ]
        );
    }

    #[test]
    fn builtin_loggers_are_usable_as_trait_objects() {
        let loggers: Vec<Box<dyn Logger>> = vec![Box::new(TracingLogger), Box::new(NoOpLogger)];
        for logger in &loggers {
            log_info!(logger, "no subscriber installed");
        }
    }
}
