use log::Level;
use std::fmt::Display;
use std::sync::{Arc, Mutex};

/// `RunLog` captures the log of one CR's run segment so it can be attached to the suite that ran
/// for that CR. Every line is also forwarded to the `log` facade.
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    buffer: Arc<Mutex<String>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log<S>(&self, level: Level, message: S)
    where
        S: Display,
    {
        log::log!(level, "{}", message);
        let line = format!(
            "level={} msg={:?}\n",
            level.as_str().to_lowercase(),
            message.to_string()
        );
        self.buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_str(&line);
    }

    pub fn debug<S: Display>(&self, message: S) {
        self.log(Level::Debug, message)
    }

    pub fn info<S: Display>(&self, message: S) {
        self.log(Level::Info, message)
    }

    pub fn warn<S: Display>(&self, message: S) {
        self.log(Level::Warn, message)
    }

    pub fn error<S: Display>(&self, message: S) {
        self.log(Level::Error, message)
    }

    /// Drain everything captured so far. The next line starts a new segment.
    pub fn take(&self) -> String {
        std::mem::take(
            &mut *self
                .buffer
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }

    /// Count the captured lines that contain `needle`.
    pub fn count_matching(&self, needle: &str) -> usize {
        self.buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .lines()
            .filter(|line| line.contains(needle))
            .count()
    }
}
