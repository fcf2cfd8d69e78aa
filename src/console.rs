//! Log-panel model: a bounded list of user-visible status lines.
//!
//! Every line is also forwarded to `tracing` at the matching level, so hosts
//! that install a subscriber get the same messages in their logs.

#[cfg(test)]
#[path = "console_test.rs"]
mod console_test;

use std::collections::VecDeque;

use crate::consts::CONSOLE_CAPACITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Info,
    Success,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub level: ConsoleLevel,
    pub text: String,
}

/// Ring buffer of the most recent [`CONSOLE_CAPACITY`] lines.
#[derive(Debug, Clone)]
pub struct ConsoleLog {
    lines: VecDeque<ConsoleLine>,
    capacity: usize,
}

impl Default for ConsoleLog {
    fn default() -> Self {
        Self::with_capacity(CONSOLE_CAPACITY)
    }
}

impl ConsoleLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { lines: VecDeque::new(), capacity: capacity.max(1) }
    }

    pub fn push(&mut self, level: ConsoleLevel, text: impl Into<String>) {
        let text = text.into();
        match level {
            ConsoleLevel::Info | ConsoleLevel::Success => tracing::info!(console = true, "{text}"),
            ConsoleLevel::Warn => tracing::warn!(console = true, "{text}"),
            ConsoleLevel::Error => tracing::error!(console = true, "{text}"),
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(ConsoleLine { level, text });
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(ConsoleLevel::Info, text);
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.push(ConsoleLevel::Success, text);
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        self.push(ConsoleLevel::Warn, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(ConsoleLevel::Error, text);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Oldest first.
    pub fn lines(&self) -> impl Iterator<Item = &ConsoleLine> {
        self.lines.iter()
    }

    #[must_use]
    pub fn last(&self) -> Option<&ConsoleLine> {
        self.lines.back()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
