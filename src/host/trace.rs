//! Diagnostic trace output.

use std::cell::RefCell;

/// Receives trace lines from the compiler front end.
pub trait TraceSink {
    /// Record one line.
    fn trace(&self, message: &str);
}

/// Writes each trace line to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrTrace {
    colored: bool,
}

impl StderrTrace {
    /// Plain output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Colour the `trace:` prefix (requires the `colored-trace` feature).
    pub fn colored(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }
}

impl TraceSink for StderrTrace {
    fn trace(&self, message: &str) {
        let prefix = if self.colored {
            paint_prefix("trace:")
        } else {
            "trace:".to_owned()
        };
        eprintln!("{prefix} {message}");
    }
}

#[cfg(feature = "colored-trace")]
fn paint_prefix(text: &str) -> String {
    use owo_colors::OwoColorize;
    text.cyan().to_string()
}

#[cfg(not(feature = "colored-trace"))]
fn paint_prefix(text: &str) -> String {
    text.to_owned()
}

/// Collects trace lines in memory.
#[derive(Debug, Default)]
pub struct MemoryTrace {
    lines: RefCell<Vec<String>>,
}

impl MemoryTrace {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines recorded so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

impl TraceSink for MemoryTrace {
    fn trace(&self, message: &str) {
        self.lines.borrow_mut().push(message.to_owned());
    }
}

impl<T: TraceSink + ?Sized> TraceSink for std::rc::Rc<T> {
    fn trace(&self, message: &str) {
        (**self).trace(message);
    }
}
