//! Tagged console output.
//!
//! Progress is reported as one line per event, prefixed with a status tag
//! (`[INFO]`, `[WARN]`, `[ERROR]`, `[SUCCESS]`). The batch writes through the
//! [`Reporter`] trait so tests can swap the console for a recorder.

use std::fmt::{self, Write as _};
use std::io::{self, Write as _};

use console::style;
use parking_lot::Mutex;

/// Status tag of a console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Info,
    Warn,
    Error,
    Success,
}

impl Status {
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Info => "[INFO]",
            Self::Warn => "[WARN]",
            Self::Error => "[ERROR]",
            Self::Success => "[SUCCESS]",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Sink for progress lines.
pub trait Reporter: Sync {
    fn report(&self, status: Status, message: &str);

    fn info(&self, message: &str) {
        self.report(Status::Info, message);
    }

    fn warn(&self, message: &str) {
        self.report(Status::Warn, message);
    }

    fn error(&self, message: &str) {
        self.report(Status::Error, message);
    }

    fn success(&self, message: &str) {
        self.report(Status::Success, message);
    }
}

/// Prints tagged lines to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct Console {
    /// Only print warnings and errors.
    pub quiet: bool,
}

impl Console {
    #[must_use]
    pub const fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Reporter for Console {
    fn report(&self, status: Status, message: &str) {
        if self.quiet && matches!(status, Status::Info | Status::Success) {
            return;
        }
        let tag = match status {
            Status::Info => style(status.tag()).cyan(),
            Status::Warn => style(status.tag()).yellow().bold(),
            Status::Error => style(status.tag()).red().bold(),
            Status::Success => style(status.tag()).green().bold(),
        };
        let text = render(&tag, message);
        // One write per message so parallel workers cannot split it.
        let _ = io::stdout().lock().write_all(text.as_bytes());
    }
}

/// Tag the first line; continuation lines (captured stderr) are indented
/// under the message.
fn render(tag: &dyn fmt::Display, message: &str) -> String {
    let mut lines = message.lines();
    let mut text = format!("{tag} {}\n", lines.next().unwrap_or_default());
    for line in lines {
        let _ = writeln!(text, "        {line}");
    }
    text
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Reporter for Silent {
    fn report(&self, _status: Status, _message: &str) {}
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct Recorder {
    lines: Mutex<Vec<(Status, String)>>,
}

impl Recorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded lines.
    pub fn lines(&self) -> Vec<(Status, String)> {
        self.lines.lock().clone()
    }

    /// Recorded messages with the given status.
    pub fn messages(&self, status: Status) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter(|(s, _)| *s == status)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Reporter for Recorder {
    fn report(&self, status: Status, message: &str) {
        self.lines.lock().push((status, message.to_string()));
    }
}
