//! Completion progress for concurrent batch fetches

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Width of the progress bar in characters
pub const BAR_WIDTH: usize = 70;

/// Label used when the caller gives none
pub const DEFAULT_LABEL: &str = "batches";

/// Destination for rendered progress lines
pub trait ProgressSink: Send + Sync {
    /// Emit one line. `finished` is true for the last line of a fetch.
    fn emit(&self, line: &str, finished: bool);
}

/// Writes progress lines to `W`, ending each with `\r` so the terminal
/// rewrites the same line, and the final one with `\n`
#[derive(Debug)]
pub struct WriterProgress<W> {
    writer: Mutex<W>,
}

/// Progress on stdout
pub type ConsoleProgress = WriterProgress<std::io::Stdout>;

impl<W: Write + Send> WriterProgress<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ConsoleProgress {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ProgressSink for WriterProgress<W> {
    fn emit(&self, line: &str, finished: bool) {
        let Ok(mut writer) = self.writer.lock() else {
            return;
        };
        let terminator = if finished { "\n" } else { "\r" };
        // best effort, a closed stdout never fails the fetch
        let _ = write!(writer, "{line}{terminator}");
        let _ = writer.flush();
    }
}

/// Discards all progress
#[derive(Debug, Default)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn emit(&self, _line: &str, _finished: bool) {}
}

/// Keeps every emitted line in memory
#[derive(Debug, Default)]
pub struct CapturedProgress {
    lines: Mutex<Vec<(String, bool)>>,
}

impl CapturedProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines emitted so far with their `finished` flag
    pub fn lines(&self) -> Vec<(String, bool)> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl ProgressSink for CapturedProgress {
    fn emit(&self, line: &str, finished: bool) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((line.to_string(), finished));
        }
    }
}

/// Shared completion counter for one fetch
pub struct FetchProgress {
    label: String,
    total: usize,
    done: AtomicUsize,
    sink: Arc<dyn ProgressSink>,
}

impl FetchProgress {
    pub fn new(label: Option<&str>, total: usize, sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            label: label.unwrap_or(DEFAULT_LABEL).to_string(),
            total,
            done: AtomicUsize::new(0),
            sink,
        }
    }

    /// Record one completed fetch and emit the line for the count it produced
    pub fn complete_one(&self) -> usize {
        let done = self.done.fetch_add(1, Ordering::SeqCst) + 1;
        let line = render_line(&self.label, done, self.total);
        self.sink.emit(&line, done == self.total);
        done
    }

    pub fn completed(&self) -> usize {
        self.done.load(Ordering::SeqCst)
    }
}

/// Render `fetching <label>: [<done>/<total>][<bar>]`
///
/// Counts are left-aligned to the digit width of `total`; the bar holds one
/// `#` per whole 1/70th completed and is padded with `-`.
pub fn render_line(label: &str, done: usize, total: usize) -> String {
    let width = total.to_string().len();
    let filled = if total == 0 {
        0
    } else {
        (done.min(total) * BAR_WIDTH) / total
    };
    let bar = "#".repeat(filled);

    format!(
        "fetching {}: [{:<width$}/{:<width$}][{:-<bar_width$}]",
        label,
        done,
        total,
        bar,
        width = width,
        bar_width = BAR_WIDTH
    )
}
