//! Human-readable progress on stderr.
//!
//! The reporter mirrors the event stream for a person watching the
//! terminal while stdout carries the machine-readable records.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use humansize::{format_size, DECIMAL};

use super::events::ProgressEvent;
use super::tracker::format_duration;

/// How a rendered line is written.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    /// A full line, terminated by a newline.
    Full(String),
    /// A status line rewritten in place.
    Status(String),
}

/// Default progress reporter that writes to stderr.
pub struct DefaultProgressReporter {
    /// Whether to show output (disabled in quiet mode)
    show_output: bool,
    /// Whether a status line is currently on screen
    status_shown: AtomicBool,
}

impl DefaultProgressReporter {
    pub fn new() -> Self {
        Self {
            show_output: true,
            status_shown: AtomicBool::new(false),
        }
    }

    /// Create a progress reporter with output disabled.
    pub fn quiet() -> Self {
        Self {
            show_output: false,
            status_shown: AtomicBool::new(false),
        }
    }

    /// Render one event to stderr.
    pub fn observe(&self, event: &ProgressEvent) {
        if !self.show_output {
            return;
        }

        match render(event) {
            Line::Status(text) => {
                eprint!("\r\x1b[2K  {}", text);
                let _ = io::stderr().flush();
                self.status_shown.store(true, Ordering::SeqCst);
            }
            Line::Full(text) => {
                if self.status_shown.swap(false, Ordering::SeqCst) {
                    // Clear the status line
                    eprint!("\r\x1b[2K");
                }
                eprintln!("{}", text);
            }
        }
    }
}

impl Default for DefaultProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn render(event: &ProgressEvent) -> Line {
    match event {
        ProgressEvent::Flatten { message } => Line::Full(message.clone()),
        ProgressEvent::FlattenComplete { message, stats, .. } => Line::Full(format!(
            "{} ({} input, {} smaller)",
            message,
            format_size(stats.original_size, DECIMAL),
            stats.compression_ratio
        )),
        ProgressEvent::AnalyzeStart { message, .. } => Line::Full(message.clone()),
        ProgressEvent::Analyzing {
            message,
            current_batch,
            total_batches,
            ..
        } => Line::Status(format!("[{}/{}] {}", current_batch, total_batches, message)),
        ProgressEvent::SectionComplete {
            message,
            current_batch,
            total_batches,
            ..
        } => Line::Status(format!("[{}/{}] {}", current_batch, total_batches, message)),
        ProgressEvent::Complete { results, usage, .. } => {
            let mut text = format!(
                "Catalogued {} field{} in {}",
                results.len(),
                if results.len() == 1 { "" } else { "s" },
                format_duration(std::time::Duration::from_millis(usage.duration_ms))
            );
            if usage.fallback_batches > 0 {
                text.push_str(&format!(
                    " ({} of {} batches used fallback metadata, {:.0}% described)",
                    usage.fallback_batches,
                    usage.batches_processed,
                    usage.success_rate() * 100.0
                ));
            }
            Line::Full(text)
        }
        ProgressEvent::Error { message } => Line::Full(format!("Error: {}", message)),
    }
}
