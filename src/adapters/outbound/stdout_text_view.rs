//! Stdout Text View
//!
//! Implements TextView for the terminal display: each update is written
//! as one line.

use crate::domain::ports::TextView;
use parking_lot::Mutex;
use std::io::Write;

pub struct StdoutTextView<W: Write + Send = std::io::Stdout> {
    out: Mutex<W>,
}

impl StdoutTextView {
    pub fn new() -> Self {
        Self::with_writer(std::io::stdout())
    }
}

impl Default for StdoutTextView {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> StdoutTextView<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write + Send> TextView for StdoutTextView<W> {
    fn set_text(&self, text: &str) {
        let mut out = self.out.lock();
        if let Err(e) = writeln!(out, "{}", text).and_then(|_| out.flush()) {
            tracing::error!("failed to write text view: {:?}", e);
        }
    }
}
