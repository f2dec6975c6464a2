//! Wait progress reporting.

use std::io::{self, Write};

use crate::policy::Observation;

/// Receives wait progress. Every wait calls `on_start` once, `on_poll` for
/// each observation, and `on_finish` once on every exit path.
pub trait WaitObserver: Send {
    fn on_start(&mut self, _group: &str) {}

    fn on_poll(&mut self, _poll: u32, _observation: &Observation) {}

    /// `settled` is true when a terminal state was reached.
    fn on_finish(&mut self, _settled: bool) {}
}

/// Prints `Waiting`, one `.` per poll, then `done`.
///
/// Write failures are ignored; progress is cosmetic.
pub struct ConsoleProgress<W: Write + Send = io::Stdout> {
    out: W,
}

impl ConsoleProgress {
    #[must_use]
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write + Send> ConsoleProgress<W> {
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }
}

impl<W: Write + Send> WaitObserver for ConsoleProgress<W> {
    fn on_start(&mut self, _group: &str) {
        self.emit("Waiting");
    }

    fn on_poll(&mut self, _poll: u32, _observation: &Observation) {
        self.emit(".");
    }

    fn on_finish(&mut self, settled: bool) {
        self.emit(if settled { "done\n" } else { "\n" });
    }
}

/// Reports nothing; used with `--json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl WaitObserver for SilentProgress {}
