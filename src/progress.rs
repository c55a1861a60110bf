use std::io::{IsTerminal, Write};
use std::time::Instant;

/// One-line stderr progress indicator: completed/total, elapsed,
/// estimated remaining. Side effect only — never part of correctness.
pub struct Progress {
    total: usize,
    done: usize,
    start: Instant,
    enabled: bool,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            done: 0,
            start: Instant::now(),
            enabled: std::io::stderr().is_terminal(),
        }
    }

    pub fn tick(&mut self) {
        self.done += 1;
        if !self.enabled {
            return;
        }
        let elapsed = self.start.elapsed().as_secs_f64();
        let remaining = elapsed / self.done as f64 * (self.total - self.done) as f64;
        let mut err = std::io::stderr().lock();
        let _ = write!(
            err,
            "\rProcessing: {}/{} [{elapsed:.1}s<{remaining:.1}s]",
            self.done, self.total
        );
        let _ = err.flush();
    }

    /// Terminate the progress line so the summary starts on a fresh one.
    pub fn finish(&mut self) {
        if self.enabled && self.done > 0 {
            let mut err = std::io::stderr().lock();
            let _ = writeln!(err);
        }
    }
}
