use std::time::{Duration, Instant, SystemTime};

/// Per-run counters, owned by the scheduler's drain loop. Single-owner
/// mutation keeps this lock-free: workers never touch it directly.
#[derive(Debug)]
pub struct Metrics {
    started_at: SystemTime,
    start: Instant,
    processed: u64,
    failed: u64,
}

impl Metrics {
    pub fn start() -> Self {
        Self {
            started_at: SystemTime::now(),
            start: Instant::now(),
            processed: 0,
            failed: 0,
        }
    }

    pub fn record(&mut self, success: bool) {
        self.processed += 1;
        if !success {
            self.failed += 1;
        }
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }

    /// Freeze the counters into a read-only snapshot.
    pub fn finish(self) -> MetricsSnapshot {
        let total_elapsed = self.start.elapsed();
        MetricsSnapshot {
            started_at: self.started_at,
            processed: self.processed,
            failed: self.failed,
            total_elapsed,
            average_per_row: total_elapsed / self.processed.max(1) as u32,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub started_at: SystemTime,
    pub processed: u64,
    pub failed: u64,
    pub total_elapsed: Duration,
    pub average_per_row: Duration,
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Processing completed in {:.2} seconds:",
            self.total_elapsed.as_secs_f64()
        )?;
        writeln!(f, "- Rows processed: {}", self.processed)?;
        writeln!(f, "- Rows failed: {}", self.failed)?;
        write!(
            f,
            "- Average time per row: {:.2} seconds",
            self.average_per_row.as_secs_f64()
        )
    }
}
