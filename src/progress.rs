//! Progress reporting for scans: optional spinner plus periodic and final log lines.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// Spinner for scans whose total is unknown up front (pages arrive until the cursor runs out).
pub fn make_scan_spinner(label: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template(
        "{spinner:.green} {msg} {pos} items  it/s: {per_sec}  elapsed: {elapsed_precise}"
    )
    .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    if !label.is_empty() {
        pb.set_message(label.to_string());
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Counts processed items for one scan.
/// - `inc()` bumps the counter, ticks the spinner and logs every `every` items
/// - `finish()` logs the summary line and returns the time since `started`
pub struct ScanProgress {
    label: String,
    every: u64,
    count: u64,
    started: Instant,
    pb: Option<ProgressBar>,
}

impl ScanProgress {
    pub fn new<T: Into<String>>(label: T, every: u64, spinner: bool) -> Self {
        Self::since(label, every, spinner, Instant::now())
    }

    /// Reporter whose clock started earlier, e.g. before the first request of the scan.
    pub fn since<T: Into<String>>(label: T, every: u64, spinner: bool, started: Instant) -> Self {
        let label = label.into();
        let pb = if spinner { Some(make_scan_spinner(&label)) } else { None };
        Self { label, every, count: 0, started, pb }
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    /// Returns true when this item crossed a reporting boundary and a line was logged.
    #[inline]
    pub fn inc(&mut self) -> bool {
        self.count += 1;
        if let Some(pb) = &self.pb { pb.inc(1); }
        if self.every > 0 && self.count % self.every == 0 {
            tracing::info!("{} {} processed (elapsed {:.1?})", self.count, self.label, self.started.elapsed());
            return true;
        }
        false
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn finish(&mut self) -> Duration {
        let elapsed = self.started.elapsed();
        if let Some(pb) = self.pb.take() {
            pb.finish_with_message(format!("{} done", self.label));
        }
        tracing::info!("Done! {} {} processed in {:.2?}", self.count, self.label, elapsed);
        elapsed
    }
}
