//! Progress ticker for long blocking bridge calls
//!
//! Project generation and builds can take minutes while the bridge call
//! blocks. A ticker watches for the completion marker (the `.generated`
//! file, a build log) and logs a "still working" line at a fixed cadence
//! until the marker appears or the ticker is dropped.
//!
//! The ticker only ever logs: it cannot fail the batch, block the main
//! control flow, or outlive the call it watches.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use log::info;

/// Polling slice; keeps `Drop` responsive regardless of the log cadence.
const POLL_SLICE: Duration = Duration::from_millis(100);

/// A background thread logging progress until a marker file appears.
#[derive(Debug)]
pub struct ProgressTicker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressTicker {
    /// Start logging `message` every `cadence` until `marker` exists.
    pub fn watch(marker: PathBuf, message: &str, cadence: Duration) -> Self {
        Self::spawn(Some(marker), message, cadence)
    }

    /// Start logging `message` every `cadence` until cancelled. Used for
    /// blocking calls with no observable completion marker.
    pub fn pulse(message: &str, cadence: Duration) -> Self {
        Self::spawn(None, message, cadence)
    }

    fn spawn(marker: Option<PathBuf>, message: &str, cadence: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let message = message.to_string();

        let handle = std::thread::spawn(move || {
            let arrived = || marker.as_ref().is_some_and(|m| m.exists());
            let mut since_log = cadence; // log immediately on first tick
            while !stop_flag.load(Ordering::Relaxed) && !arrived() {
                if since_log >= cadence {
                    info!("{}", message);
                    since_log = Duration::ZERO;
                }
                std::thread::sleep(POLL_SLICE);
                since_log += POLL_SLICE;
            }
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Stop the ticker and wait for its thread to exit.
    pub fn finish(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            // A panic in the logging thread must not take down the batch.
            let _ = handle.join();
        }
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_stops_when_marker_appears() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join(".generated");

        let ticker = ProgressTicker::watch(
            marker.clone(),
            "... in progress ...",
            Duration::from_millis(50),
        );
        std::fs::write(&marker, "20240101000000").unwrap();
        // finish() must return promptly once the marker exists.
        ticker.finish();
    }

    #[test]
    fn test_ticker_is_cancellable_without_marker() {
        let dir = tempfile::tempdir().unwrap();
        let ticker = ProgressTicker::watch(
            dir.path().join("never-created"),
            "... waiting ...",
            Duration::from_secs(60),
        );
        // Dropping cancels even though the marker never appears.
        drop(ticker);
    }
}
