//! Scan driver: single-identifier checks and the bulk enumeration loop.
//!
//! The driver is strictly sequential — one probe in flight at a time, paced
//! only by the prober's rate limiter. It owns the immutable configuration
//! and reports progress through an observer interface so the core loop stays
//! free of output-formatting concerns.

use crate::enumerate::CandidateSpace;
use crate::error::HandleCheckError;
use crate::probe::{ProbeService, UsernameProber};
use crate::store::{CheckpointSet, ResultLog};
use crate::types::{ProbeResult, ScanConfig, ScanSummary};
use crate::utils::validate_username;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// A progress event is emitted every this many probes.
pub const PROGRESS_INTERVAL: u64 = 10;

/// Events emitted by the bulk scan loop.
///
/// Purely informational — observers cannot influence control flow except by
/// setting the cancellation flag the scanner was given.
#[derive(Debug)]
pub enum ScanEvent<'a> {
    /// The scan is starting.
    Started {
        /// Size of the full enumeration space (K^L, saturating)
        total_candidates: u64,
        /// Probes planned this run (space size capped by max_checks)
        planned_checks: u64,
        /// Candidates already present in the checkpoint at startup
        resumed: usize,
    },

    /// One probe finished (any verdict).
    Probed {
        result: &'a ProbeResult,
        /// Probes attempted so far this run, including this one
        checked: u64,
    },

    /// A username was found available and durably recorded.
    Found {
        username: &'a str,
        found_so_far: usize,
    },

    /// Periodic throughput report, every `PROGRESS_INTERVAL` probes.
    Progress {
        checked: u64,
        planned: u64,
        percent: f64,
        per_second: f64,
        remaining: Duration,
    },
}

/// Observer interface for scan progress.
///
/// Implementations format and deliver events however they like; the library
/// core never prints.
pub trait ScanObserver {
    fn on_event(&self, event: ScanEvent<'_>);
}

/// Observer that discards all events.
pub struct NoopObserver;

impl ScanObserver for NoopObserver {
    fn on_event(&self, _event: ScanEvent<'_>) {}
}

/// Main scan driver coordinating enumeration, probing, and persistence.
///
/// # Example
///
/// ```rust,no_run
/// use handle_check_lib::{HandleScanner, ScanConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut scanner = HandleScanner::new(ScanConfig::default())?;
///     let result = scanner.check_username("spez").await?;
///     println!("{}: {}", result.username, result.verdict);
///     Ok(())
/// }
/// ```
pub struct HandleScanner<P = UsernameProber> {
    /// Immutable configuration for this scanner instance
    config: ScanConfig,
    /// Probe backend (rate limiting lives inside the prober)
    prober: P,
}

impl HandleScanner<UsernameProber> {
    /// Create a scanner with the production HTTP prober.
    pub fn new(config: ScanConfig) -> Result<Self, HandleCheckError> {
        config.validate()?;
        let prober = UsernameProber::new(&config)?;
        Ok(Self { config, prober })
    }
}

impl<P: ProbeService> HandleScanner<P> {
    /// Create a scanner with a custom probe backend.
    ///
    /// Used by tests to script verdicts without a network.
    pub fn with_prober(config: ScanConfig, prober: P) -> Result<Self, HandleCheckError> {
        config.validate()?;
        Ok(Self { config, prober })
    }

    /// Get the configuration for this scanner.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Single-identifier mode: probe one explicit username.
    ///
    /// No checkpoint interaction — the caller asked about this exact name
    /// and gets a fresh answer.
    pub async fn check_username(
        &mut self,
        username: &str,
    ) -> Result<ProbeResult, HandleCheckError> {
        validate_username(username)?;
        self.prober.probe(username.trim()).await
    }

    /// Bulk mode: enumerate the candidate space and probe everything not yet
    /// checkpointed.
    ///
    /// Per candidate: skip if checkpointed; probe; on available, append to
    /// the result log (durable before the next candidate starts); then
    /// checkpoint the candidate unconditionally — including after an
    /// indeterminate probe, so no candidate can wedge the scan into a
    /// permanent retry loop.
    ///
    /// Stops on: the attempted-probes cap, exhaustion of the space, or the
    /// cancellation flag (checked between candidates; the in-flight probe
    /// always completes and its effects are flushed first).
    pub async fn run_bulk(
        &mut self,
        checkpoint: &mut CheckpointSet,
        results: &mut ResultLog,
        observer: &dyn ScanObserver,
        cancel: &AtomicBool,
    ) -> Result<ScanSummary, HandleCheckError> {
        let space = CandidateSpace::new(&self.config.alphabet, self.config.length)?;
        let total = space.total();
        let planned = match self.config.max_checks {
            Some(max) => max.min(total),
            None => total,
        };
        let max_checks = self.config.max_checks;

        observer.on_event(ScanEvent::Started {
            total_candidates: total,
            planned_checks: planned,
            resumed: checkpoint.len(),
        });

        let started = Instant::now();
        let mut summary = ScanSummary::default();

        for candidate in space.iter() {
            if cancel.load(Ordering::SeqCst) {
                summary.interrupted = true;
                break;
            }
            if let Some(max) = max_checks {
                if summary.attempted >= max {
                    break;
                }
            }
            if checkpoint.contains(&candidate) {
                summary.skipped += 1;
                continue;
            }

            let result = self.prober.probe(&candidate).await?;
            summary.attempted += 1;

            match result.verdict {
                crate::types::Verdict::Available => {
                    // Durable before anything else happens for this candidate
                    results.append(&candidate)?;
                    summary.available.push(candidate.clone());
                    observer.on_event(ScanEvent::Found {
                        username: &candidate,
                        found_so_far: summary.available.len(),
                    });
                }
                crate::types::Verdict::Taken => summary.taken += 1,
                crate::types::Verdict::Indeterminate => summary.indeterminate += 1,
            }

            checkpoint.record(&candidate)?;

            observer.on_event(ScanEvent::Probed {
                result: &result,
                checked: summary.attempted,
            });

            if summary.attempted % PROGRESS_INTERVAL == 0 {
                observer.on_event(progress_event(summary.attempted, planned, started));
            }
        }

        summary.elapsed = started.elapsed();
        Ok(summary)
    }
}

/// Compute a periodic progress snapshot from counts and wall-clock time.
fn progress_event(checked: u64, planned: u64, started: Instant) -> ScanEvent<'static> {
    let elapsed = started.elapsed().as_secs_f64();
    let per_second = if elapsed > 0.0 {
        checked as f64 / elapsed
    } else {
        0.0
    };
    let remaining_checks = planned.saturating_sub(checked);
    let remaining = if per_second > 0.0 {
        Duration::from_secs_f64(remaining_checks as f64 / per_second)
    } else {
        Duration::ZERO
    };
    let percent = if planned > 0 {
        checked as f64 * 100.0 / planned as f64
    } else {
        100.0
    };

    ScanEvent::Progress {
        checked,
        planned,
        percent,
        per_second,
        remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_event_math() {
        let started = Instant::now();
        if let ScanEvent::Progress {
            checked,
            planned,
            percent,
            ..
        } = progress_event(10, 40, started)
        {
            assert_eq!(checked, 10);
            assert_eq!(planned, 40);
            assert!((percent - 25.0).abs() < f64::EPSILON);
        } else {
            panic!("expected Progress event");
        }
    }

    #[test]
    fn test_progress_event_zero_planned() {
        if let ScanEvent::Progress { percent, .. } = progress_event(0, 0, Instant::now()) {
            assert_eq!(percent, 100.0);
        } else {
            panic!("expected Progress event");
        }
    }

    #[test]
    fn test_scanner_rejects_invalid_config() {
        let config = ScanConfig::default().with_rate(0);
        assert!(HandleScanner::new(config).is_err());
    }
}
