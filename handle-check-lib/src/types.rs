//! Core data types for username availability probing.
//!
//! This module defines all the main data structures used throughout the library,
//! including probe results, the immutable scan configuration, and run summaries.

use crate::error::HandleCheckError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Default candidate alphabet: 26 lowercase letters + 10 digits.
pub const DEFAULT_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz0123456789";

/// Fixed descriptive User-Agent sent with every probe.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "handle-check/",
    env!("CARGO_PKG_VERSION"),
    " (by u/handle-check) - Checking username availability"
);

/// Tri-state classification of one probe.
///
/// `Indeterminate` means the transport failed (timeout, connection error);
/// it is treated conservatively and never recorded as available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// The service reports no such identifier exists
    #[serde(rename = "available")]
    Available,

    /// A response was received indicating existence or suspension
    #[serde(rename = "taken")]
    Taken,

    /// The probe failed (network/timeout); availability unknown
    #[serde(rename = "indeterminate")]
    Indeterminate,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Available => write!(f, "available"),
            Verdict::Taken => write!(f, "taken"),
            Verdict::Indeterminate => write!(f, "indeterminate"),
        }
    }
}

/// Result of probing a single username.
///
/// Transport failures are carried in-band: `verdict` is `Indeterminate` and
/// `error_message` holds the failure detail. Callers branch on the verdict,
/// never on a thrown error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    /// The username that was probed
    pub username: String,

    /// Tri-state availability classification
    pub verdict: Verdict,

    /// HTTP status code of the response, if one was received
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,

    /// How long the probe took (excluding the rate-limiter wait)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_duration: Option<Duration>,

    /// Diagnostic structural marker extracted from the response body.
    /// Informational only; has no effect on the verdict.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,

    /// Transport failure detail when the verdict is `Indeterminate`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Immutable configuration for a probing run.
///
/// Constructed once at startup and passed into each component; there is no
/// ambient global state. Use the `with_*` builder methods to customize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Candidate alphabet for bulk enumeration.
    /// Default: lowercase letters + digits (36 symbols)
    pub alphabet: String,

    /// Fixed candidate length L for bulk enumeration.
    /// Default: 3
    pub length: usize,

    /// Probes admitted per rolling 60-second window.
    /// Default: 30. Must be at least 1.
    pub rate_per_minute: u32,

    /// Timeout for each outbound probe request.
    /// Default: 10 seconds
    #[serde(skip)] // Don't serialize Duration directly
    pub timeout: Duration,

    /// Pause after a transport failure before the next probe.
    /// Default: 30 seconds
    #[serde(skip)] // Don't serialize Duration directly
    pub cooldown: Duration,

    /// Base URL of the profile service; probes GET `<base>/user/<name>`.
    pub base_url: String,

    /// Descriptive User-Agent header sent with every probe
    pub user_agent: String,

    /// Which aria-label occurrence (1-based) to report as the diagnostic
    /// marker. Default: 1
    pub marker_occurrence: usize,

    /// Directory for per-username raw response dumps.
    /// Default: None (dumps disabled)
    pub debug_dir: Option<PathBuf>,

    /// Cap on probes attempted in bulk mode.
    /// Default: None (full enumeration space)
    pub max_checks: Option<u64>,

    /// Checkpoint file override; None derives the name from `length`
    pub checkpoint_file: Option<PathBuf>,

    /// Result file override; None derives the name from `length`
    pub results_file: Option<PathBuf>,
}

impl Default for ScanConfig {
    /// Create a sensible default configuration.
    ///
    /// The defaults reproduce the conservative probing posture: 30 probes
    /// per minute, 10-second timeout, 30-second failure cooldown.
    fn default() -> Self {
        Self {
            alphabet: DEFAULT_ALPHABET.to_string(),
            length: 3,
            rate_per_minute: 30,
            timeout: Duration::from_secs(10),
            cooldown: Duration::from_secs(30),
            base_url: "https://www.reddit.com".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            marker_occurrence: 1,
            debug_dir: None,
            max_checks: None,
            checkpoint_file: None,
            results_file: None,
        }
    }
}

impl ScanConfig {
    /// Set the candidate length for bulk enumeration.
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Set the per-minute probe quota.
    pub fn with_rate(mut self, rate_per_minute: u32) -> Self {
        self.rate_per_minute = rate_per_minute;
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the transport-failure cooldown.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Set the profile service base URL.
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Cap the number of probes attempted in bulk mode.
    pub fn with_max_checks(mut self, max_checks: u64) -> Self {
        self.max_checks = Some(max_checks);
        self
    }

    /// Enable per-username raw response dumps into `dir`.
    pub fn with_debug_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.debug_dir = Some(dir.into());
        self
    }

    /// Set the diagnostic marker occurrence index (1-based).
    pub fn with_marker_occurrence(mut self, occurrence: usize) -> Self {
        self.marker_occurrence = occurrence;
        self
    }

    /// Validate the configuration before a run.
    ///
    /// Catches the settings that would otherwise fail deep inside a run:
    /// empty or duplicated alphabets, zero quota, zero-length candidates.
    pub fn validate(&self) -> Result<(), HandleCheckError> {
        if self.alphabet.is_empty() {
            return Err(HandleCheckError::config("alphabet cannot be empty"));
        }
        let mut seen = HashSet::new();
        for ch in self.alphabet.chars() {
            if !seen.insert(ch) {
                return Err(HandleCheckError::config(format!(
                    "duplicate symbol '{}' in alphabet",
                    ch
                )));
            }
        }
        if self.length == 0 {
            return Err(HandleCheckError::config(
                "candidate length must be at least 1",
            ));
        }
        if self.rate_per_minute == 0 {
            return Err(HandleCheckError::config(
                "rate quota must be at least 1 probe per minute",
            ));
        }
        if self.timeout.is_zero() {
            return Err(HandleCheckError::config("probe timeout must be non-zero"));
        }
        if self.marker_occurrence == 0 {
            return Err(HandleCheckError::config(
                "marker occurrence index is 1-based and must be at least 1",
            ));
        }
        if let Some(0) = self.max_checks {
            return Err(HandleCheckError::config(
                "max checks must be at least 1 when set",
            ));
        }
        Ok(())
    }
}

/// Summary of a completed (or interrupted) bulk run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanSummary {
    /// Probes attempted in this run (checkpoint-skipped candidates excluded)
    pub attempted: u64,

    /// Candidates skipped because they were already in the checkpoint
    pub skipped: u64,

    /// Probes classified taken
    pub taken: u64,

    /// Probes that failed in transport
    pub indeterminate: u64,

    /// Usernames found available, in discovery order
    pub available: Vec<String>,

    /// Wall-clock duration of the run
    pub elapsed: Duration,

    /// Whether the run was stopped by a cancellation request
    pub interrupted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScanConfig::default();
        assert_eq!(config.alphabet.len(), 36);
        assert_eq!(config.length, 3);
        assert_eq!(config.rate_per_minute, 30);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.cooldown, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_rate() {
        let config = ScanConfig::default().with_rate(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_length() {
        let config = ScanConfig::default().with_length(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_alphabet() {
        let config = ScanConfig {
            alphabet: "aab".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_max_checks() {
        let config = ScanConfig::default().with_max_checks(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_probe_result_serialization_skips_empty_fields() {
        let result = ProbeResult {
            username: "abc".to_string(),
            verdict: Verdict::Available,
            http_status: Some(404),
            check_duration: None,
            marker: None,
            error_message: None,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"available\""));
        assert!(json.contains("404"));
        assert!(!json.contains("error_message"));
        assert!(!json.contains("marker"));
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::Available.to_string(), "available");
        assert_eq!(Verdict::Taken.to_string(), "taken");
        assert_eq!(Verdict::Indeterminate.to_string(), "indeterminate");
    }
}
