//! HTTP probe and response classification.
//!
//! One probe is a single GET against the profile service; the verdict is a
//! pure function of the transport outcome, the HTTP status, and the response
//! body. This classifier depends on undocumented response conventions of a
//! specific third-party service and will misclassify if that service changes
//! its markup or status-code conventions — that fragility is inherent to the
//! approach, not something this module tries to hide.

use crate::error::HandleCheckError;
use crate::limiter::RateLimiter;
use crate::types::{ProbeResult, ScanConfig, Verdict};
use regex::Regex;
use reqwest::StatusCode;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Exact phrase the service returns on profile pages for names nobody holds.
pub const NOT_FOUND_PHRASE: &str = "Sorry, nobody on Reddit goes by that name";

/// Classify a received response into a verdict.
///
/// Pure function of (status, body). Priority order:
/// 1. 404 status → available (profile page does not exist)
/// 2. "nobody goes by that name" phrase in the body → available
/// 3. anything else → taken (covers both live and suspended accounts,
///    which are indistinguishable from the response alone)
///
/// Transport failures never reach this function; they are classified
/// `Indeterminate` by the prober before classification.
pub fn classify(status: StatusCode, body: &str) -> Verdict {
    if status == StatusCode::NOT_FOUND {
        return Verdict::Available;
    }
    if body.contains(NOT_FOUND_PHRASE) {
        return Verdict::Available;
    }
    Verdict::Taken
}

/// Abstraction over the probing side effect.
///
/// The scanner drives any `ProbeService`; production code uses
/// `UsernameProber`, tests substitute a scripted implementation so the
/// driver's checkpoint, cap, and durability behavior can be exercised
/// without a network.
#[allow(async_fn_in_trait)]
pub trait ProbeService {
    /// Probe one username and classify the response.
    ///
    /// Errors are reserved for local failures (debug dump I/O); transport
    /// failures come back as `Verdict::Indeterminate` results.
    async fn probe(&mut self, username: &str) -> Result<ProbeResult, HandleCheckError>;
}

/// Production prober: rate-limited HTTP GETs against the profile service.
///
/// Owns the HTTP client (connections are reused across sequential probes)
/// and the rate limiter; `probe` acquires a limiter slot before every
/// request.
pub struct UsernameProber {
    client: reqwest::Client,
    limiter: RateLimiter,
    base_url: String,
    marker_re: Regex,
    marker_occurrence: usize,
    cooldown: Duration,
    debug_dir: Option<PathBuf>,
}

impl UsernameProber {
    /// Build a prober from the scan configuration.
    pub fn new(config: &ScanConfig) -> Result<Self, HandleCheckError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                HandleCheckError::network_with_source(
                    "Failed to create probe HTTP client",
                    e.to_string(),
                )
            })?;

        let limiter = RateLimiter::new(config.rate_per_minute)?;
        let marker_re = Regex::new(r#"aria-label="([^"]+)""#)?;

        if config.marker_occurrence == 0 {
            return Err(HandleCheckError::config(
                "marker occurrence index is 1-based and must be at least 1",
            ));
        }

        if let Some(dir) = &config.debug_dir {
            fs::create_dir_all(dir).map_err(|e| {
                HandleCheckError::file_error(
                    dir.to_string_lossy(),
                    format!("Failed to create debug dump directory: {}", e),
                )
            })?;
        }

        Ok(Self {
            client,
            limiter,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            marker_re,
            marker_occurrence: config.marker_occurrence,
            cooldown: config.cooldown,
            debug_dir: config.debug_dir.clone(),
        })
    }

    fn profile_url(&self, username: &str) -> String {
        format!("{}/user/{}", self.base_url, username)
    }

    /// Extract the Nth aria-label attribute value from the body.
    ///
    /// Diagnostic only — the returned string never influences the verdict.
    /// A missing occurrence degrades to a placeholder.
    fn extract_marker(&self, body: &str) -> String {
        match self
            .marker_re
            .captures_iter(body)
            .nth(self.marker_occurrence - 1)
        {
            Some(captures) => captures[1].to_string(),
            None => format!("no aria-label #{} in response", self.marker_occurrence),
        }
    }

    /// Dump the raw response body for later inspection, when enabled.
    fn dump_body(&self, username: &str, body: &str) -> Result<(), HandleCheckError> {
        if let Some(dir) = &self.debug_dir {
            let path = dir.join(format!("debug_{}.html", username));
            fs::write(&path, body).map_err(|e| {
                HandleCheckError::file_error(
                    path.to_string_lossy(),
                    format!("Failed to write debug dump: {}", e),
                )
            })?;
        }
        Ok(())
    }

    /// Build the Indeterminate result for a transport failure, after the
    /// configured cooldown. The cooldown keeps a failing endpoint from being
    /// hammered at full quota.
    async fn transport_failure(
        &self,
        username: &str,
        err: reqwest::Error,
        started: Instant,
    ) -> Result<ProbeResult, HandleCheckError> {
        tracing::warn!(
            username,
            error = %err,
            cooldown_secs = self.cooldown.as_secs(),
            "transport failure, cooling down"
        );
        tokio::time::sleep(self.cooldown).await;

        Ok(ProbeResult {
            username: username.to_string(),
            verdict: Verdict::Indeterminate,
            http_status: err.status().map(|s| s.as_u16()),
            check_duration: Some(started.elapsed()),
            marker: None,
            error_message: Some(err.to_string()),
        })
    }
}

impl ProbeService for UsernameProber {
    async fn probe(&mut self, username: &str) -> Result<ProbeResult, HandleCheckError> {
        self.limiter.acquire().await;

        let url = self.profile_url(username);
        let started = Instant::now();

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => return self.transport_failure(username, e, started).await,
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return self.transport_failure(username, e, started).await,
        };

        let marker = self.extract_marker(&body);
        self.dump_body(username, &body)?;

        let verdict = classify(status, &body);
        tracing::debug!(
            username,
            status = status.as_u16(),
            body_len = body.len(),
            %verdict,
            marker = %marker,
            "probe complete"
        );

        Ok(ProbeResult {
            username: username.to_string(),
            verdict,
            http_status: Some(status.as_u16()),
            check_duration: Some(started.elapsed()),
            marker: Some(marker),
            error_message: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Classification ──────────────────────────────────────────────

    #[test]
    fn test_classify_404_is_available() {
        assert_eq!(classify(StatusCode::NOT_FOUND, ""), Verdict::Available);
    }

    #[test]
    fn test_classify_not_found_phrase_is_available() {
        let body = format!("<html><body>{}</body></html>", NOT_FOUND_PHRASE);
        assert_eq!(classify(StatusCode::OK, &body), Verdict::Available);
    }

    #[test]
    fn test_classify_profile_page_is_taken() {
        assert_eq!(
            classify(StatusCode::OK, "<profile>...</profile>"),
            Verdict::Taken
        );
    }

    #[test]
    fn test_classify_suspended_page_is_taken() {
        // Suspended accounts return a page without the not-found phrase
        assert_eq!(
            classify(StatusCode::OK, "<html>This account has been suspended</html>"),
            Verdict::Taken
        );
    }

    #[test]
    fn test_classify_is_deterministic() {
        let body = "<article aria-label=\"u/someone's post\"></article>";
        let first = classify(StatusCode::OK, body);
        for _ in 0..10 {
            assert_eq!(classify(StatusCode::OK, body), first);
        }
    }

    #[test]
    fn test_classify_404_wins_over_body() {
        // Status takes priority; body content is irrelevant on 404
        assert_eq!(
            classify(StatusCode::NOT_FOUND, "<profile>ghost</profile>"),
            Verdict::Available
        );
    }

    // ── Marker extraction ───────────────────────────────────────────

    fn test_prober(occurrence: usize) -> UsernameProber {
        let config = ScanConfig::default().with_marker_occurrence(occurrence);
        UsernameProber::new(&config).unwrap()
    }

    #[test]
    fn test_extract_first_marker() {
        let prober = test_prober(1);
        let body = r#"<article aria-label="first post"></article><article aria-label="second post"></article>"#;
        assert_eq!(prober.extract_marker(body), "first post");
    }

    #[test]
    fn test_extract_nth_marker() {
        let prober = test_prober(2);
        let body = r#"<article aria-label="first post"></article><article aria-label="second post"></article>"#;
        assert_eq!(prober.extract_marker(body), "second post");
    }

    #[test]
    fn test_extract_marker_missing_degrades_to_placeholder() {
        let prober = test_prober(12);
        let body = r#"<article aria-label="only one"></article>"#;
        assert_eq!(prober.extract_marker(body), "no aria-label #12 in response");
    }

    #[test]
    fn test_extract_marker_no_markup() {
        let prober = test_prober(1);
        assert_eq!(
            prober.extract_marker("plain text"),
            "no aria-label #1 in response"
        );
    }

    // ── Debug dumps ─────────────────────────────────────────────────

    #[test]
    fn test_dump_body_writes_per_username_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScanConfig::default().with_debug_dir(dir.path());
        let prober = UsernameProber::new(&config).unwrap();

        prober.dump_body("abc", "<html>body</html>").unwrap();

        let dumped = fs::read_to_string(dir.path().join("debug_abc.html")).unwrap();
        assert_eq!(dumped, "<html>body</html>");
    }

    #[test]
    fn test_dump_body_disabled_by_default() {
        let prober = test_prober(1);
        // No debug dir configured: a no-op, never an error
        assert!(prober.dump_body("abc", "body").is_ok());
    }

    // ── Transport failure path ──────────────────────────────────────

    /// A probe against a closed local port must come back Indeterminate and
    /// must not return before the configured cooldown has elapsed.
    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_indeterminate_with_cooldown() {
        let config = ScanConfig::default()
            .with_base_url("http://127.0.0.1:9")
            .with_rate(1000);
        let mut prober = UsernameProber::new(&config).unwrap();

        let before = tokio::time::Instant::now();
        let result = prober.probe("abc").await.unwrap();

        assert_eq!(result.verdict, Verdict::Indeterminate);
        assert!(result.error_message.is_some());
        assert!(
            before.elapsed() >= config.cooldown,
            "probe returned before the cooldown elapsed: {:?}",
            before.elapsed()
        );
    }

    #[test]
    fn test_profile_url_strips_trailing_slash() {
        let config = ScanConfig::default().with_base_url("https://www.reddit.com/");
        let prober = UsernameProber::new(&config).unwrap();
        assert_eq!(
            prober.profile_url("abc"),
            "https://www.reddit.com/user/abc"
        );
    }
}
