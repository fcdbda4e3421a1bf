//! Display logic for the handle-check CLI.
//!
//! All user-facing output lives here: colored result lines, progress lines,
//! headers, and summaries. The library core reports through `ScanObserver`
//! and never prints; this module is the only place that formats.
//! Uses only the `console` crate (already a dependency).

use console::{pad_str, style, Alignment};
use handle_check_lib::{ProbeResult, ScanEvent, ScanObserver, ScanSummary, Verdict};
use std::path::Path;
use std::time::Duration;

const USERNAME_WIDTH: usize = 24;

// ── Observer ─────────────────────────────────────────────────────────────────

/// Observer that renders scan events as terminal lines.
pub struct CliObserver {
    pretty: bool,
    quiet: bool,
    debug: bool,
}

impl CliObserver {
    pub fn new(pretty: bool, quiet: bool, debug: bool) -> Self {
        Self {
            pretty,
            quiet,
            debug,
        }
    }
}

impl ScanObserver for CliObserver {
    fn on_event(&self, event: ScanEvent<'_>) {
        match event {
            ScanEvent::Started {
                total_candidates,
                planned_checks,
                resumed,
            } => {
                if self.quiet {
                    return;
                }
                print_header(total_candidates, planned_checks, resumed, self.pretty);
            }
            ScanEvent::Probed { result, checked } => {
                if self.quiet {
                    return;
                }
                print_probe_line(result, checked, self.debug);
            }
            ScanEvent::Found {
                username,
                found_so_far,
            } => {
                if self.quiet {
                    return;
                }
                println!(
                    "{} {} {}",
                    style("Found available username:").green().bold(),
                    style(username).white().bold(),
                    style(format!("(#{})", found_so_far)).dim(),
                );
            }
            ScanEvent::Progress {
                checked,
                planned,
                percent,
                per_second,
                remaining,
            } => {
                if self.quiet {
                    return;
                }
                println!(
                    "{}",
                    style(format!(
                        "Progress: {}/{} ({:.1}%) | {:.2} checks/sec | ETA {}",
                        checked,
                        planned,
                        percent,
                        per_second,
                        format_duration(remaining),
                    ))
                    .dim(),
                );
            }
        }
    }
}

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a header at the start of a bulk run.
fn print_header(total: u64, planned: u64, resumed: usize, pretty: bool) {
    if pretty {
        println!(
            "{} {} {}",
            style("handle-check").bold(),
            style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
            style(format!("— Scanning {} candidates", total)).dim(),
        );
        println!(
            "{}",
            style(format!(
                "Planned this run: {} | Already checked: {}",
                planned, resumed
            ))
            .dim(),
        );
        println!();
    } else {
        println!(
            "Scanning {} candidates ({} planned this run, {} already checked)",
            total, planned, resumed
        );
    }
}

// ── Result lines ─────────────────────────────────────────────────────────────

/// Print one per-probe line with colors and alignment.
fn print_probe_line(result: &ProbeResult, checked: u64, debug: bool) {
    let padded = pad_str(&result.username, USERNAME_WIDTH, Alignment::Left, Some(".."));
    let prefix = style(format!("[{}]", checked)).dim();

    let status = match result.http_status {
        Some(code) => format!("({})", code),
        None => String::new(),
    };

    match result.verdict {
        Verdict::Available => {
            println!(
                "  {} {}  {}  {}",
                prefix,
                style(&padded).white(),
                style("AVAILABLE").green().bold(),
                style(status).dim(),
            );
        }
        Verdict::Taken => {
            println!(
                "  {} {}  {}  {}",
                prefix,
                style(&padded).white(),
                style("TAKEN").red().bold(),
                style(status).dim(),
            );
        }
        Verdict::Indeterminate => {
            let reason = result
                .error_message
                .as_deref()
                .unwrap_or("unknown transport failure");
            println!(
                "  {} {}  {}  {}",
                prefix,
                style(&padded).white(),
                style("UNKNOWN").yellow(),
                style(format!("({})", reason)).dim(),
            );
        }
    }

    if debug {
        if let Some(marker) = &result.marker {
            println!("      {} marker: {}", style("└─").dim(), style(marker).dim());
        }
    }
}

/// Print the outcome of a single-identifier check.
pub fn print_single_result(result: &ProbeResult, debug: bool) {
    print_probe_line(result, 1, debug);
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final summary bar, the enumerated list of available usernames,
/// and where the results were appended.
pub fn print_summary(summary: &ScanSummary, results_path: &Path) {
    println!();
    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );

    if summary.interrupted {
        println!("  {}", style("Search interrupted by user").yellow());
    } else {
        println!("  {}", style("Search complete!").bold());
    }

    println!(
        "  {} probe{} in {}  {}  {}  {}  {}  {}  {}",
        style(summary.attempted).bold(),
        if summary.attempted == 1 { "" } else { "s" },
        format_duration(summary.elapsed),
        style("|").dim(),
        style(format!("{} available", summary.available.len())).green(),
        style("|").dim(),
        style(format!("{} taken", summary.taken)).red(),
        style("|").dim(),
        style(format!("{} unknown", summary.indeterminate)).yellow(),
    );
    if summary.skipped > 0 {
        println!(
            "  {}",
            style(format!(
                "{} candidates skipped (already checkpointed)",
                summary.skipped
            ))
            .dim(),
        );
    }

    println!();
    println!(
        "  Found {} available username{}:",
        summary.available.len(),
        if summary.available.len() == 1 { "" } else { "s" },
    );
    for username in &summary.available {
        println!("  {}", style(username).green());
    }

    if !summary.available.is_empty() {
        println!(
            "  {}",
            style(format!("Results appended to {}", results_path.display())).dim(),
        );
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Format a duration as a human-friendly magnitude.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 90.0 {
        format!("{:.1} seconds", secs)
    } else if secs < 5400.0 {
        format!("{:.1} minutes", secs / 60.0)
    } else if secs < 129_600.0 {
        format!("{:.1} hours", secs / 3600.0)
    } else {
        format!("{:.1} days", secs / 86_400.0)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_seconds() {
        assert_eq!(format_duration(Duration::from_secs(45)), "45.0 seconds");
    }

    #[test]
    fn test_format_duration_minutes() {
        assert_eq!(format_duration(Duration::from_secs(600)), "10.0 minutes");
    }

    #[test]
    fn test_format_duration_hours() {
        assert_eq!(format_duration(Duration::from_secs(7200)), "2.0 hours");
    }

    #[test]
    fn test_format_duration_days() {
        assert_eq!(format_duration(Duration::from_secs(259_200)), "3.0 days");
    }

    #[test]
    fn test_observer_quiet_emits_nothing() {
        // Quiet mode must not panic on any event shape; output itself is
        // suppressed so there is nothing further to assert.
        let observer = CliObserver::new(false, true, false);
        observer.on_event(ScanEvent::Started {
            total_candidates: 4,
            planned_checks: 4,
            resumed: 0,
        });
        observer.on_event(ScanEvent::Found {
            username: "abc",
            found_so_far: 1,
        });
    }
}
