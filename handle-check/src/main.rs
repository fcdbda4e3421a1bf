//! Handle Check CLI Application
//!
//! A command-line interface for probing username availability on a remote
//! profile service. This CLI application provides a user-friendly interface
//! to the handle-check-lib library: argument parsing, config discovery,
//! colored output, and graceful interruption.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use handle_check_lib::{
    default_checkpoint_file, default_results_file, load_env_config, parse_timeout_string,
    CandidateSpace, CheckpointSet, ConfigManager, EnvConfig, FileConfig, HandleScanner, ResultLog,
    ScanConfig,
};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for handle-check
#[derive(Parser, Debug)]
#[command(name = "handle-check")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Probe username availability with conservative rate limiting")]
#[command(
    long_about = "Probe username availability on a remote profile service.\n\nWithout --username, enumerates the full candidate space (lowercase letters + digits at a fixed length) and probes every name not yet checkpointed, at most Q probes per rolling minute."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Check a single username and exit (no checkpoint interaction)
    #[arg(
        short = 'u',
        long = "username",
        value_name = "NAME",
        help_heading = "Mode"
    )]
    pub username: Option<String>,

    /// Max probes to attempt in bulk mode (default: full enumeration space)
    #[arg(
        short = 'm',
        long = "max-checks",
        value_name = "N",
        help_heading = "Mode"
    )]
    pub max_checks: Option<u64>,

    /// Candidate length for bulk enumeration (default: 3)
    #[arg(
        short = 'l',
        long = "length",
        value_name = "L",
        help_heading = "Enumeration"
    )]
    pub length: Option<usize>,

    /// Probes per rolling 60-second window (default: 30)
    #[arg(
        short = 'r',
        long = "rate",
        value_name = "Q",
        help_heading = "Enumeration"
    )]
    pub rate: Option<u32>,

    /// Checkpoint file of already-probed usernames
    #[arg(long = "checkpoint", value_name = "FILE", help_heading = "Persistence")]
    pub checkpoint: Option<PathBuf>,

    /// Result file of usernames found available
    #[arg(long = "results", value_name = "FILE", help_heading = "Persistence")]
    pub results: Option<PathBuf>,

    /// Directory for per-username raw response dumps
    #[arg(long = "debug-dir", value_name = "DIR", help_heading = "Persistence")]
    pub debug_dir: Option<PathBuf>,

    /// Profile service base URL (default: https://www.reddit.com)
    #[arg(long = "base-url", value_name = "URL", help_heading = "Probe")]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds (default: 10)
    #[arg(long = "timeout", value_name = "SECS", help_heading = "Probe")]
    pub timeout: Option<u64>,

    /// Cooldown in seconds after a transport failure (default: 30)
    #[arg(long = "cooldown", value_name = "SECS", help_heading = "Probe")]
    pub cooldown: Option<u64>,

    /// aria-label occurrence reported for diagnostics (1-based, default: 1)
    #[arg(long = "marker-occurrence", value_name = "N", help_heading = "Probe")]
    pub marker_occurrence: Option<usize>,

    /// Output the result or run summary as JSON
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Enable styled output with a run header
    #[arg(short = 'p', long = "pretty", help_heading = "Output Format")]
    pub pretty: bool,

    /// Suppress per-probe lines (summary only)
    #[arg(short = 'q', long = "quiet", help_heading = "Output Format")]
    pub quiet: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show detailed debug information (tracing output on stderr)
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Validate arguments
    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    // Set up tracing if debug output was requested
    if args.debug {
        init_tracing();
    }

    if args.verbose {
        println!("handle-check v{} starting...", env!("CARGO_PKG_VERSION"));
    }

    // Run the probing
    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    // Can't have multiple output formats
    if args.json && args.pretty {
        return Err("Cannot specify both --json and --pretty output".to_string());
    }

    if let Some(username) = &args.username {
        handle_check_lib::validate_username(username).map_err(|e| e.to_string())?;

        if args.max_checks.is_some() {
            return Err(
                "--max-checks only applies to bulk mode; remove it when using --username"
                    .to_string(),
            );
        }
    }

    if let Some(length) = args.length {
        if length == 0 || length > 16 {
            return Err("Candidate length must be between 1 and 16".to_string());
        }
    }

    if let Some(rate) = args.rate {
        if rate == 0 || rate > 600 {
            return Err("Rate must be between 1 and 600 probes per minute".to_string());
        }
    }

    if args.max_checks == Some(0) {
        return Err("--max-checks must be at least 1".to_string());
    }

    if args.timeout == Some(0) {
        return Err("--timeout must be at least 1 second".to_string());
    }

    if args.marker_occurrence == Some(0) {
        return Err("--marker-occurrence is 1-based and must be at least 1".to_string());
    }

    Ok(())
}

/// Install a stderr tracing subscriber for --debug runs.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("handle_check=debug,handle_check_lib=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Main probing logic
async fn run(mut args: Args) -> Result<(), Box<dyn std::error::Error>> {
    // Build configuration from config files, environment, and CLI args
    let config = build_config(&mut args)?;

    match args.username.clone() {
        Some(username) => run_single(config, &username, &args).await,
        None => run_bulk(config, &args).await,
    }
}

/// Single-identifier mode: probe one explicit username, report, exit.
async fn run_single(
    config: ScanConfig,
    username: &str,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    if args.verbose {
        println!("Checking specific username: {}", username);
    }

    let mut scanner = HandleScanner::new(config)?;
    let result = scanner.check_username(username).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        ui::print_single_result(&result, args.debug);
    }

    Ok(())
}

/// Bulk mode: enumerate, probe everything not yet checkpointed, persist.
async fn run_bulk(config: ScanConfig, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let checkpoint_path = config
        .checkpoint_file
        .clone()
        .unwrap_or_else(|| default_checkpoint_file(config.length));
    let results_path = config
        .results_file
        .clone()
        .unwrap_or_else(|| default_results_file(config.length));

    let mut checkpoint = CheckpointSet::load(&checkpoint_path)?;
    let mut results = ResultLog::open(&results_path)?;

    if args.verbose {
        let space = CandidateSpace::new(&config.alphabet, config.length)?;
        let planned = match config.max_checks {
            Some(max) => max.min(space.total()),
            None => space.total(),
        };
        let estimated_minutes = planned as f64 / config.rate_per_minute as f64;
        println!(
            "Resuming with {} previously checked usernames from {}",
            checkpoint.len(),
            checkpoint_path.display()
        );
        println!(
            "Checking up to {} usernames at {} per minute",
            planned, config.rate_per_minute
        );
        println!(
            "Estimated time: {:.1} minutes ({:.1} hours)",
            estimated_minutes,
            estimated_minutes / 60.0
        );
    }

    // Cooperative cancellation: Ctrl-C sets the flag, the scanner finishes
    // the in-flight probe, flushes, and returns the partial summary.
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nInterrupt received, finishing current probe...");
                cancel.store(true, Ordering::SeqCst);
            }
        });
    }

    let observer = ui::CliObserver::new(args.pretty, args.quiet || args.json, args.debug);
    let mut scanner = HandleScanner::new(config)?;

    let summary = scanner
        .run_bulk(&mut checkpoint, &mut results, &observer, &cancel)
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        ui::print_summary(&summary, &results_path);
    }

    Ok(())
}

/// Build ScanConfig from CLI arguments with config file integration.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments (explicit user input)
/// 2. Environment variables (HC_*)
/// 3. Local config file (./handle-check.toml or ./.handle-check.toml)
/// 4. Global config file (~/.handle-check.toml)
/// 5. XDG config file (~/.config/handle-check/config.toml)
/// 6. Built-in defaults
fn build_config(args: &mut Args) -> Result<ScanConfig, Box<dyn std::error::Error>> {
    let mut config = ScanConfig::default();

    // Create config manager for file discovery
    let config_manager = ConfigManager::new(args.verbose);

    // Step 1: Determine config file path and load config files
    if let Some(explicit_config_path) = &args.config {
        // CLI --config flag provided
        if args.verbose {
            println!(
                "Using explicit config file (CLI --config): {}",
                explicit_config_path
            );
        }

        let file_config = config_manager.load_file(explicit_config_path).map_err(|e| {
            format!(
                "Failed to load config file '{}': {}",
                explicit_config_path, e
            )
        })?;

        apply_file_config(&mut config, args, file_config);
    } else if let Ok(env_config_path) = std::env::var("HC_CONFIG") {
        // HC_CONFIG environment variable provided
        if args.verbose {
            println!(
                "Using explicit config file (HC_CONFIG env var): {}",
                env_config_path
            );
        }

        let file_config = config_manager
            .load_file(&env_config_path)
            .map_err(|e| format!("Failed to load config file '{}': {}", env_config_path, e))?;

        apply_file_config(&mut config, args, file_config);
    } else {
        // No explicit config: use automatic discovery
        match config_manager.discover_and_load() {
            Ok(file_config) => {
                apply_file_config(&mut config, args, file_config);
            }
            Err(e) if args.verbose => {
                eprintln!("Config discovery warning: {}", e);
            }
            Err(_) => {
                // Silently continue with defaults if no config files found
            }
        }
    }

    // Step 2: Apply environment variables (HC_*)
    let env_config = load_env_config(args.verbose);
    apply_env_config(&mut config, args, env_config);

    // Step 3: Apply CLI arguments (highest precedence)
    apply_cli_args(&mut config, args);

    // Final validation with everything merged
    config.validate()?;

    Ok(config)
}

/// Merge FileConfig defaults into the scan configuration.
fn apply_file_config(config: &mut ScanConfig, args: &mut Args, file_config: FileConfig) {
    let Some(defaults) = file_config.defaults else {
        return;
    };

    if let Some(length) = defaults.length {
        config.length = length;
    }
    if let Some(rate) = defaults.rate_per_minute {
        config.rate_per_minute = rate;
    }
    if let Some(timeout_str) = defaults.timeout {
        if let Some(secs) = parse_timeout_string(&timeout_str) {
            config.timeout = Duration::from_secs(secs);
        }
    }
    if let Some(cooldown_str) = defaults.cooldown {
        if let Some(secs) = parse_timeout_string(&cooldown_str) {
            config.cooldown = Duration::from_secs(secs);
        }
    }
    if let Some(base_url) = defaults.base_url {
        config.base_url = base_url;
    }
    if let Some(user_agent) = defaults.user_agent {
        config.user_agent = user_agent;
    }
    if let Some(path) = defaults.checkpoint_file {
        config.checkpoint_file = Some(PathBuf::from(path));
    }
    if let Some(path) = defaults.results_file {
        config.results_file = Some(PathBuf::from(path));
    }
    if let Some(dir) = defaults.debug_dir {
        config.debug_dir = Some(PathBuf::from(dir));
    }
    if let Some(occurrence) = defaults.marker_occurrence {
        config.marker_occurrence = occurrence;
    }

    // Output preferences flow into the display flags unless the user already
    // asked for something on the command line
    if let Some(pretty) = defaults.pretty {
        args.pretty = args.pretty || pretty;
    }
    if let Some(json) = defaults.json {
        args.json = args.json || json;
    }
}

/// Apply HC_* environment variables to the scan configuration.
fn apply_env_config(config: &mut ScanConfig, args: &mut Args, env_config: EnvConfig) {
    if let Some(length) = env_config.length {
        config.length = length;
    }
    if let Some(rate) = env_config.rate_per_minute {
        config.rate_per_minute = rate;
    }
    if let Some(timeout_str) = &env_config.timeout {
        if let Some(secs) = parse_timeout_string(timeout_str) {
            config.timeout = Duration::from_secs(secs);
        }
    }
    if let Some(cooldown_str) = &env_config.cooldown {
        if let Some(secs) = parse_timeout_string(cooldown_str) {
            config.cooldown = Duration::from_secs(secs);
        }
    }
    if let Some(base_url) = env_config.base_url {
        config.base_url = base_url;
    }
    if let Some(user_agent) = env_config.user_agent {
        config.user_agent = user_agent;
    }
    if let Some(path) = env_config.checkpoint_file {
        config.checkpoint_file = Some(PathBuf::from(path));
    }
    if let Some(path) = env_config.results_file {
        config.results_file = Some(PathBuf::from(path));
    }
    if let Some(dir) = env_config.debug_dir {
        config.debug_dir = Some(PathBuf::from(dir));
    }
    if let Some(occurrence) = env_config.marker_occurrence {
        config.marker_occurrence = occurrence;
    }
    if let Some(pretty) = env_config.pretty {
        args.pretty = args.pretty || pretty;
    }
    if let Some(json) = env_config.json {
        args.json = args.json || json;
    }
}

/// Apply CLI arguments to the scan configuration (highest precedence).
fn apply_cli_args(config: &mut ScanConfig, args: &Args) {
    if let Some(length) = args.length {
        config.length = length;
    }
    if let Some(rate) = args.rate {
        config.rate_per_minute = rate;
    }
    if let Some(secs) = args.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = args.cooldown {
        config.cooldown = Duration::from_secs(secs);
    }
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(path) = &args.checkpoint {
        config.checkpoint_file = Some(path.clone());
    }
    if let Some(path) = &args.results {
        config.results_file = Some(path.clone());
    }
    if let Some(dir) = &args.debug_dir {
        config.debug_dir = Some(dir.clone());
    }
    if let Some(occurrence) = args.marker_occurrence {
        config.marker_occurrence = occurrence;
    }
    if let Some(max) = args.max_checks {
        config.max_checks = Some(max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args::parse_from(["handle-check"])
    }

    #[test]
    fn test_validate_rejects_json_with_pretty() {
        let mut args = base_args();
        args.json = true;
        args.pretty = true;
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_username() {
        let mut args = base_args();
        args.username = Some("not a name!".to_string());
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_rejects_username_with_max_checks() {
        let mut args = base_args();
        args.username = Some("spez".to_string());
        args.max_checks = Some(5);
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_accepts_bulk_defaults() {
        assert!(validate_args(&base_args()).is_ok());
    }

    #[test]
    fn test_cli_args_override_config() {
        let mut args = base_args();
        args.length = Some(4);
        args.rate = Some(10);
        args.max_checks = Some(100);

        let mut config = ScanConfig::default();
        apply_cli_args(&mut config, &args);

        assert_eq!(config.length, 4);
        assert_eq!(config.rate_per_minute, 10);
        assert_eq!(config.max_checks, Some(100));
    }

    #[test]
    fn test_file_config_does_not_override_cli_output_flags() {
        let mut args = base_args();
        args.pretty = true;

        let mut config = ScanConfig::default();
        let file_config = FileConfig {
            defaults: Some(handle_check_lib::DefaultsConfig {
                pretty: Some(false),
                length: Some(5),
                ..Default::default()
            }),
        };
        apply_file_config(&mut config, &mut args, file_config);

        assert!(args.pretty);
        assert_eq!(config.length, 5);
    }
}
