//! # Handle Check Library
//!
//! A sequential, rate-limited library for probing username availability on a
//! remote profile service.
//!
//! The library enumerates fixed-length candidates over a fixed alphabet,
//! paces outbound probes with a sliding-window rate limiter, classifies each
//! HTTP response into a tri-state verdict, and persists a checkpoint and a
//! result log so interrupted runs resume where they left off.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use handle_check_lib::{HandleScanner, ScanConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut scanner = HandleScanner::new(ScanConfig::default())?;
//!     let result = scanner.check_username("spez").await?;
//!
//!     println!("{}: {}", result.username, result.verdict);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Lexicographic enumeration**: full K^L candidate space, streamed
//! - **Sliding-window rate limiting**: at most Q probes per trailing minute
//! - **Tri-state classification**: available / taken / indeterminate
//! - **Durable checkpointing**: every probe flushed before the next starts
//! - **Observer-based progress**: no printing inside the core loop

// Re-export main public API types and functions
// This makes them available as handle_check_lib::TypeName
pub use config::{
    load_env_config, parse_timeout_string, ConfigManager, DefaultsConfig, EnvConfig, FileConfig,
};
pub use enumerate::{CandidateSpace, Candidates};
pub use error::HandleCheckError;
pub use limiter::{RateLimiter, WINDOW};
pub use probe::{classify, ProbeService, UsernameProber, NOT_FOUND_PHRASE};
pub use scanner::{
    HandleScanner, NoopObserver, ScanEvent, ScanObserver, PROGRESS_INTERVAL,
};
pub use store::{CheckpointSet, ResultLog};
pub use types::{
    ProbeResult, ScanConfig, ScanSummary, Verdict, DEFAULT_ALPHABET, DEFAULT_USER_AGENT,
};
pub use utils::{default_checkpoint_file, default_results_file, validate_username};

// Internal modules - these are not part of the public API surface
mod config;
mod enumerate;
mod error;
mod limiter;
mod probe;
mod scanner;
mod store;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, HandleCheckError>;

// Library version metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
