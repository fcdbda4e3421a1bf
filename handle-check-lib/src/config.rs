//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and merging
//! configurations with proper precedence rules, plus the `HC_*` environment
//! variable layer that sits between config files and CLI arguments.

use crate::error::HandleCheckError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration loaded from TOML files.
///
/// This represents the structure of configuration files that users can
/// create to set default values for runs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Default candidate length
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,

    /// Default probes per minute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_per_minute: Option<u32>,

    /// Default probe timeout (as string, e.g., "10s", "1m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Default transport-failure cooldown (as string, e.g., "30s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<String>,

    /// Default profile service base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Default User-Agent header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Default checkpoint file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint_file: Option<String>,

    /// Default result file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_file: Option<String>,

    /// Default debug dump directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_dir: Option<String>,

    /// Default diagnostic marker occurrence index (1-based)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_occurrence: Option<usize>,

    /// Default pretty output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pretty: Option<bool>,

    /// Default JSON output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to emit warnings for config issues
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, HandleCheckError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(HandleCheckError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            HandleCheckError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig =
            toml::from_str(&content).map_err(|e| HandleCheckError::ConfigError {
                message: format!("Failed to parse TOML configuration: {}", e),
            })?;

        // Validate the loaded configuration
        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Looks for configuration files in standard locations and merges them,
    /// later (more local) files winning over earlier ones.
    pub fn discover_and_load(&self) -> Result<FileConfig, HandleCheckError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        // 1. Load XDG config (lowest precedence)
        if let Some(xdg_path) = self.get_xdg_config_path() {
            if let Ok(config) = self.load_file(&xdg_path) {
                merged_config = self.merge_configs(merged_config, config);
                loaded_files.push(xdg_path);
            }
        }

        // 2. Load global config
        if let Some(global_path) = self.get_global_config_path() {
            if let Ok(config) = self.load_file(&global_path) {
                merged_config = self.merge_configs(merged_config, config);
                loaded_files.push(global_path);
            }
        }

        // 3. Load local config (highest precedence)
        if let Some(local_path) = self.get_local_config_path() {
            if let Ok(config) = self.load_file(&local_path) {
                merged_config = self.merge_configs(merged_config, config);
                loaded_files.push(local_path);
            }
        }

        if self.verbose && loaded_files.len() > 1 {
            eprintln!("Multiple config files found. Using precedence:");
            for (i, path) in loaded_files.iter().enumerate() {
                let status = if i == loaded_files.len() - 1 {
                    "active"
                } else {
                    "overridden"
                };
                eprintln!("   {} ({})", path.display(), status);
            }
        }

        Ok(merged_config)
    }

    /// Get the local configuration file path.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./handle-check.toml", "./.handle-check.toml"];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Some(path.to_path_buf());
            }
        }

        None
    }

    /// Get the global configuration file path.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        if let Some(home) = env::var_os("HOME") {
            let candidates = [".handle-check.toml", "handle-check.toml"];

            for candidate in &candidates {
                let path = Path::new(&home).join(candidate);
                if path.exists() {
                    return Some(path);
                }
            }
        }

        None
    }

    /// Get the XDG configuration file path.
    ///
    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("handle-check").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations with proper precedence.
    ///
    /// Values from `higher` take precedence over values from `lower`.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(mut lower_defaults), Some(higher_defaults)) => {
                    if higher_defaults.length.is_some() {
                        lower_defaults.length = higher_defaults.length;
                    }
                    if higher_defaults.rate_per_minute.is_some() {
                        lower_defaults.rate_per_minute = higher_defaults.rate_per_minute;
                    }
                    if higher_defaults.timeout.is_some() {
                        lower_defaults.timeout = higher_defaults.timeout;
                    }
                    if higher_defaults.cooldown.is_some() {
                        lower_defaults.cooldown = higher_defaults.cooldown;
                    }
                    if higher_defaults.base_url.is_some() {
                        lower_defaults.base_url = higher_defaults.base_url;
                    }
                    if higher_defaults.user_agent.is_some() {
                        lower_defaults.user_agent = higher_defaults.user_agent;
                    }
                    if higher_defaults.checkpoint_file.is_some() {
                        lower_defaults.checkpoint_file = higher_defaults.checkpoint_file;
                    }
                    if higher_defaults.results_file.is_some() {
                        lower_defaults.results_file = higher_defaults.results_file;
                    }
                    if higher_defaults.debug_dir.is_some() {
                        lower_defaults.debug_dir = higher_defaults.debug_dir;
                    }
                    if higher_defaults.marker_occurrence.is_some() {
                        lower_defaults.marker_occurrence = higher_defaults.marker_occurrence;
                    }
                    if higher_defaults.pretty.is_some() {
                        lower_defaults.pretty = higher_defaults.pretty;
                    }
                    if higher_defaults.json.is_some() {
                        lower_defaults.json = higher_defaults.json;
                    }
                    Some(lower_defaults)
                }
                (None, Some(higher_defaults)) => Some(higher_defaults),
                (Some(lower_defaults), None) => Some(lower_defaults),
                (None, None) => None,
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), HandleCheckError> {
        if let Some(defaults) = &config.defaults {
            if let Some(length) = defaults.length {
                if length == 0 || length > 16 {
                    return Err(HandleCheckError::ConfigError {
                        message: "Candidate length must be between 1 and 16".to_string(),
                    });
                }
            }

            if let Some(rate) = defaults.rate_per_minute {
                if rate == 0 || rate > 600 {
                    return Err(HandleCheckError::ConfigError {
                        message: "rate_per_minute must be between 1 and 600".to_string(),
                    });
                }
            }

            if let Some(occurrence) = defaults.marker_occurrence {
                if occurrence == 0 {
                    return Err(HandleCheckError::ConfigError {
                        message: "marker_occurrence is 1-based and must be at least 1".to_string(),
                    });
                }
            }

            if let Some(timeout_str) = &defaults.timeout {
                if parse_timeout_string(timeout_str).is_none() {
                    return Err(HandleCheckError::ConfigError {
                        message: format!(
                            "Invalid timeout format '{}'. Use format like '10s', '30s', '2m'",
                            timeout_str
                        ),
                    });
                }
            }

            if let Some(cooldown_str) = &defaults.cooldown {
                if parse_timeout_string(cooldown_str).is_none() {
                    return Err(HandleCheckError::ConfigError {
                        message: format!(
                            "Invalid cooldown format '{}'. Use format like '30s', '1m'",
                            cooldown_str
                        ),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Parse a duration string like "10s", "2m", or a bare number of seconds.
pub fn parse_timeout_string(value: &str) -> Option<u64> {
    let value = value.trim().to_lowercase();

    if let Some(stripped) = value.strip_suffix('s') {
        return stripped.trim().parse().ok();
    }
    if let Some(stripped) = value.strip_suffix('m') {
        return stripped.trim().parse::<u64>().ok().map(|m| m * 60);
    }
    value.parse().ok()
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via HC_* environment
/// variables.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub length: Option<usize>,
    pub rate_per_minute: Option<u32>,
    pub timeout: Option<String>,
    pub cooldown: Option<String>,
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
    pub checkpoint_file: Option<String>,
    pub results_file: Option<String>,
    pub debug_dir: Option<String>,
    pub marker_occurrence: Option<usize>,
    pub json: Option<bool>,
    pub pretty: Option<bool>,
}

fn parse_env_bool(name: &str, value: &str, verbose: bool) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => {
            if verbose {
                eprintln!("Invalid {}='{}', use true/false", name, value);
            }
            None
        }
    }
}

/// Load configuration from environment variables.
///
/// Parses all HC_* environment variables and returns a structured
/// configuration. Invalid values are logged as warnings and ignored.
pub fn load_env_config(verbose: bool) -> EnvConfig {
    let mut env_config = EnvConfig::default();

    // HC_LENGTH - candidate length for bulk enumeration
    if let Ok(val) = env::var("HC_LENGTH") {
        match val.parse::<usize>() {
            Ok(length) if length > 0 && length <= 16 => {
                env_config.length = Some(length);
                if verbose {
                    println!("Using HC_LENGTH={}", length);
                }
            }
            _ => {
                if verbose {
                    eprintln!("Invalid HC_LENGTH='{}', must be 1-16", val);
                }
            }
        }
    }

    // HC_RATE - probes per minute
    if let Ok(val) = env::var("HC_RATE") {
        match val.parse::<u32>() {
            Ok(rate) if rate > 0 && rate <= 600 => {
                env_config.rate_per_minute = Some(rate);
                if verbose {
                    println!("Using HC_RATE={}", rate);
                }
            }
            _ => {
                if verbose {
                    eprintln!("Invalid HC_RATE='{}', must be 1-600", val);
                }
            }
        }
    }

    // HC_TIMEOUT - probe timeout
    if let Ok(timeout_str) = env::var("HC_TIMEOUT") {
        if parse_timeout_string(&timeout_str).is_some() {
            env_config.timeout = Some(timeout_str.clone());
            if verbose {
                println!("Using HC_TIMEOUT={}", timeout_str);
            }
        } else if verbose {
            eprintln!(
                "Invalid HC_TIMEOUT='{}', use format like '10s', '2m'",
                timeout_str
            );
        }
    }

    // HC_COOLDOWN - transport-failure cooldown
    if let Ok(cooldown_str) = env::var("HC_COOLDOWN") {
        if parse_timeout_string(&cooldown_str).is_some() {
            env_config.cooldown = Some(cooldown_str.clone());
            if verbose {
                println!("Using HC_COOLDOWN={}", cooldown_str);
            }
        } else if verbose {
            eprintln!(
                "Invalid HC_COOLDOWN='{}', use format like '30s', '1m'",
                cooldown_str
            );
        }
    }

    // HC_BASE_URL - profile service base URL
    if let Ok(base_url) = env::var("HC_BASE_URL") {
        if !base_url.trim().is_empty() {
            env_config.base_url = Some(base_url.clone());
            if verbose {
                println!("Using HC_BASE_URL={}", base_url);
            }
        }
    }

    // HC_USER_AGENT - probe User-Agent header
    if let Ok(user_agent) = env::var("HC_USER_AGENT") {
        if !user_agent.trim().is_empty() {
            env_config.user_agent = Some(user_agent);
            if verbose {
                println!("Using HC_USER_AGENT");
            }
        }
    }

    // HC_CHECKPOINT / HC_RESULTS - persisted file overrides
    if let Ok(path) = env::var("HC_CHECKPOINT") {
        if !path.trim().is_empty() {
            env_config.checkpoint_file = Some(path.clone());
            if verbose {
                println!("Using HC_CHECKPOINT={}", path);
            }
        }
    }
    if let Ok(path) = env::var("HC_RESULTS") {
        if !path.trim().is_empty() {
            env_config.results_file = Some(path.clone());
            if verbose {
                println!("Using HC_RESULTS={}", path);
            }
        }
    }

    // HC_DEBUG_DIR - raw response dump directory
    if let Ok(dir) = env::var("HC_DEBUG_DIR") {
        if !dir.trim().is_empty() {
            env_config.debug_dir = Some(dir.clone());
            if verbose {
                println!("Using HC_DEBUG_DIR={}", dir);
            }
        }
    }

    // HC_MARKER_OCCURRENCE - diagnostic marker index
    if let Ok(val) = env::var("HC_MARKER_OCCURRENCE") {
        match val.parse::<usize>() {
            Ok(occurrence) if occurrence > 0 => {
                env_config.marker_occurrence = Some(occurrence);
                if verbose {
                    println!("Using HC_MARKER_OCCURRENCE={}", occurrence);
                }
            }
            _ => {
                if verbose {
                    eprintln!("Invalid HC_MARKER_OCCURRENCE='{}', must be >= 1", val);
                }
            }
        }
    }

    // HC_JSON / HC_PRETTY - output format toggles
    if let Ok(val) = env::var("HC_JSON") {
        env_config.json = parse_env_bool("HC_JSON", &val, verbose);
    }
    if let Ok(val) = env::var("HC_PRETTY") {
        env_config.pretty = parse_env_bool("HC_PRETTY", &val, verbose);
    }

    env_config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_timeout_string() {
        assert_eq!(parse_timeout_string("10s"), Some(10));
        assert_eq!(parse_timeout_string("2m"), Some(120));
        assert_eq!(parse_timeout_string("30"), Some(30));
        assert_eq!(parse_timeout_string(" 5S "), Some(5));
        assert_eq!(parse_timeout_string("abc"), None);
        assert_eq!(parse_timeout_string(""), None);
        assert_eq!(parse_timeout_string("-5s"), None);
    }

    #[test]
    fn test_load_file_parses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[defaults]
length = 4
rate_per_minute = 20
timeout = "15s"
base_url = "https://example.test"
"#
        )
        .unwrap();

        let manager = ConfigManager::new(false);
        let config = manager.load_file(file.path()).unwrap();
        let defaults = config.defaults.unwrap();

        assert_eq!(defaults.length, Some(4));
        assert_eq!(defaults.rate_per_minute, Some(20));
        assert_eq!(defaults.timeout, Some("15s".to_string()));
        assert_eq!(defaults.base_url, Some("https://example.test".to_string()));
    }

    #[test]
    fn test_load_file_missing() {
        let manager = ConfigManager::new(false);
        assert!(manager.load_file("/nonexistent/handle-check.toml").is_err());
    }

    #[test]
    fn test_load_file_rejects_invalid_rate() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[defaults]\nrate_per_minute = 0").unwrap();

        let manager = ConfigManager::new(false);
        assert!(manager.load_file(file.path()).is_err());
    }

    #[test]
    fn test_load_file_rejects_invalid_timeout() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[defaults]\ntimeout = \"fast\"").unwrap();

        let manager = ConfigManager::new(false);
        assert!(manager.load_file(file.path()).is_err());
    }

    #[test]
    fn test_merge_higher_wins() {
        let manager = ConfigManager::new(false);

        let lower = FileConfig {
            defaults: Some(DefaultsConfig {
                length: Some(3),
                rate_per_minute: Some(30),
                ..Default::default()
            }),
        };
        let higher = FileConfig {
            defaults: Some(DefaultsConfig {
                length: Some(5),
                ..Default::default()
            }),
        };

        let merged = manager.merge_configs(lower, higher);
        let defaults = merged.defaults.unwrap();
        assert_eq!(defaults.length, Some(5));
        // Untouched lower values survive
        assert_eq!(defaults.rate_per_minute, Some(30));
    }

    #[test]
    fn test_merge_with_missing_sides() {
        let manager = ConfigManager::new(false);

        let only_higher = manager.merge_configs(
            FileConfig::default(),
            FileConfig {
                defaults: Some(DefaultsConfig {
                    length: Some(4),
                    ..Default::default()
                }),
            },
        );
        assert_eq!(only_higher.defaults.unwrap().length, Some(4));

        let neither = manager.merge_configs(FileConfig::default(), FileConfig::default());
        assert!(neither.defaults.is_none());
    }
}
