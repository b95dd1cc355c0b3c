use clap::Parser;
use lib_parking::FeedConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "server_parking.conf";

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[command(about = "Parking occupancy host with live feed", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[arg(long, env = "PARKING_FEED_HOST", help = "Host of the occupancy feed.")]
    pub feed_host: Option<String>,

    #[arg(long, env = "PARKING_FEED_PORT", help = "Port of the occupancy feed.")]
    pub feed_port: Option<u16>,

    #[arg(long, env = "PARKING_FEED_ENABLED", help = "Connect to the feed at startup (true/false).")]
    pub feed_enabled: Option<bool>,

    #[arg(long, env = "PARKING_REFRESH_INTERVAL_MS", help = "Status board refresh interval in milliseconds.")]
    pub refresh_interval_ms: Option<u64>,

    #[arg(long, env = "PARKING_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[arg(long, env = "PARKING_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[arg(long, env = "PARKING_LOG_LEVEL", help = "Logging level (debug, info, warn, error).")]
    pub log_level: Option<String>,
}

/// Fully resolved configuration, every value present.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub feed: FeedConfig,
    pub feed_enabled: bool,
    pub refresh_interval: Duration,
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            feed_host: other.feed_host.or(self.feed_host),
            feed_port: other.feed_port.or(self.feed_port),
            feed_enabled: other.feed_enabled.or(self.feed_enabled),
            refresh_interval_ms: other.refresh_interval_ms.or(self.refresh_interval_ms),
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
        }
    }

    fn defaults() -> Config {
        let feed = FeedConfig::default();
        Config {
            feed_host: Some(feed.host),
            feed_port: Some(feed.port),
            feed_enabled: Some(true),
            refresh_interval_ms: Some(2000),
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            ..Default::default()
        }
    }

    /// Fills any remaining gaps from the built-in defaults.
    pub fn resolve(self) -> Settings {
        let merged = Config::defaults().merge(self);
        let feed_defaults = FeedConfig::default();
        Settings {
            feed: FeedConfig {
                host: merged.feed_host.unwrap_or(feed_defaults.host),
                port: merged.feed_port.unwrap_or(feed_defaults.port),
            },
            feed_enabled: merged.feed_enabled.unwrap_or(true),
            refresh_interval: Duration::from_millis(merged.refresh_interval_ms.unwrap_or(2000).max(1)),
            log_dir: merged.log_dir.unwrap_or_else(|| PathBuf::from("./logs")),
            log_level: merged.log_level.unwrap_or_else(|| "info".to_string()),
        }
    }
}

/// Reads a JSON config file. Missing or unreadable files yield `None` with a log line.
fn read_config_file(path: &Path) -> Option<Config> {
    if !path.exists() {
        log::info!(
            "Config file not found at {}. Using defaults and environment/CLI variables.",
            path.display()
        );
        return None;
    }
    match fs::read_to_string(path) {
        Ok(config_str) => match serde_json::from_str::<Config>(&config_str) {
            Ok(file_config) => Some(file_config),
            Err(e) => {
                log::warn!("Failed to parse config file {}: {}. Falling back to other sources.", path.display(), e);
                None
            }
        },
        Err(e) => {
            log::warn!("Failed to read config file {}: {}. Falling back to other sources.", path.display(), e);
            None
        }
    }
}

/// Layers defaults, the JSON config file and the already parsed CLI/env values.
pub fn load_config_from(cli_args: Config) -> Config {
    // 1. Load defaults
    let mut current_config = Config::defaults();

    // 2. Load from config file if present. The CLI may point somewhere else.
    let config_file_path = cli_args
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    if let Some(file_config) = read_config_file(&config_file_path) {
        current_config = current_config.merge(file_config);
    }

    // 3. CLI arguments and environment variables win over the file.
    current_config.merge(cli_args)
}

pub fn load_config() -> Config {
    load_config_from(Config::parse())
}
