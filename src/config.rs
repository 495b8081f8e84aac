//! Application paths and settings file.
//!
//! Settings live in `repair-board.json` inside the config directory. The file
//! may carry `#` line comments; they are stripped before JSON parsing. Every
//! field has a default, so a partial (or missing) file is fine.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::server::ServerConfig;

pub const SETTINGS_FILE: &str = "repair-board.json";
pub const LOG_FILE: &str = "repair-board.log";

const APP_DIR: &str = "repair-board";
const CONFIG_DIR_ENV: &str = "REPAIR_BOARD_CONFIG_DIR";

/// Configuration for overriding default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI args → ENV var (REPAIR_BOARD_CONFIG_DIR) → None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from));
        Self { config_dir }
    }
}

/// Get path to a configuration file
///
/// Priority:
/// 1. CLI --config-dir argument
/// 2. REPAIR_BOARD_CONFIG_DIR environment variable
/// 3. Local folder IF any config files exist (repair-board.json, repair-board.log)
/// 4. Platform-specific config directory from dirs-next (default)
pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::config_dir).join(name)
}

/// Get path to a data file (logs). Same priority as [`config_file`], ending in
/// the platform data directory.
pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::data_dir).join(name)
}

/// Ensure that configuration and data directories exist
pub fn ensure_dirs(config: &PathConfig) -> Result<()> {
    let config_dir = resolve_dir(config, dirs_next::config_dir);
    let data_dir = resolve_dir(config, dirs_next::data_dir);

    for dir in [&config_dir, &data_dir] {
        if !dir.exists() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
    }
    Ok(())
}

fn has_local_config_files(dir: &Path) -> bool {
    [SETTINGS_FILE, LOG_FILE].iter().any(|f| dir.join(f).exists())
}

fn resolve_dir(config: &PathConfig, platform: fn() -> Option<PathBuf>) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }
    if let Ok(current_dir) = std::env::current_dir()
        && has_local_config_files(&current_dir)
    {
        return current_dir;
    }
    if let Some(dir) = platform() {
        return dir.join(APP_DIR);
    }
    PathBuf::from(".")
}

/// REST server section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub enabled: bool,
    pub bind: String,
    pub port: u16,
    pub workers: usize,
    pub shutdown_grace_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "0.0.0.0".to_string(),
            port: 8080,
            workers: 4,
            shutdown_grace_ms: 2000,
        }
    }
}

impl ServerSettings {
    pub fn to_server_config(&self) -> ServerConfig {
        ServerConfig {
            bind: self.bind.clone(),
            port: self.port,
            workers: self.workers.max(1),
            shutdown_grace: Duration::from_millis(self.shutdown_grace_ms),
        }
    }
}

/// Board display section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Page rotation interval
    pub interval_ms: u64,
    pub items_per_page: usize,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            interval_ms: 4000,
            items_per_page: crate::core::board::DEFAULT_ITEMS_PER_PAGE,
        }
    }
}

/// Logging section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default filter when neither -v nor RUST_LOG is given
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { level: "warn".to_string() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub display: DisplaySettings,
    pub log: LogSettings,
    /// Seed the board with sample records at startup
    pub demo_data: bool,
}

impl Settings {
    /// Load from a file. A missing file yields defaults; an unreadable or
    /// malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Failed to parse settings: {}", path.display()))
    }

    /// Like [`load`](Self::load) but falls back to defaults (with a warning) on error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("{:#}. Using default settings.", e);
            Self::default()
        })
    }

    pub fn parse(text: &str) -> Result<Self> {
        let json = strip_comments(text);
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&json)?)
    }
}

/// Drop everything from a `#` to end of line. `#` inside a JSON string is kept.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let mut in_string = false;
        let mut escaped = false;
        for c in line.chars() {
            if in_string {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    in_string = false;
                }
            } else if c == '"' {
                in_string = true;
            } else if c == '#' {
                break;
            }
            out.push(c);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_with_custom_dir() {
        let config = PathConfig {
            config_dir: Some(PathBuf::from("/custom")),
        };
        assert_eq!(config_file("test.json", &config), PathBuf::from("/custom/test.json"));
        assert_eq!(data_file("board.log", &config), PathBuf::from("/custom/board.log"));
    }

    #[test]
    fn test_cli_dir_beats_env() {
        let config = PathConfig::from_env_and_cli(Some(PathBuf::from("/from-cli")));
        assert_eq!(config.config_dir, Some(PathBuf::from("/from-cli")));
    }

    #[test]
    fn test_ensure_dirs_creates_custom_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("cfg");
        let config = PathConfig { config_dir: Some(dir.clone()) };
        ensure_dirs(&config).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_parse_with_comments_and_partial_sections() {
        let text = r##"
            # kiosk settings
            {
              "server": { "port": 9090 },   # only the port
              "display": { "interval_ms": 1500 },
              "log": { "level": "info#debug" },
              "demo_data": true
            }
        "##;
        let settings = Settings::parse(text).unwrap();
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.server.bind, "0.0.0.0");
        assert!(settings.server.enabled);
        assert_eq!(settings.display.interval_ms, 1500);
        assert_eq!(settings.display.items_per_page, 4);
        assert_eq!(settings.log.level, "info#debug");
        assert!(settings.demo_data);
    }

    #[test]
    fn test_comment_only_file_is_default() {
        assert_eq!(Settings::parse("# nothing here\n\n").unwrap(), Settings::default());
    }

    #[test]
    fn test_load_missing_and_broken_files() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(SETTINGS_FILE);
        assert_eq!(Settings::load(&path).unwrap(), Settings::default());

        std::fs::write(&path, "{ \"server\": ").unwrap();
        assert!(Settings::load(&path).is_err());
        assert_eq!(Settings::load_or_default(&path), Settings::default());
    }

    #[test]
    fn test_server_config_conversion() {
        let settings = ServerSettings {
            workers: 0,
            shutdown_grace_ms: 250,
            ..ServerSettings::default()
        };
        let config = settings.to_server_config();
        assert_eq!(config.workers, 1);
        assert_eq!(config.shutdown_grace, Duration::from_millis(250));
        assert_eq!(config.port, 8080);
    }
}
