use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which persistence mechanism backs the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    File,
    Sheets,
    Memory,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(BackendKind::File),
            "sheets" => Ok(BackendKind::Sheets),
            "memory" => Ok(BackendKind::Memory),
            other => Err(format!("unknown backend '{}', expected file, sheets or memory", other)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::File => write!(f, "file"),
            BackendKind::Sheets => write!(f, "sheets"),
            BackendKind::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default)]
    pub file: FileConfig,
    #[serde(default)]
    pub sheets: SheetsConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            file: FileConfig::default(),
            sheets: SheetsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    #[serde(default)]
    pub sheet_id: u32,
    /// Environment variable holding the OAuth bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            sheet_name: default_sheet_name(),
            sheet_id: 0,
            token_env: default_token_env(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// How many days ahead a booking may be made. Zero disables the limit.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log file used while the terminal UI owns the screen.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_data_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("agenda"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("appointments.json")
}

fn default_sheet_name() -> String {
    "Sheet1".to_string()
}

fn default_token_env() -> String {
    "AGENDA_SHEETS_TOKEN".to_string()
}

fn default_endpoint() -> String {
    "https://sheets.googleapis.com".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_window_days() -> u32 {
    30
}

impl AppConfig {
    /// Log file for TUI sessions, next to the data file unless configured.
    pub fn log_file(&self) -> PathBuf {
        self.log.file.clone().unwrap_or_else(|| {
            self.store
                .file
                .path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."))
                .join("agenda.log")
        })
    }
}

/// Default config location, `<config dir>/agenda/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("agenda/config.toml"))
}

/// Loads configuration from `path`, or from the default location.
///
/// A missing file yields the defaults; an unreadable or malformed file is
/// an error.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("config file {} does not exist", path.display());
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(AppConfig::default()),
        },
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse_config(content: &str) -> Result<AppConfig> {
    Ok(toml::from_str::<AppConfig>(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.store.backend, BackendKind::File);
        assert_eq!(config.store.sheets.sheet_name, "Sheet1");
        assert_eq!(config.store.sheets.token_env, "AGENDA_SHEETS_TOKEN");
        assert_eq!(config.booking.window_days, 30);
        assert!(config.store.file.path.ends_with("appointments.json"));
    }

    #[test]
    fn test_sheets_config() {
        let config = parse_config(
            r#"
            [store]
            backend = "sheets"

            [store.sheets]
            spreadsheet_id = "1J2h"
            sheet_name = "Hoja 1"
            sheet_id = 3

            [booking]
            window_days = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.store.backend, BackendKind::Sheets);
        assert_eq!(config.store.sheets.spreadsheet_id, "1J2h");
        assert_eq!(config.store.sheets.sheet_name, "Hoja 1");
        assert_eq!(config.store.sheets.sheet_id, 3);
        assert_eq!(config.store.sheets.endpoint, "https://sheets.googleapis.com");
        assert_eq!(config.booking.window_days, 0);
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(parse_config("[store]\nbackend = \"postgres\"\n").is_err());
        assert!("postgres".parse::<BackendKind>().is_err());
        assert_eq!("Sheets".parse::<BackendKind>(), Ok(BackendKind::Sheets));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[store.file]\npath = \"/tmp/citas.json\"\n").unwrap();

        let config = load_config(Some(path.as_path())).unwrap();
        assert_eq!(config.store.file.path, PathBuf::from("/tmp/citas.json"));
        assert_eq!(config.log_file(), PathBuf::from("/tmp/agenda.log"));
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(load_config(Some(dir.path().join("absent.toml").as_path())).is_err());
    }
}
