//! Application configuration.
//!
//! Loaded from `config.toml` under the platform config directory when
//! present, otherwise defaulted; `CAMPUS_SERVER_URL` and `CAMPUS_DATA_DIR`
//! override either source.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_SERVER_URL: &str = "https://connect.example.edu/api/v1";
const SERVER_URL_ENV: &str = "CAMPUS_SERVER_URL";
const DATA_DIR_ENV: &str = "CAMPUS_DATA_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the campus API.
    pub server_url: String,
    /// Directory holding local state (the preference database).
    pub data_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            data_dir: default_data_dir(),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "campus-connect")
}

fn default_data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

impl AppConfig {
    /// Config file if one exists, defaults otherwise, env on top.
    pub fn load() -> Result<Self> {
        let mut config = match project_dirs().map(|dirs| dirs.config_dir().join("config.toml")) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("invalid config at {}", path.display()))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            if !url.is_empty() {
                self.server_url = url;
            }
        }
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.is_empty() {
                self.data_dir = PathBuf::from(dir);
            }
        }
    }

    /// Where the preference database lives.
    pub fn prefs_db_path(&self) -> PathBuf {
        self.data_dir.join("prefs.db")
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_populated() {
        let config = AppConfig::default();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert!(config.prefs_db_path().ends_with("prefs.db"));
    }

    #[test]
    fn from_file_reads_partial_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "server_url = \"https://campus.example.edu/api/v2\"\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.server_url, "https://campus.example.edu/api/v2");
        // Unspecified fields keep their defaults.
        assert_eq!(config.data_dir, AppConfig::default().data_dir);
    }

    #[test]
    fn from_file_rejects_bad_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "server_url = [not toml").unwrap();

        assert!(AppConfig::from_file(&path).is_err());
    }

    #[test]
    fn prefs_db_lives_under_data_dir() {
        let config = AppConfig {
            server_url: DEFAULT_SERVER_URL.to_string(),
            data_dir: PathBuf::from("/tmp/state"),
        };
        assert_eq!(config.prefs_db_path(), PathBuf::from("/tmp/state/prefs.db"));
    }
}
