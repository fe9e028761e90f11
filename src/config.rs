//! Configuration loading.
//!
//! The configuration file is a JSON (or YAML) object:
//!
//! ```json
//! {
//!     "database": "/home/me/.local/share/captainlog.db",
//!     "database_dev": "/tmp/captainlog-dev.db",
//!     "web_port": 8080,
//!     "web_root": "/usr/share/captainlog/www",
//!     "projects": ["Admin", "Support"]
//! }
//! ```

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application name, used for the default configuration file name.
pub const APP_NAME: &str = "captainlog";

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "CAPTAINLOG_CONFIG_PATH";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite database file.
    #[serde(default)]
    pub database: Option<String>,

    /// Database used by debug builds, when set.
    #[serde(default)]
    pub database_dev: Option<String>,

    /// Port of the web front-end.
    #[serde(default)]
    pub web_port: Option<u16>,

    /// Directory holding the web front-end's static files.
    #[serde(default)]
    pub web_root: Option<PathBuf>,

    /// Favourite projects offered by the interactive entry.
    #[serde(default)]
    pub projects: Vec<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            bail!("{} not found", path.display());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Parse configuration text. JSON is accepted as a subset of YAML.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// `$HOME/.config/captainlog.conf`, or `captainlog-dev.conf` for debug builds.
    pub fn default_path(debug: bool) -> Option<PathBuf> {
        let name = if debug {
            format!("{}-dev.conf", APP_NAME)
        } else {
            format!("{}.conf", APP_NAME)
        };
        dirs::home_dir().map(|home| home.join(".config").join(name))
    }

    /// Pick the configuration file: the command-line flag, then the
    /// environment, then the default location.
    pub fn resolve_path(flag: Option<&Path>, debug: bool) -> Result<PathBuf> {
        if let Some(path) = flag {
            return Ok(path.to_path_buf());
        }
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV)
            && !path.is_empty()
        {
            return Ok(PathBuf::from(path));
        }
        Self::default_path(debug).ok_or_else(|| anyhow!("Cannot locate the home directory"))
    }

    /// Database path for this build type.
    pub fn database_path(&self, debug: bool) -> Result<String> {
        if debug
            && let Some(path) = self.database_dev.as_ref().filter(|p| !p.is_empty())
        {
            return Ok(path.clone());
        }
        self.database
            .clone()
            .ok_or_else(|| anyhow!("Invalid configuration: no 'database' entry found"))
    }

    pub fn web_port(&self) -> Result<u16> {
        self.web_port
            .ok_or_else(|| anyhow!("Port not configured ('web_port')"))
    }

    pub fn web_root(&self) -> Result<&Path> {
        self.web_root
            .as_deref()
            .ok_or_else(|| anyhow!("Web root directory not configured ('web_root')"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_configuration() {
        let config = Config::parse(
            r#"{
                "database": "/tmp/log.db",
                "web_port": 8080,
                "web_root": "/srv/www",
                "projects": ["Admin", "Support"]
            }"#,
        )
        .unwrap();
        assert_eq!(config.database.as_deref(), Some("/tmp/log.db"));
        assert_eq!(config.web_port().unwrap(), 8080);
        assert_eq!(config.web_root().unwrap(), Path::new("/srv/www"));
        assert_eq!(config.projects, vec!["Admin", "Support"]);
    }

    #[test]
    fn optional_keys_default() {
        let config = Config::parse(r#"{"database": ""}"#).unwrap();
        assert!(config.projects.is_empty());
        assert_eq!(
            config.web_port().unwrap_err().to_string(),
            "Port not configured ('web_port')"
        );
        assert_eq!(
            config.web_root().unwrap_err().to_string(),
            "Web root directory not configured ('web_root')"
        );
    }

    #[test]
    fn database_path_prefers_dev_entry_in_debug() {
        let config = Config {
            database: Some("prod.db".into()),
            database_dev: Some("dev.db".into()),
            ..Default::default()
        };
        assert_eq!(config.database_path(true).unwrap(), "dev.db");
        assert_eq!(config.database_path(false).unwrap(), "prod.db");

        let config = Config {
            database: Some("prod.db".into()),
            database_dev: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(config.database_path(true).unwrap(), "prod.db");
    }

    #[test]
    fn missing_database_is_an_error() {
        let err = Config::default().database_path(false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: no 'database' entry found"
        );
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.conf");
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().ends_with("not found"));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("captainlog.conf");
        std::fs::write(&path, r#"{"database": "x.db", "projects": []}"#).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.database_path(false).unwrap(), "x.db");
    }

    #[test]
    fn flag_wins_over_default_path() {
        let path = Config::resolve_path(Some(Path::new("/etc/custom.conf")), false).unwrap();
        assert_eq!(path, PathBuf::from("/etc/custom.conf"));
    }

    #[test]
    fn default_path_name_depends_on_build_type() {
        if let Some(path) = Config::default_path(true) {
            assert!(path.ends_with(".config/captainlog-dev.conf"));
        }
        if let Some(path) = Config::default_path(false) {
            assert!(path.ends_with(".config/captainlog.conf"));
        }
    }
}
