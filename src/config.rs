use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cli::Cli;
use crate::error::{Error, Result};

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Config {
    /// None means the platform data dir
    pub database: Option<PathBuf>,
    pub busy_timeout: Duration,
    pub log_level: Option<String>,
    pub verbose: bool,
}

/// Contents of config.toml. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub database: Option<PathBuf>,
    /// humantime duration, e.g. "5s" or "250ms"
    pub busy_timeout: Option<String>,
    pub log_level: Option<String>,
}

/// Get the default config path (~/.config/claimbook/config.toml or platform equivalent)
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "claimbook").map(|dirs| dirs.config_dir().join("config.toml"))
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read a config file. A missing file at the default location is not an error.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => FileConfig::parse(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => Ok(FileConfig::default()),
            Err(e) => Err(Error::Config(format!("cannot read {}: {e}", path.display()))),
        }
    }
}

impl Config {
    /// Defaults, then config file, then command line flags.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path, true)?,
            None => match default_config_path() {
                Some(path) => FileConfig::load(&path, false)?,
                None => FileConfig::default(),
            },
        };
        Config::merge(file, cli.db.clone(), cli.verbose)
    }

    pub fn merge(file: FileConfig, db: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let busy_timeout = match file.busy_timeout.as_deref() {
            Some(s) => humantime::parse_duration(s)
                .map_err(|e| Error::Config(format!("invalid busy_timeout '{s}': {e}")))?,
            None => DEFAULT_BUSY_TIMEOUT,
        };

        Ok(Config {
            database: db.or(file.database),
            busy_timeout,
            log_level: file.log_level,
            verbose,
        })
    }

    pub fn default() -> Self {
        Config {
            database: None,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            log_level: None,
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::merge(FileConfig::parse("").unwrap(), None, false).unwrap();
        assert_eq!(config.busy_timeout, DEFAULT_BUSY_TIMEOUT);
        assert!(config.database.is_none());
    }

    #[test]
    fn file_values_parsed() {
        let file = FileConfig::parse(
            r#"
            database = "/var/lib/claimbook/data.db"
            busy_timeout = "250ms"
            log_level = "debug"
            "#,
        )
        .unwrap();
        let config = Config::merge(file, None, false).unwrap();
        assert_eq!(config.database, Some(PathBuf::from("/var/lib/claimbook/data.db")));
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn command_line_db_wins() {
        let file = FileConfig::parse(r#"database = "/from/file.db""#).unwrap();
        let config = Config::merge(file, Some(PathBuf::from("/from/flag.db")), true).unwrap();
        assert_eq!(config.database, Some(PathBuf::from("/from/flag.db")));
        assert!(config.verbose);
    }

    #[test]
    fn bad_duration_rejected() {
        let file = FileConfig::parse(r#"busy_timeout = "soon""#).unwrap();
        assert!(matches!(Config::merge(file, None, false), Err(Error::Config(_))));
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(FileConfig::parse("colour = true").is_err());
    }

    #[test]
    fn missing_optional_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(FileConfig::load(&path, false).is_ok());
        assert!(FileConfig::load(&path, true).is_err());
    }
}
