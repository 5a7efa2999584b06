use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(error) => write!(f, "io error: {error}"),
            Self::Parse(error) => write!(f, "parse error: {error}"),
            Self::Invalid(error) => write!(f, "invalid config: {error}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub max_results: u16,
    pub search_engine_url: String,
    pub history_db_path: PathBuf,
    pub config_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let base = stable_app_data_dir();
        Self {
            max_results: 20,
            search_engine_url: "https://duckduckgo.com/?q={q}".to_string(),
            history_db_path: base.join("history.sqlite3"),
            config_path: base.join("config.toml"),
        }
    }
}

/// Data directory shared by config, history, and logs. Overridable for tests
/// and portable installs.
pub fn stable_app_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("KESTREL_DATA_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    std::env::temp_dir().join("kestrel")
}

pub fn validate(cfg: &Config) -> Result<(), String> {
    if cfg.max_results < 5 || cfg.max_results > 100 {
        return Err("max_results out of range".into());
    }

    if cfg.search_engine_url.trim().is_empty() {
        return Err("search_engine_url is required".into());
    }

    if cfg.history_db_path.as_os_str().is_empty() {
        return Err("history_db_path is required".into());
    }

    if cfg.config_path.as_os_str().is_empty() {
        return Err("config_path is required".into());
    }

    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
struct ConfigFile {
    max_results: u16,
    search_engine_url: String,
    history_db_path: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        let defaults = Config::default();
        Self {
            max_results: defaults.max_results,
            search_engine_url: defaults.search_engine_url,
            history_db_path: None,
        }
    }
}

/// Loads config from `path` (default location when `None`). A missing file
/// yields the defaults; a malformed one is an error rather than a silent
/// fallback.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = Config::default();
    if let Some(path) = path {
        config.config_path = path.to_path_buf();
    }

    if !config.config_path.exists() {
        return Ok(config);
    }

    let raw = fs::read_to_string(&config.config_path)?;
    let file: ConfigFile =
        toml::from_str(&raw).map_err(|error| ConfigError::Parse(error.to_string()))?;

    config.max_results = file.max_results;
    config.search_engine_url = file.search_engine_url;
    if let Some(history_db_path) = file.history_db_path {
        config.history_db_path = history_db_path;
    }

    validate(&config).map_err(ConfigError::Invalid)?;
    Ok(config)
}

pub fn save(config: &Config) -> Result<(), ConfigError> {
    validate(config).map_err(ConfigError::Invalid)?;

    let file = ConfigFile {
        max_results: config.max_results,
        search_engine_url: config.search_engine_url.clone(),
        history_db_path: Some(config.history_db_path.clone()),
    };
    let raw = toml::to_string_pretty(&file).map_err(|error| ConfigError::Parse(error.to_string()))?;

    if let Some(parent) = config.config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&config.config_path, raw)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{load, save, validate, Config};

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate(&Config::default()), Ok(()));
    }

    #[test]
    fn rejects_out_of_range_max_results() {
        let mut config = Config::default();
        config.max_results = 2;
        assert!(validate(&config).is_err());
        config.max_results = 500;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn load_of_missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("kestrel-config-missing.toml");
        let config = load(Some(&path)).expect("load should succeed");
        assert_eq!(config.max_results, Config::default().max_results);
        assert_eq!(config.config_path, path);
    }

    #[test]
    fn save_and_reload_round_trip() {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be valid")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("kestrel-config-{unique}.toml"));

        let mut config = Config::default();
        config.config_path = path.clone();
        config.max_results = 42;
        save(&config).expect("save should succeed");

        let loaded = load(Some(&path)).expect("load should succeed");
        assert_eq!(loaded.max_results, 42);

        std::fs::remove_file(path).expect("temp config should be removed");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be valid")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("kestrel-config-bad-{unique}.toml"));
        std::fs::write(&path, "max_results = \"lots\"").expect("write should succeed");

        assert!(load(Some(&path)).is_err());

        std::fs::remove_file(path).expect("temp config should be removed");
    }
}
