use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR_PREFIX: &str = "monzo";
const CONFIG_FILE: &str = "config.toml";

const TOKEN_FILE: &str = "token.json";
const TRANSACTIONS_FILE: &str = "transactions.json";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
}

/// Endpoints of the Monzo API. Only overridden for testing against a fake server.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub auth_url: String,
    pub token_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.monzo.com".to_string(),
            auth_url: "https://auth.monzo.com/".to_string(),
            token_url: "https://api.monzo.com/oauth2/token".to_string(),
        }
    }
}

impl Config {
    /// Load the config file, falling back to defaults when it doesn't exist
    pub fn load() -> Result<Self> {
        match Self::xdg_dirs().find_config_file(CONFIG_FILE) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(config_path)?;
        toml::from_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))
    }

    fn xdg_dirs() -> xdg::BaseDirectories {
        xdg::BaseDirectories::with_prefix(CONFIG_DIR_PREFIX)
    }

    /// Get the config file path. Nothing is created.
    pub fn config_file() -> Result<PathBuf> {
        let xdg_dirs = Self::xdg_dirs();
        xdg_dirs
            .get_config_file(CONFIG_FILE)
            .ok_or_else(|| AppError::Config("Failed to determine config directory".to_string()))
    }

    /// Get the default home directory for the token and transaction cache
    pub fn data_dir() -> Result<PathBuf> {
        let xdg = Self::xdg_dirs();
        xdg.get_data_home()
            .ok_or_else(|| AppError::Config("Failed to determine data directory".to_string()))
    }
}

/// Directory holding the persisted token and transaction cache.
#[derive(Debug, Clone)]
pub struct HomeDir {
    root: PathBuf,
}

impl HomeDir {
    /// Use `dir` if given, otherwise the XDG data directory. The directory is created if missing.
    pub fn resolve(dir: Option<PathBuf>) -> Result<Self> {
        let root = match dir {
            Some(dir) => dir,
            None => Config::data_dir()?,
        };

        fs::create_dir_all(&root).map_err(|e| {
            AppError::Config(format!("Failed to create home directory {:?}: {}", root, e))
        })?;

        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn token_file(&self) -> PathBuf {
        self.root.join(TOKEN_FILE)
    }

    pub fn transactions_file(&self) -> PathBuf {
        self.root.join(TRANSACTIONS_FILE)
    }
}
