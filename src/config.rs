use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const EMBEDDED_CONFIG: &str = include_str!("../config/config.toml");

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    pub pokemon: PokemonConfig,
    pub cache: CacheConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PokemonConfig {
    pub api_url: String,
    /// Request timeout in seconds.
    pub timeout: u32,
    pub cache_enabled: bool,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CacheConfig {
    pub r#type: String,
    pub max_size: u32,
    /// Entry lifetime in seconds.
    pub expiration: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    #[serde(default = "default_favorites_key")]
    pub favorites_key: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ServerConfig {
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:3000".to_string(),
        }
    }
}

fn default_page_size() -> u32 {
    20
}

fn default_favorites_key() -> String {
    "pokedex:favorites".to_string()
}

impl Config {
    /// Parses the configuration shipped with the binary.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::parse(EMBEDDED_CONFIG)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Loads from `POKEDEX_CONFIG` when set, falling back to the embedded file.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var_os("POKEDEX_CONFIG") {
            Some(path) => {
                tracing::info!("Loading configuration from {}", Path::new(&path).display());
                Self::from_file(path)
            }
            None => Self::embedded(),
        }
    }
}
