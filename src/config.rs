//! Configuration at ~/.pinbook/config.toml.
//!
//! Every field is optional in the file; anything missing falls back to the
//! built-in provider lists and book location.

use crate::location::shortlink::DEFAULT_SHORTENER_DOMAINS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.toml";
const BOOK_FILE: &str = "customers.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Short-link expansion service descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpanderSpec {
    UnshortenMe {
        #[serde(default)]
        endpoint: Option<String>,
    },
    AllOrigins {
        #[serde(default)]
        endpoint: Option<String>,
    },
}

/// Reverse geocoding service descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeocoderSpec {
    Nominatim {
        #[serde(default)]
        endpoint: Option<String>,
    },
    BigDataCloud {
        #[serde(default)]
        endpoint: Option<String>,
    },
}

/// Ordered provider lists plus transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub user_agent: String,
    /// Per-request transport timeout.
    pub timeout_secs: u64,
    pub shortener_domains: Vec<String>,
    pub expanders: Vec<ExpanderSpec>,
    pub geocoders: Vec<GeocoderSpec>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("pinbook/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 10,
            shortener_domains: DEFAULT_SHORTENER_DOMAINS.iter().map(|d| d.to_string()).collect(),
            expanders: vec![
                ExpanderSpec::UnshortenMe { endpoint: None },
                ExpanderSpec::AllOrigins { endpoint: None },
            ],
            geocoders: vec![
                GeocoderSpec::Nominatim { endpoint: None },
                GeocoderSpec::BigDataCloud { endpoint: None },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    /// Customer book file; defaults to ~/.pinbook/customers.json.
    pub path: Option<PathBuf>,
    /// Dialling prefix used in shared messages.
    pub phone_prefix: String,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            path: None,
            phone_prefix: "+91".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub book: BookConfig,
}

impl AppConfig {
    /// Load from `path` if given (must exist), else from the default location
    /// when present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load_from(p),
            None => {
                let p = data_dir().join(CONFIG_FILE);
                if p.exists() {
                    Self::load_from(&p)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn book_path(&self) -> PathBuf {
        self.book
            .path
            .clone()
            .unwrap_or_else(|| data_dir().join(BOOK_FILE))
    }
}

fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".pinbook")
}
