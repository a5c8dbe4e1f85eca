use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File read from the working directory when `--config` is not given.
pub const DEFAULT_SETTINGS_FILE: &str = "synthload.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("toml decode error in {path}: {source}")]
    TomlDecode {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub generate: GenerateSettings,
    pub load: LoadSettings,
    pub extract: ExtractSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateSettings {
    pub count: u64,
    pub seed: u64,
    pub output: PathBuf,
}

impl Default for GenerateSettings {
    fn default() -> Self {
        Self {
            count: 100,
            seed: 42,
            output: PathBuf::from("data/activation_source.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadSettings {
    pub db: PathBuf,
    pub output: PathBuf,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self {
            db: PathBuf::from("data/reference.db"),
            output: PathBuf::from("data/activation_load.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractSettings {
    pub output: PathBuf,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            output: PathBuf::from("data/service_name_counts.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive; `RUST_LOG` wins when set.
    pub level: String,
    /// Append JSON log lines here as well as to stderr.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_path: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_path: None,
        }
    }
}

/// Read settings from `explicit`, or from `synthload.toml` when present.
///
/// An explicit path must exist. The implicit file is optional and its
/// absence yields the defaults.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, SettingsError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = PathBuf::from(DEFAULT_SETTINGS_FILE);
            if !path.exists() {
                return Ok(Settings::default());
            }
            path
        }
    };
    let content = std::fs::read_to_string(&path).map_err(|source| SettingsError::Io {
        path: path.clone(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| SettingsError::TomlDecode { path, source })
}
