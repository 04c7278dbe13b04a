use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::codec::{DEFAULT_JPEG_QUALITY, DEFAULT_MAX_EDGE_PX};
use crate::schedule::DEFAULT_WATERING_DAYS;
use crate::store::DEFAULT_SLOT_KEY;

pub const DEFAULT_DB_PATH: &str = ".botanica/state.sqlite";
pub const DEFAULT_CONFIG_PATH: &str = ".botanica/config.toml";
pub const DEFAULT_MAX_IMAGES: usize = 3;

/// Effective settings after the TOML file and command-line overrides are merged.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub db_path: PathBuf,
    pub storage: StorageSettings,
    pub codec: CodecSettings,
    pub care: CareSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageSettings {
    pub quota_bytes: Option<u64>,
    pub slot_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecSettings {
    pub max_edge_px: u32,
    pub quality: u8,
    pub max_images: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CareSettings {
    pub default_watering_days: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfigFile {
    storage: StorageSettings,
    codec: CodecSettings,
    care: CareSettings,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            quota_bytes: None,
            slot_key: DEFAULT_SLOT_KEY.to_string(),
        }
    }
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            max_edge_px: DEFAULT_MAX_EDGE_PX,
            quality: DEFAULT_JPEG_QUALITY,
            max_images: DEFAULT_MAX_IMAGES,
        }
    }
}

impl Default for CareSettings {
    fn default() -> Self {
        Self {
            default_watering_days: DEFAULT_WATERING_DAYS,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            storage: StorageSettings::default(),
            codec: CodecSettings::default(),
            care: CareSettings::default(),
        }
    }
}

impl Settings {
    /// Reads `config_path` when it exists; a missing file means defaults.
    pub fn load(config_path: &Path, db_path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(config_path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(ConfigError::Io(err)),
        };
        let mut settings = Self::from_toml(&raw)?;
        settings.db_path = db_path.to_path_buf();
        Ok(settings)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let file: RawConfigFile = toml::from_str(raw)?;
        let settings = Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            storage: file.storage,
            codec: file.codec,
            care: file.care,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.slot_key.trim().is_empty() {
            return Err(ConfigError::Invalid("storage.slot_key must not be empty".into()));
        }
        if self.storage.quota_bytes == Some(0) {
            return Err(ConfigError::Invalid("storage.quota_bytes must be positive".into()));
        }
        if self.codec.max_edge_px == 0 {
            return Err(ConfigError::Invalid("codec.max_edge_px must be positive".into()));
        }
        if !(1..=100).contains(&self.codec.quality) {
            return Err(ConfigError::Invalid(
                "codec.quality must be within 1..=100".into(),
            ));
        }
        if self.codec.max_images == 0 {
            return Err(ConfigError::Invalid("codec.max_images must be positive".into()));
        }
        if self.care.default_watering_days == 0 {
            return Err(ConfigError::Invalid(
                "care.default_watering_days must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "could not read config: {}", err),
            ConfigError::Toml(err) => write!(f, "config is not valid TOML: {}", err),
            ConfigError::Invalid(message) => write!(f, "invalid config: {}", message),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Toml(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        ConfigError::Toml(value)
    }
}
