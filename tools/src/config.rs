use crate::label::LabelOptions;
use log::LevelFilter;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

const CONFIG_FILENAME: &str = "tools.toml";

#[derive(Debug, PartialEq)]
pub struct Config {
    pub log_format: String,
    pub log_level: LevelFilter,
    pub label: LabelSection,
    pub combine: CombineSection,
    pub size: SizeSection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_format: common::logging::DEFAULT_FORMAT.to_string(),
            log_level: LevelFilter::Info,
            label: LabelSection::default(),
            combine: CombineSection::default(),
            size: SizeSection::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LabelSection {
    pub input: PathBuf,
    pub output: PathBuf,
    pub column: String,
    pub value: bool,
    pub row_limit: usize,
}

impl Default for LabelSection {
    fn default() -> Self {
        let options = LabelOptions::default();

        Self {
            input: PathBuf::from("benign_traffic.csv"),
            output: PathBuf::from("benign_traffic_labeled.csv"),
            column: options.column,
            value: options.value,
            row_limit: options.row_limit,
        }
    }
}

impl LabelSection {
    pub fn options(&self) -> LabelOptions {
        LabelOptions {
            column: self.column.clone(),
            value: self.value,
            row_limit: self.row_limit,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CombineSection {
    pub first: PathBuf,
    pub second: PathBuf,
    pub output: PathBuf,
}

impl Default for CombineSection {
    fn default() -> Self {
        Self {
            first: PathBuf::from("benign_traffic_labeled.csv"),
            second: PathBuf::from("malicious_traffic_labeled.csv"),
            output: PathBuf::from("train.csv"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SizeSection {
    // Without the leading dot
    pub extension: String,
}

impl Default for SizeSection {
    fn default() -> Self {
        Self {
            extension: "rs".to_string(),
        }
    }
}

impl Serialize for Config {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Config", 5)?;
        state.serialize_field("log_format", &self.log_format)?;
        state.serialize_field("log_level", &self.log_level.to_string().to_lowercase())?;
        state.serialize_field("label", &self.label)?;
        state.serialize_field("combine", &self.combine)?;
        state.serialize_field("size", &self.size)?;
        state.end()
    }
}

impl Config {
    pub fn from_file() -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(CONFIG_FILENAME);
        if data.is_err() {
            let config = Config::default();
            config.save_to_file()?;
            return Ok(config);
        }

        Self::parse(&data.unwrap_or_default())
    }

    pub fn parse(data: &str) -> Result<Self, ConfigError> {
        let dto: ConfigDto =
            toml::from_str(data).map_err(ConfigError::TomlDeserializationError)?;
        dto.into_config()
    }

    pub fn save_to_file(&self) -> Result<(), ConfigError> {
        let data = toml::to_string(&self).map_err(ConfigError::TomlSerializationError)?;

        std::fs::write(CONFIG_FILENAME, data).map_err(ConfigError::IOError)?;

        Ok(())
    }
}

#[derive(Deserialize)]
struct ConfigDto {
    log_format: String,
    log_level: String,
    #[serde(default)]
    label: LabelSection,
    #[serde(default)]
    combine: CombineSection,
    #[serde(default)]
    size: SizeSection,
}

impl ConfigDto {
    pub fn into_config(self) -> Result<Config, ConfigError> {
        let config = Config {
            log_format: self.log_format,
            log_level: LevelFilter::from_str(&self.log_level)
                .map_err(|_| ConfigError::UnknownLogLevel)?,
            label: self.label,
            combine: self.combine,
            size: self.size,
        };

        Ok(config)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO Error.")]
    IOError(#[from] std::io::Error),

    #[error("TOML Serialization Error.")]
    TomlSerializationError(#[from] toml::ser::Error),

    #[error("TOML Deserialization Error.")]
    TomlDeserializationError(#[from] toml::de::Error),

    #[error("Unknown log level.")]
    UnknownLogLevel,
}

impl ConfigError {
    pub fn additional_info(&self) -> Option<String> {
        match self {
            ConfigError::IOError(err) => Some(err.to_string()),
            ConfigError::TomlSerializationError(err) => Some(err.to_string()),
            ConfigError::TomlDeserializationError(err) => Some(err.to_string()),
            _ => None,
        }
    }
}
