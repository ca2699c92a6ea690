use crate::attacks::AttackType;
use log::LevelFilter;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

const CONFIG_FILENAME: &str = "config.toml";

const DEFAULT_TARGET_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 100);
const DEFAULT_GATEWAY_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 1);
const DEFAULT_PACKET_COUNT: usize = 10;

#[derive(Debug, PartialEq)]
pub struct Config {
    pub log_format: String,
    pub log_level: LevelFilter,
    pub target_ip: Ipv4Addr,
    pub gateway_ip: Ipv4Addr,
    // OS entropy when absent
    pub seed: Option<u64>,
    // Records stay in memory when absent
    pub output_path: Option<PathBuf>,
    pub attacks: Vec<AttackPlan>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_format: common::logging::DEFAULT_FORMAT.to_string(),
            log_level: LevelFilter::Info,
            target_ip: DEFAULT_TARGET_IP,
            gateway_ip: DEFAULT_GATEWAY_IP,
            seed: None,
            output_path: None,
            attacks: vec![AttackPlan::SynFlood {
                packet_count: DEFAULT_PACKET_COUNT,
            }],
        }
    }
}

impl Serialize for Config {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Config", 7)?;
        state.serialize_field("log_format", &self.log_format)?;
        state.serialize_field("log_level", &self.log_level.to_string().to_lowercase())?;
        state.serialize_field("target_ip", &self.target_ip.to_string())?;
        state.serialize_field("gateway_ip", &self.gateway_ip.to_string())?;
        match &self.seed {
            Some(seed) => state.serialize_field("seed", seed)?,
            None => state.skip_field("seed")?,
        }
        match &self.output_path {
            Some(path) => state.serialize_field("output_path", path)?,
            None => state.skip_field("output_path")?,
        }
        state.serialize_field("attacks", &self.attacks)?;
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
    target_ip: String,
    gateway_ip: String,
    seed: Option<u64>,
    output_path: Option<PathBuf>,
    #[serde(default)]
    attacks: Vec<AttackPlan>,
}

impl ConfigDto {
    pub fn into_config(self) -> Result<Config, ConfigError> {
        let config = Config {
            log_format: self.log_format,
            log_level: LevelFilter::from_str(&self.log_level)
                .map_err(|_| ConfigError::UnknownLogLevel)?,
            target_ip: parse_address(&self.target_ip)?,
            gateway_ip: parse_address(&self.gateway_ip)?,
            seed: self.seed,
            output_path: self.output_path,
            attacks: self.attacks,
        };

        Ok(config)
    }
}

fn parse_address(address: &str) -> Result<Ipv4Addr, ConfigError> {
    Ipv4Addr::from_str(address.trim())
        .map_err(|_| ConfigError::WrongAddress(address.to_string()))
}

/// One generator invocation, in the order the plans are listed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttackPlan {
    SynFlood { packet_count: usize },
    IpSpoofing { packet_count: usize },
    MalformedPackets { packet_count: usize },
    DnsAmplification { packet_count: usize },
    IcmpFlood { packet_count: usize },
    HttpFlood { packet_count: usize },
    TcpFinScan { start_port: u16, end_port: u16 },
    FragmentationAttack { packet_count: usize },
    ArpPoisoning { packet_count: usize },
}

impl AttackPlan {
    pub fn attack_type(&self) -> AttackType {
        match self {
            Self::SynFlood { .. } => AttackType::SynFlood,
            Self::IpSpoofing { .. } => AttackType::IpSpoofing,
            Self::MalformedPackets { .. } => AttackType::MalformedPacket,
            Self::DnsAmplification { .. } => AttackType::DnsAmplification,
            Self::IcmpFlood { .. } => AttackType::IcmpFlood,
            Self::HttpFlood { .. } => AttackType::HttpFlood,
            Self::TcpFinScan { .. } => AttackType::TcpFinScan,
            Self::FragmentationAttack { .. } => AttackType::FragmentationAttack,
            Self::ArpPoisoning { .. } => AttackType::ArpPoisoning,
        }
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

    #[error("Wrong IPv4 address.")]
    WrongAddress(String),
}

impl ConfigError {
    pub fn additional_info(&self) -> Option<String> {
        match self {
            ConfigError::IOError(err) => Some(err.to_string()),
            ConfigError::TomlSerializationError(err) => Some(err.to_string()),
            ConfigError::TomlDeserializationError(err) => Some(err.to_string()),
            ConfigError::WrongAddress(address) => Some(format!("Address: {address}")),
            _ => None,
        }
    }
}
