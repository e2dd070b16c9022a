use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default clamp applied to every synthesized edge latency, in milliseconds
pub const DEFAULT_MAX_LATENCY_MS: f64 = 300.0;

/// Default packet loss assigned at `max_latency` under the linear model
pub const DEFAULT_MAX_PACKET_LOSS: f64 = 0.015;

/// Upper bound for an explicit worker thread count
const MAX_THREADS: usize = 1024;

/// Packet loss models supported by the edge synthesizer
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(try_from = "String", into = "String")]
pub enum PacketLossModel {
    /// Every link has zero packet loss
    #[default]
    Zero,
    /// Loss grows linearly from 0 at 0 ms to `max_packetloss` at `max_latency`
    LinearLatency,
}

impl PacketLossModel {
    /// Name used on the command line and in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::LinearLatency => "linear-latency",
        }
    }

    /// Packet loss for a link with the given (already clamped) latency
    pub fn packet_loss(&self, latency: f64, max_latency: f64, max_packetloss: f64) -> f64 {
        match self {
            Self::Zero => 0.0,
            Self::LinearLatency => latency / max_latency * max_packetloss,
        }
    }
}

impl fmt::Display for PacketLossModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PacketLossModel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zero" => Ok(Self::Zero),
            "linear-latency" => Ok(Self::LinearLatency),
            other => Err(ConfigError::UnknownPacketLossModel(other.to_string())),
        }
    }
}

impl TryFrom<String> for PacketLossModel {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PacketLossModel> for String {
    fn from(model: PacketLossModel) -> Self {
        model.as_str().to_string()
    }
}

/// Atlas generation settings
///
/// Every field has a default, so an empty YAML document is a valid
/// configuration. CLI flags are layered on top by `config_loader`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AtlasConfig {
    /// CSV file with pairwise latency probes
    pub input_latency: PathBuf,
    /// JSON file with per-country and per-city bandwidth
    pub input_bandwidth: PathBuf,
    /// Where to write the GML atlas; stdout when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// Latency clamp in milliseconds
    pub max_latency: f64,
    /// Packet loss assigned to links at `max_latency` (linear model only)
    pub max_packetloss: f64,
    pub packetloss_model: PacketLossModel,
    /// Densification worker threads, 0 lets rayon decide
    pub threads: usize,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            input_latency: PathBuf::from("latency/all-pairs.csv"),
            input_bandwidth: PathBuf::from("bandwidth/speed-data.json"),
            output: None,
            max_latency: DEFAULT_MAX_LATENCY_MS,
            max_packetloss: DEFAULT_MAX_PACKET_LOSS,
            packetloss_model: PacketLossModel::Zero,
            threads: 0,
        }
    }
}

impl AtlasConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_latency > 0.0) || !self.max_latency.is_finite() {
            return Err(ConfigError::InvalidMaxLatency(self.max_latency));
        }

        if !(0.0..=1.0).contains(&self.max_packetloss) {
            return Err(ConfigError::InvalidMaxPacketLoss(self.max_packetloss));
        }

        if self.threads > MAX_THREADS {
            return Err(ConfigError::InvalidThreads {
                threads: self.threads,
                max: MAX_THREADS,
            });
        }

        Ok(())
    }

    /// Edge synthesis parameters derived from this configuration
    pub fn edge_params(&self) -> EdgeParams {
        EdgeParams {
            max_latency: self.max_latency,
            max_packetloss: self.max_packetloss,
            model: self.packetloss_model,
        }
    }
}

/// The subset of the configuration the edge synthesizer needs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeParams {
    pub max_latency: f64,
    pub max_packetloss: f64,
    pub model: PacketLossModel,
}

impl Default for EdgeParams {
    fn default() -> Self {
        AtlasConfig::default().edge_params()
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown packet loss model '{0}' (expected 'zero' or 'linear-latency')")]
    UnknownPacketLossModel(String),
    #[error("max_latency must be a positive number of milliseconds, got {0}")]
    InvalidMaxLatency(f64),
    #[error("max_packetloss must be a fraction in [0, 1], got {0}")]
    InvalidMaxPacketLoss(f64),
    #[error("threads must be at most {max}, got {threads}")]
    InvalidThreads { threads: usize, max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AtlasConfig::default();
        assert_eq!(config.max_latency, 300.0);
        assert_eq!(config.max_packetloss, 0.015);
        assert_eq!(config.packetloss_model, PacketLossModel::Zero);
        assert!(config.output.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_packet_loss_model_names() {
        assert_eq!("zero".parse::<PacketLossModel>().unwrap(), PacketLossModel::Zero);
        assert_eq!(
            "linear-latency".parse::<PacketLossModel>().unwrap(),
            PacketLossModel::LinearLatency
        );
        assert_eq!(PacketLossModel::LinearLatency.to_string(), "linear-latency");

        let err = "quadratic".parse::<PacketLossModel>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPacketLossModel(ref name) if name == "quadratic"));
    }

    #[test]
    fn test_packet_loss_values() {
        assert_eq!(PacketLossModel::Zero.packet_loss(250.0, 300.0, 0.015), 0.0);
        assert_eq!(PacketLossModel::LinearLatency.packet_loss(150.0, 300.0, 0.015), 0.0075);
        assert_eq!(PacketLossModel::LinearLatency.packet_loss(300.0, 300.0, 0.015), 0.015);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AtlasConfig::default();
        config.max_latency = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidMaxLatency(_))));

        config.max_latency = f64::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidMaxLatency(_))));

        let mut config = AtlasConfig::default();
        config.max_packetloss = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidMaxPacketLoss(_))));

        let mut config = AtlasConfig::default();
        config.threads = 100_000;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidThreads { .. })));
    }

    #[test]
    fn test_yaml_roundtrip_of_model() {
        let config: AtlasConfig = serde_yaml::from_str("packetloss_model: linear-latency\nmax_latency: 250\n").unwrap();
        assert_eq!(config.packetloss_model, PacketLossModel::LinearLatency);
        assert_eq!(config.max_latency, 250.0);
        assert_eq!(config.max_packetloss, 0.015);

        let err = serde_yaml::from_str::<AtlasConfig>("packetloss_model: exponential\n").unwrap_err();
        assert!(err.to_string().contains("exponential"));
    }
}
