use crate::config::{AtlasConfig, PacketLossModel};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{debug, info};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Load and parse configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<AtlasConfig> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open config file '{}'", config_path.display()))?;

    let config: AtlasConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse config file '{}'", config_path.display()))?;

    config.validate()?;

    Ok(config)
}

/// CLI arguments that override YAML settings
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub input_latency: Option<PathBuf>,
    pub input_bandwidth: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub max_latency: Option<f64>,
    pub max_packetloss: Option<f64>,
    pub packetloss_model: Option<PacketLossModel>,
    pub threads: Option<usize>,
}

/// Apply CLI overrides to a configuration
pub fn apply_overrides(config: &mut AtlasConfig, overrides: &ConfigOverrides) -> Result<()> {
    if let Some(path) = &overrides.input_latency {
        config.input_latency = path.clone();
    }
    if let Some(path) = &overrides.input_bandwidth {
        config.input_bandwidth = path.clone();
    }
    if let Some(path) = &overrides.output {
        // "-" keeps the stdout default explicit on the command line
        config.output = if path.as_os_str() == "-" { None } else { Some(path.clone()) };
    }
    if let Some(max_latency) = overrides.max_latency {
        config.max_latency = max_latency;
    }
    if let Some(max_packetloss) = overrides.max_packetloss {
        config.max_packetloss = max_packetloss;
    }
    if let Some(model) = overrides.packetloss_model {
        config.packetloss_model = model;
    }
    if let Some(threads) = overrides.threads {
        config.threads = threads;
    }

    debug!("Effective configuration: {:?}", config);

    // Re-validate after applying overrides
    config.validate()?;

    Ok(())
}

/// Resolve the effective configuration from an optional file plus overrides
pub fn resolve_config(config_path: Option<&Path>, overrides: &ConfigOverrides) -> Result<AtlasConfig> {
    let mut config = match config_path {
        Some(path) => load_config(path)?,
        None => AtlasConfig::default(),
    };

    apply_overrides(&mut config, overrides)?;

    Ok(config)
}
