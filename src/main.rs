use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use atlasgen::config::PacketLossModel;
use atlasgen::config_loader::{resolve_config, ConfigOverrides};
use atlasgen::gml::{parse_gml_file, verify_atlas, AtlasLimits};
use atlasgen::orchestrator::generate_atlas;

/// Synthesize a fully connected Shadow network atlas from latency probes and bandwidth data
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional YAML configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Latency probes CSV
    #[arg(long)]
    input_latency: Option<PathBuf>,

    /// Speed profile JSON
    #[arg(long)]
    input_bandwidth: Option<PathBuf>,

    /// Where to write the GML atlas ("-" for stdout, the default)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Clamp synthesized latencies to this many milliseconds [default: 300]
    #[arg(long)]
    max_latency: Option<f64>,

    /// Packet loss at max latency under the linear-latency model [default: 0.015]
    #[arg(long)]
    max_packetloss: Option<f64>,

    /// Packet loss model: zero or linear-latency [default: zero]
    #[arg(long)]
    packetloss_model: Option<PacketLossModel>,

    /// Worker threads for edge synthesis (0 = one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Verify an existing GML atlas instead of generating one
    #[arg(long, conflicts_with_all = ["input_latency", "input_bandwidth", "output"])]
    verify: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            input_latency: self.input_latency.clone(),
            input_bandwidth: self.input_bandwidth.clone(),
            output: self.output.clone(),
            max_latency: self.max_latency,
            max_packetloss: self.max_packetloss,
            packetloss_model: self.packetloss_model,
            threads: self.threads,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(&args.log_level)).init();

    // Configuration faults surface here, before any input is read
    let config = resolve_config(args.config.as_deref(), &args.overrides())?;

    if let Some(atlas_path) = &args.verify {
        info!("Verifying atlas {:?}", atlas_path);
        let graph = parse_gml_file(atlas_path)?;
        let limits = AtlasLimits {
            max_latency: config.max_latency,
            max_packetloss: config.max_packetloss,
        };
        let summary = verify_atlas(&graph, &limits).map_err(|e| eyre!("Atlas verification failed: {}", e))?;
        info!(
            "Atlas OK: {} nodes ({} with city), {} edges ({} self-loops), max latency {} ms, max packet loss {}",
            summary.nodes,
            summary.nodes_with_city,
            summary.edges,
            summary.self_loops,
            summary.max_latency,
            summary.max_packetloss
        );
        return Ok(());
    }

    info!("Latency probes: {:?}", config.input_latency);
    info!("Speed profile: {:?}", config.input_bandwidth);

    let stats = generate_atlas(&config)?;

    info!("Atlas generation completed: {} edges synthesized", stats.edges);
    Ok(())
}
