//! # Atlasgen - Network atlas synthesis for Shadow simulations
//!
//! This library turns two sparse empirical datasets into a complete, weighted
//! network topology that the Shadow network simulator can load:
//!
//! - per-country and per-city bandwidth measurements (the speed profile)
//! - pairwise latency probes between IP endpoints
//!
//! ## Overview
//!
//! Every IP that appears in a probe becomes a node whose bandwidth is looked up
//! by city, then country, then the global average. Probe latencies are pooled
//! at four granularities (IP pair, city pair, country pair, global). The
//! densification step then synthesizes an edge for *every* pair of nodes,
//! including self-pairs, using the most specific granularity that has samples
//! for that pair. Latencies are clamped to a configured maximum and a packet
//! loss value is derived from the selected packet loss model.
//!
//! ## Architecture
//!
//! - `config`: Atlas settings and the packet loss model
//! - `config_loader`: YAML loading and CLI overrides
//! - `input`: Speed profile and latency probe loaders
//! - `latency`: Symmetric multi-granularity latency sample table
//! - `topology`: Node/edge synthesis, the graph container, densification
//! - `gml`: Shadow GML writer, unit strings, parser and atlas verification
//! - `orchestrator`: End-to-end pipeline
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use atlasgen::{config::AtlasConfig, orchestrator};
//!
//! let config = AtlasConfig {
//!     output: Some("atlas.gml".into()),
//!     ..AtlasConfig::default()
//! };
//! let stats = orchestrator::generate_atlas(&config)?;
//! println!("synthesized {} edges", stats.edges);
//! # Ok::<(), color_eyre::eyre::Report>(())
//! ```
//!
//! ## Error Handling
//!
//! Loaders and the pipeline return `color_eyre::Result`. Faults that callers
//! may want to tell apart are typed: `config::ConfigError` for bad settings
//! and `topology::SynthesisError` for corrupt latency samples.

pub mod config;
pub mod config_loader;
pub mod gml;
pub mod input;
pub mod latency;
pub mod orchestrator;
pub mod topology;
