//! Measurement data loaders.
//!
//! This module reads the two empirical inputs of atlas generation: the
//! bandwidth speed profile (JSON) and the pairwise latency probes (CSV).

pub mod probes;
pub mod speed;

pub use probes::{load_probes, read_probes, ProbeRecord};
pub use speed::{mbit_to_kib, Bandwidth, BandwidthSource, SpeedProfile};
