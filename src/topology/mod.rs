//! Network topology module.
//!
//! This module contains the atlas graph container and the synthesizers that
//! populate it: nodes with bandwidth attributes resolved from the speed
//! profile, and edges with latency and packet loss resolved from the latency
//! sample table.

pub mod types;
pub mod node;
pub mod edge;
pub mod densify;

// Re-export key types and functions for easier access
pub use types::{CityInfo, Edge, Node, TopologyGraph};
pub use node::synthesize_node;
pub use edge::{resolve_latency, synthesize_edge, SynthesisError};
pub use densify::{densify, DensifyStats};
