//! GML serialization of the atlas.
//!
//! Shadow reads network graphs in GML, with link latency and host bandwidth
//! given as quoted unit strings (see `units`). `writer` emits a finished
//! `TopologyGraph`, `parser` reads GML documents back, and `verify` checks
//! that a parsed atlas is a complete, clamped full mesh.

pub mod parser;
pub mod units;
pub mod verify;
pub mod writer;

pub use parser::{parse_gml_file, parse_gml_str, GmlEdge, GmlGraph, GmlNode};
pub use verify::{verify_atlas, AtlasLimits, AtlasSummary};
pub use writer::{write_gml, write_gml_file};
