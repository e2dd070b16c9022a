//! Atlas verification.
//!
//! Checks a parsed GML atlas for the properties a generated atlas always has:
//! unique nodes with Shadow bandwidth strings, exactly one edge per unordered
//! node pair (self-pairs included), latencies in `(0, max_latency]` and
//! packet loss in `[0, max_packetloss]`. Latencies are compared at the
//! microsecond resolution they are written with.

use std::collections::HashSet;

use crate::config::{DEFAULT_MAX_LATENCY_MS, DEFAULT_MAX_PACKET_LOSS};
use crate::gml::parser::GmlGraph;
use crate::gml::units::{latency_to_us, parse_bandwidth_kib, parse_latency_us};

/// Bounds an atlas was generated with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasLimits {
    pub max_latency: f64,
    pub max_packetloss: f64,
}

impl Default for AtlasLimits {
    fn default() -> Self {
        Self {
            max_latency: DEFAULT_MAX_LATENCY_MS,
            max_packetloss: DEFAULT_MAX_PACKET_LOSS,
        }
    }
}

/// Facts gathered while verifying an atlas
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtlasSummary {
    pub nodes: usize,
    pub edges: usize,
    pub self_loops: usize,
    pub nodes_with_city: usize,
    pub max_latency: f64,
    pub max_packetloss: f64,
}

/// Verify that a parsed atlas is a complete full mesh within the given limits
///
/// # Returns
/// * `Ok(AtlasSummary)` if every check passes
/// * `Err(String)` describing the first violation found
pub fn verify_atlas(graph: &GmlGraph, limits: &AtlasLimits) -> Result<AtlasSummary, String> {
    let mut summary = AtlasSummary {
        nodes: graph.nodes.len(),
        edges: graph.edges.len(),
        ..Default::default()
    };

    let mut node_ids = HashSet::new();
    let mut ips = HashSet::new();
    for node in &graph.nodes {
        if !node_ids.insert(node.id) {
            return Err(format!("Duplicate node ID: {}", node.id));
        }

        let ip = node.get("ip").ok_or_else(|| format!("Node {} has no 'ip' attribute", node.id))?;
        if !ips.insert(ip) {
            return Err(format!("Duplicate node IP: {}", ip));
        }
        if node.get("countrycode").is_none() {
            return Err(format!("Node {} ({}) has no 'countrycode' attribute", node.id, ip));
        }

        for key in ["host_bandwidth_up", "host_bandwidth_down"] {
            let value = node
                .get(key)
                .ok_or_else(|| format!("Node {} ({}) has no '{}' attribute", node.id, ip, key))?;
            if parse_bandwidth_kib(value).is_none() {
                return Err(format!("Node {} ({}) has invalid {} '{}'", node.id, ip, key, value));
            }
        }

        if node.get_parsed::<u32>("citycode").map_err(|e| e.to_string())?.is_some() {
            if node.get("cityname").is_none() {
                return Err(format!("Node {} ({}) has a city code but no city name", node.id, ip));
            }
            summary.nodes_with_city += 1;
        }
    }

    let max_latency_us = latency_to_us(limits.max_latency);
    let mut pairs = HashSet::new();
    for edge in &graph.edges {
        for endpoint in [edge.source, edge.target] {
            if !node_ids.contains(&endpoint) {
                return Err(format!("Edge references non-existent node: {}", endpoint));
            }
        }

        let pair = (edge.source.min(edge.target), edge.source.max(edge.target));
        if !pairs.insert(pair) {
            return Err(format!("Duplicate edge between nodes {} and {}", pair.0, pair.1));
        }
        if edge.source == edge.target {
            summary.self_loops += 1;
        }

        let text = edge
            .get("latency")
            .ok_or_else(|| format!("Edge {} -> {} has no latency", edge.source, edge.target))?;
        let latency_us = parse_latency_us(text)
            .ok_or_else(|| format!("Edge {} -> {} has invalid latency '{}'", edge.source, edge.target, text))?;
        if latency_us == 0 || latency_us > max_latency_us {
            return Err(format!(
                "Edge {} -> {} latency {} is outside (0, {} ms]",
                edge.source, edge.target, text, limits.max_latency
            ));
        }
        let latency = latency_us as f64 / 1000.0;

        let packet_loss = edge
            .get_parsed::<f64>("packet_loss")
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("Edge {} -> {} has no packet loss", edge.source, edge.target))?;
        if !(0.0..=limits.max_packetloss).contains(&packet_loss) {
            return Err(format!(
                "Edge {} -> {} packet loss {} is outside [0, {}]",
                edge.source, edge.target, packet_loss, limits.max_packetloss
            ));
        }

        summary.max_latency = summary.max_latency.max(latency);
        summary.max_packetloss = summary.max_packetloss.max(packet_loss);
    }

    let n = graph.nodes.len();
    let expected = n * (n + 1) / 2;
    if pairs.len() != expected {
        return Err(format!(
            "Atlas is not a full mesh: {} nodes need {} edges (self-loops included), found {}",
            n,
            expected,
            pairs.len()
        ));
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gml::parser::parse_gml_str;

    const NODES: &str = r#"
        node [ id 0 ip "1.1.1.1" countrycode "US" citycode 7 cityname "A" host_bandwidth_up "1 KiB" host_bandwidth_down "2 KiB" ]
        node [ id 1 ip "2.2.2.2" countrycode "DE" host_bandwidth_up "1 KiB" host_bandwidth_down "2 KiB" ]
    "#;

    fn atlas(edges: &str) -> GmlGraph {
        parse_gml_str(&format!("graph [ directed 0 {} {} ]", NODES, edges)).unwrap()
    }

    #[test]
    fn test_complete_atlas_passes() {
        let graph = atlas(
            r#"
            edge [ source 0 target 0 latency "10 ms" packet_loss 0 ]
            edge [ source 0 target 1 latency "300 ms" packet_loss 0.015 ]
            edge [ source 1 target 1 latency "20 ms" packet_loss 0.001 ]
            "#,
        );

        let summary = verify_atlas(&graph, &AtlasLimits::default()).unwrap();
        assert_eq!(summary.nodes, 2);
        assert_eq!(summary.edges, 3);
        assert_eq!(summary.self_loops, 2);
        assert_eq!(summary.nodes_with_city, 1);
        assert_eq!(summary.max_latency, 300.0);
        assert_eq!(summary.max_packetloss, 0.015);
    }

    #[test]
    fn test_missing_edge_fails() {
        let graph = atlas(
            r#"
            edge [ source 0 target 0 latency "10 ms" packet_loss 0 ]
            edge [ source 1 target 0 latency "30 ms" packet_loss 0 ]
            "#,
        );

        let err = verify_atlas(&graph, &AtlasLimits::default()).unwrap_err();
        assert!(err.contains("not a full mesh"));
    }

    #[test]
    fn test_reversed_duplicate_edge_fails() {
        let graph = atlas(
            r#"
            edge [ source 0 target 1 latency "10 ms" packet_loss 0 ]
            edge [ source 1 target 0 latency "10 ms" packet_loss 0 ]
            "#,
        );

        assert!(verify_atlas(&graph, &AtlasLimits::default()).unwrap_err().contains("Duplicate edge"));
    }

    #[test]
    fn test_out_of_bounds_values_fail() {
        let graph = atlas(r#"edge [ source 0 target 1 latency "301 ms" packet_loss 0 ]"#);
        assert!(verify_atlas(&graph, &AtlasLimits::default()).unwrap_err().contains("latency"));

        let graph = atlas(r#"edge [ source 0 target 1 latency "0 ms" packet_loss 0 ]"#);
        assert!(verify_atlas(&graph, &AtlasLimits::default()).is_err());

        let graph = atlas(r#"edge [ source 0 target 1 latency "10 ms" packet_loss 0.02 ]"#);
        assert!(verify_atlas(&graph, &AtlasLimits::default()).unwrap_err().contains("packet loss"));
    }

    #[test]
    fn test_node_checks() {
        let graph = parse_gml_str(r#"graph [ node [ id 0 ip "1.1.1.1" countrycode "US" citycode 3 host_bandwidth_up "1 KiB" host_bandwidth_down "1 KiB" ] ]"#).unwrap();
        assert!(verify_atlas(&graph, &AtlasLimits::default()).unwrap_err().contains("no city name"));

        let graph = parse_gml_str(r#"graph [ node [ id 0 ip "1.1.1.1" countrycode "US" host_bandwidth_up "1 KiB" ] ]"#).unwrap();
        assert!(verify_atlas(&graph, &AtlasLimits::default()).unwrap_err().contains("host_bandwidth_down"));

        let graph = parse_gml_str(
            r#"graph [
                node [ id 0 ip "1.1.1.1" countrycode "US" host_bandwidth_up "1 KiB" host_bandwidth_down "1 KiB" ]
                node [ id 1 ip "1.1.1.1" countrycode "US" host_bandwidth_up "1 KiB" host_bandwidth_down "1 KiB" ]
            ]"#,
        )
        .unwrap();
        assert!(verify_atlas(&graph, &AtlasLimits::default()).unwrap_err().contains("Duplicate node IP"));
    }

    #[test]
    fn test_unitless_values_fail() {
        let graph = atlas(r#"edge [ source 0 target 1 latency 42.5 packet_loss 0 ]"#);
        assert!(verify_atlas(&graph, &AtlasLimits::default()).unwrap_err().contains("invalid latency"));

        let graph = parse_gml_str(
            r#"graph [ node [ id 0 ip "1.1.1.1" countrycode "US" host_bandwidth_up 10 host_bandwidth_down "1 KiB" ] ]"#,
        )
        .unwrap();
        assert!(verify_atlas(&graph, &AtlasLimits::default()).unwrap_err().contains("invalid host_bandwidth_up"));

        let graph = atlas(r#"edge [ source 0 target 1 latency "10 ms" packetloss 0 ]"#);
        assert!(verify_atlas(&graph, &AtlasLimits::default()).unwrap_err().contains("no packet loss"));
    }

    #[test]
    fn test_edge_to_unknown_node_fails() {
        let graph = atlas(r#"edge [ source 0 target 9 latency "10 ms" packet_loss 0 ]"#);
        assert!(verify_atlas(&graph, &AtlasLimits::default()).unwrap_err().contains("non-existent"));
    }
}
