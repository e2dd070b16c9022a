//! Topology type definitions.
//!
//! Nodes are keyed by IP address and addressed by a dense index assigned in
//! insertion order. Edges are undirected: an edge is stored under its
//! canonical `(min, max)` index pair, so `(s, d)` and `(d, s)` are the same
//! entry and a self-pair `(s, s)` is its own entry.

use std::collections::{BTreeMap, HashMap};

use crate::latency::Granularity;

/// City a node was geolocated to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityInfo {
    /// MaxMind city code
    pub code: u32,
    pub name: String,
}

/// A host in the atlas
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub ip: String,
    pub country: String,
    pub city: Option<CityInfo>,
    /// Upload bandwidth in KiB/s
    pub bandwidth_up: u64,
    /// Download bandwidth in KiB/s
    pub bandwidth_down: u64,
}

impl Node {
    pub fn city_code(&self) -> Option<u32> {
        self.city.as_ref().map(|c| c.code)
    }

    pub fn city_name(&self) -> Option<&str> {
        self.city.as_ref().map(|c| c.name.as_str())
    }
}

/// An undirected link between two nodes (possibly the same node)
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// Smaller node index of the pair
    pub source: usize,
    /// Larger node index of the pair
    pub target: usize,
    /// Milliseconds, in `(0, max_latency]`
    pub latency: f64,
    /// Fraction in `[0, max_packetloss]`
    pub packet_loss: f64,
    /// Granularity the latency was resolved at
    pub resolved_at: Granularity,
}

impl Edge {
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// The atlas graph: every node plus at most one edge per unordered pair
#[derive(Debug, Clone, Default)]
pub struct TopologyGraph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    edges: BTreeMap<(usize, usize), Edge>,
}

impl TopologyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, ip: &str) -> bool {
        self.index.contains_key(ip)
    }

    /// Dense index of the node with this IP
    pub fn node_index(&self, ip: &str) -> Option<usize> {
        self.index.get(ip).copied()
    }

    /// Insert a node unless one with the same IP exists
    ///
    /// Returns the node's index and whether it was newly inserted. An
    /// existing node is never modified.
    pub fn add_node_if_absent(&mut self, node: Node) -> (usize, bool) {
        if let Some(&existing) = self.index.get(&node.ip) {
            return (existing, false);
        }

        let idx = self.nodes.len();
        self.index.insert(node.ip.clone(), idx);
        self.nodes.push(node);
        (idx, true)
    }

    /// Insert an edge under its canonical pair, replacing any previous edge
    /// between the same two nodes
    pub fn add_edge(&mut self, mut edge: Edge) -> Option<Edge> {
        if edge.target < edge.source {
            std::mem::swap(&mut edge.source, &mut edge.target);
        }
        self.edges.insert((edge.source, edge.target), edge)
    }

    /// All nodes in index order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> Option<&Node> {
        self.nodes.get(idx)
    }

    /// All edges ordered by `(source, target)`
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// The edge between two IPs, in either order
    pub fn edge_between(&self, a: &str, b: &str) -> Option<&Edge> {
        let a = self.node_index(a)?;
        let b = self.node_index(b)?;
        self.edges.get(&(a.min(b), a.max(b)))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edge count of a complete graph with self-loops over the current nodes
    pub fn complete_edge_count(&self) -> usize {
        let n = self.nodes.len();
        n * (n + 1) / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(ip: &str) -> Node {
        Node {
            ip: ip.to_string(),
            country: "US".to_string(),
            city: None,
            bandwidth_up: 1,
            bandwidth_down: 2,
        }
    }

    fn edge(source: usize, target: usize, latency: f64) -> Edge {
        Edge {
            source,
            target,
            latency,
            packet_loss: 0.0,
            resolved_at: Granularity::Global,
        }
    }

    #[test]
    fn test_add_node_if_absent() {
        let mut graph = TopologyGraph::new();
        assert_eq!(graph.add_node_if_absent(node("10.0.0.1")), (0, true));
        assert_eq!(graph.add_node_if_absent(node("10.0.0.2")), (1, true));

        let mut changed = node("10.0.0.1");
        changed.bandwidth_up = 999;
        assert_eq!(graph.add_node_if_absent(changed), (0, false));

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.node(0).unwrap().bandwidth_up, 1);
        assert_eq!(graph.node_index("10.0.0.2"), Some(1));
        assert!(!graph.contains("10.0.0.3"));
    }

    #[test]
    fn test_edges_are_undirected() {
        let mut graph = TopologyGraph::new();
        graph.add_node_if_absent(node("10.0.0.1"));
        graph.add_node_if_absent(node("10.0.0.2"));

        assert!(graph.add_edge(edge(1, 0, 10.0)).is_none());
        let replaced = graph.add_edge(edge(0, 1, 20.0)).unwrap();
        assert_eq!(replaced.latency, 10.0);
        assert_eq!((replaced.source, replaced.target), (0, 1));

        graph.add_edge(edge(1, 1, 5.0));
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.edge_between("10.0.0.2", "10.0.0.1").unwrap().latency, 20.0);
        assert!(graph.edge_between("10.0.0.2", "10.0.0.2").unwrap().is_self_loop());
        assert!(graph.edge_between("10.0.0.1", "10.0.0.1").is_none());
    }

    #[test]
    fn test_complete_edge_count() {
        let mut graph = TopologyGraph::new();
        assert_eq!(graph.complete_edge_count(), 0);
        for i in 0..4 {
            graph.add_node_if_absent(node(&format!("10.0.0.{}", i)));
        }
        assert_eq!(graph.complete_edge_count(), 10);
    }
}
