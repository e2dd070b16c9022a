//! Full-mesh densification.
//!
//! Synthesizes one edge for every unordered node pair, self-pairs included,
//! so an atlas over `n` nodes ends up with `n * (n + 1) / 2` edges. Rows of the
//! upper-triangular pair space are spread over the rayon pool; the latency
//! table and node set are only read while edges are synthesized, and rows are
//! merged in index order so the result does not depend on scheduling.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, info};
use rayon::prelude::*;

use crate::config::EdgeParams;
use crate::latency::{Granularity, LatencyTable};
use crate::topology::edge::{synthesize_edge, SynthesisError};
use crate::topology::types::{Edge, TopologyGraph};

/// Number of progress reports over a densification run
const PROGRESS_STEPS: usize = 10;

/// Summary of a densification run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DensifyStats {
    /// Edges synthesized
    pub edges: usize,
    /// Edges per granularity their latency was resolved at
    pub resolved: BTreeMap<Granularity, usize>,
    /// Edges sitting at the `max_latency` clamp
    pub clamped: usize,
}

impl DensifyStats {
    pub fn resolved_at(&self, granularity: Granularity) -> usize {
        self.resolved.get(&granularity).copied().unwrap_or(0)
    }
}

/// Synthesize edges for every node pair in the graph
///
/// Runs on the current rayon pool. Fails on the first pair whose samples
/// resolve to a non-positive mean latency; the graph is left without any of
/// the newly synthesized edges in that case.
pub fn densify(
    graph: &mut TopologyGraph,
    table: &LatencyTable,
    params: &EdgeParams,
) -> Result<DensifyStats, SynthesisError> {
    let nodes = graph.nodes();
    let n = nodes.len();
    let total = graph.complete_edge_count();
    info!("Adding {} total edges over {} nodes...", total, n);

    let completed = AtomicUsize::new(0);

    let rows: Vec<Vec<Edge>> = (0..n)
        .into_par_iter()
        .map(|s_idx| -> Result<Vec<Edge>, SynthesisError> {
            let s = &nodes[s_idx];
            let row = (s_idx..n)
                .map(|d_idx| synthesize_edge(s_idx, s, d_idx, &nodes[d_idx], table, params))
                .collect::<Result<Vec<_>, _>>()?;

            let before = completed.fetch_add(row.len(), Ordering::Relaxed);
            report_progress(before, before + row.len(), total);
            Ok(row)
        })
        .collect::<Result<_, _>>()?;

    let mut stats = DensifyStats::default();
    for edge in rows.into_iter().flatten() {
        *stats.resolved.entry(edge.resolved_at).or_insert(0) += 1;
        if edge.latency >= params.max_latency {
            stats.clamped += 1;
        }
        stats.edges += 1;
        graph.add_edge(edge);
    }

    for (granularity, count) in &stats.resolved {
        info!("{} edges resolved at {} granularity", count, granularity);
    }
    debug!("{} edges clamped to {} ms", stats.clamped, params.max_latency);

    Ok(stats)
}

fn report_progress(before: usize, after: usize, total: usize) {
    if total == 0 {
        return;
    }
    let step_before = before * PROGRESS_STEPS / total;
    let step_after = after * PROGRESS_STEPS / total;
    if step_after > step_before {
        info!("Finished {}/{} edges", after, total);
    }
}
