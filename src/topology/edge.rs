//! Edge synthesis.
//!
//! The latency of a node pair is the mean of the samples at the first
//! granularity that has any for the pair, checked in the order IP pair,
//! city pair (only when both nodes have a city), country pair, global.

use crate::config::EdgeParams;
use crate::latency::{mean, Granularity, LatencyTable, SamplePair};
use crate::topology::types::{Edge, Node};

/// Errors raised while synthesizing edges
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SynthesisError {
    /// A resolved mean latency was not strictly positive; the probe data is corrupt
    #[error("Invalid latency sample between {src} and {dst}: {granularity} mean is {mean} ms (must be > 0)")]
    InvalidLatencySample {
        src: String,
        dst: String,
        granularity: Granularity,
        mean: f64,
    },
    #[error("No latency samples recorded; the global latency bucket is empty")]
    EmptyGlobalBucket,
}

/// Resolve the representative latency between two nodes
///
/// Returns the unclamped mean and the granularity it came from. The result
/// is the same for `(s, d)` and `(d, s)`.
pub fn resolve_latency(
    s: &Node,
    d: &Node,
    table: &LatencyTable,
) -> Result<(f64, Granularity), SynthesisError> {
    let city_pair = match (s.city_code(), d.city_code()) {
        (Some(a), Some(b)) => Some(SamplePair::City(a, b)),
        _ => None,
    };

    let candidates = [
        Some(SamplePair::Ip(&s.ip, &d.ip)),
        city_pair,
        Some(SamplePair::Country(&s.country, &d.country)),
        Some(SamplePair::Global),
    ];

    let (samples, granularity) = candidates
        .into_iter()
        .flatten()
        .find_map(|pair| table.lookup(pair).map(|samples| (samples, pair.granularity())))
        .ok_or(SynthesisError::EmptyGlobalBucket)?;

    let latency = mean(samples);
    // also rejects NaN
    if !(latency > 0.0) {
        return Err(SynthesisError::InvalidLatencySample {
            src: s.ip.clone(),
            dst: d.ip.clone(),
            granularity,
            mean: latency,
        });
    }

    Ok((latency, granularity))
}

/// Synthesize the edge between the nodes at indices `s_idx` and `d_idx`
pub fn synthesize_edge(
    s_idx: usize,
    s: &Node,
    d_idx: usize,
    d: &Node,
    table: &LatencyTable,
    params: &EdgeParams,
) -> Result<Edge, SynthesisError> {
    let (latency, resolved_at) = resolve_latency(s, d, table)?;
    let latency = latency.min(params.max_latency);
    let packet_loss = params
        .model
        .packet_loss(latency, params.max_latency, params.max_packetloss);

    Ok(Edge {
        source: s_idx.min(d_idx),
        target: s_idx.max(d_idx),
        latency,
        packet_loss,
        resolved_at,
    })
}
