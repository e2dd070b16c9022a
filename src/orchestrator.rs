//! Atlas generation orchestration.
//!
//! Ties the pipeline together: probes stream into an [`AtlasBuilder`], which
//! creates nodes on first sight and records every latency in the sample
//! table. [`AtlasBuilder::finish`] consumes the builder and densifies the
//! graph, so the table can no longer be written once edges are synthesized.

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{debug, info};

use crate::config::{AtlasConfig, EdgeParams};
use crate::gml::write_gml_file;
use crate::input::{load_probes, ProbeRecord, SpeedProfile};
use crate::latency::{Granularity, LatencyTable};
use crate::topology::{densify, synthesize_node, CityInfo, DensifyStats, SynthesisError, TopologyGraph};

/// Accumulates nodes and latency samples from probe records
#[derive(Debug)]
pub struct AtlasBuilder<'a> {
    profile: &'a SpeedProfile,
    graph: TopologyGraph,
    latencies: LatencyTable,
}

impl<'a> AtlasBuilder<'a> {
    pub fn new(profile: &'a SpeedProfile) -> Self {
        Self {
            profile,
            graph: TopologyGraph::new(),
            latencies: LatencyTable::new(),
        }
    }

    /// Add both probe endpoints (if new) and record the probe's latency
    pub fn ingest(&mut self, probe: &ProbeRecord) {
        self.add_node(&probe.src, probe.src_city, &probe.src_country, &probe.src_city_name);
        self.add_node(&probe.dst, probe.dst_city, &probe.dst_country, &probe.dst_city_name);

        self.latencies.record_probe(
            (probe.src.as_str(), probe.dst.as_str()),
            (probe.src_city, probe.dst_city),
            (probe.src_country.as_str(), probe.dst_country.as_str()),
            probe.latency,
        );
    }

    fn add_node(&mut self, ip: &str, city: Option<u32>, country: &str, city_name: &str) {
        if self.graph.contains(ip) {
            return;
        }
        let city = city.map(|code| CityInfo {
            code,
            name: city_name.to_string(),
        });
        let node = synthesize_node(ip, city, country, self.profile);
        debug!(
            "Added node {} ({}) with {} KiB/s up, {} KiB/s down",
            ip, country, node.bandwidth_up, node.bandwidth_down
        );
        self.graph.add_node_if_absent(node);
    }

    pub fn ingest_all<'p, I>(&mut self, probes: I)
    where
        I: IntoIterator<Item = &'p ProbeRecord>,
    {
        for probe in probes {
            self.ingest(probe);
        }
    }

    pub fn graph(&self) -> &TopologyGraph {
        &self.graph
    }

    pub fn latencies(&self) -> &LatencyTable {
        &self.latencies
    }

    /// Densify the accumulated nodes into a full mesh
    pub fn finish(self, params: &EdgeParams) -> Result<(TopologyGraph, DensifyStats), SynthesisError> {
        let Self { mut graph, latencies, .. } = self;

        info!(
            "Ingested {} probes: {} nodes, {} ip pairs, {} city pairs, {} country pairs",
            latencies.sample_count(),
            graph.node_count(),
            latencies.pair_count(Granularity::IpPair),
            latencies.pair_count(Granularity::CityPair),
            latencies.pair_count(Granularity::CountryPair),
        );

        let stats = densify(&mut graph, &latencies, params)?;
        Ok((graph, stats))
    }
}

/// Build an atlas from in-memory inputs
pub fn build_atlas(
    profile: &SpeedProfile,
    probes: &[ProbeRecord],
    params: &EdgeParams,
) -> Result<(TopologyGraph, DensifyStats), SynthesisError> {
    let mut builder = AtlasBuilder::new(profile);
    builder.ingest_all(probes);
    builder.finish(params)
}

/// Run the full pipeline described by the configuration: load inputs, build
/// the atlas and write it as GML
pub fn generate_atlas(config: &AtlasConfig) -> Result<DensifyStats> {
    let profile = SpeedProfile::load(&config.input_bandwidth)?;
    let probes = load_probes(&config.input_latency)?;
    let params = config.edge_params();
    info!(
        "Packet loss model '{}', max latency {} ms, max packet loss {}",
        params.model, params.max_latency, params.max_packetloss
    );

    let (graph, stats) = if config.threads > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()
            .wrap_err("Failed to configure thread pool")?;
        pool.install(|| build_atlas(&profile, &probes, &params))?
    } else {
        build_atlas(&profile, &probes, &params)?
    };

    write_gml_file(&graph, config.output.as_deref())?;
    info!("Atlas complete: {} nodes, {} edges", graph.node_count(), graph.edge_count());

    Ok(stats)
}
