//! GML writer for finished atlases.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;

use crate::gml::units::{format_bandwidth, format_latency};
use crate::topology::{Edge, Node, TopologyGraph};

/// Quote and escape a GML string value
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

fn write_node<W: Write>(w: &mut W, id: usize, node: &Node) -> io::Result<()> {
    writeln!(w, "  node [")?;
    writeln!(w, "    id {}", id)?;
    writeln!(w, "    ip {}", quote(&node.ip))?;
    writeln!(w, "    countrycode {}", quote(&node.country))?;
    if let Some(city) = &node.city {
        writeln!(w, "    citycode {}", city.code)?;
        writeln!(w, "    cityname {}", quote(&city.name))?;
    }
    writeln!(w, "    host_bandwidth_up {}", quote(&format_bandwidth(node.bandwidth_up)))?;
    writeln!(w, "    host_bandwidth_down {}", quote(&format_bandwidth(node.bandwidth_down)))?;
    writeln!(w, "  ]")
}

fn write_edge<W: Write>(w: &mut W, edge: &Edge) -> io::Result<()> {
    writeln!(w, "  edge [")?;
    writeln!(w, "    source {}", edge.source)?;
    writeln!(w, "    target {}", edge.target)?;
    writeln!(w, "    latency {}", quote(&format_latency(edge.latency)))?;
    writeln!(w, "    packet_loss {}", edge.packet_loss)?;
    writeln!(w, "  ]")
}

/// Serialize the atlas as an undirected Shadow GML graph
///
/// Node ids are the graph's dense node indices. Bandwidth and latency are
/// quoted unit strings; packet loss is a bare fraction.
pub fn write_gml<W: Write>(graph: &TopologyGraph, mut w: W) -> io::Result<()> {
    writeln!(w, "graph [")?;
    writeln!(w, "  directed 0")?;
    for (id, node) in graph.nodes().iter().enumerate() {
        write_node(&mut w, id, node)?;
    }
    for edge in graph.edges() {
        write_edge(&mut w, edge)?;
    }
    writeln!(w, "]")?;
    w.flush()
}

/// Write the atlas to a file, or to stdout when no path is given
pub fn write_gml_file(graph: &TopologyGraph, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            info!("Writing graph to {}...", path.display());
            let file = File::create(path)
                .wrap_err_with(|| format!("Failed to create output file '{}'", path.display()))?;
            write_gml(graph, BufWriter::new(file))
                .wrap_err_with(|| format!("Failed to write atlas to '{}'", path.display()))?;
        }
        None => {
            info!("Writing graph to stdout...");
            let stdout = io::stdout();
            write_gml(graph, BufWriter::new(stdout.lock())).wrap_err("Failed to write atlas to stdout")?;
        }
    }
    Ok(())
}
