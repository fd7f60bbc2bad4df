//! # Exporter
//!
//! Renders a snapshot as JSON, as a Graphviz DOT digraph, or as a
//! nodes/edges document for graph visualizers. Each format has its own
//! explicit view type; nothing is built from untyped maps.

mod dot;
mod graph;

use std::fmt;
use std::str::FromStr;

use topomap_common::topology::TopologySnapshot;
use topomap_common::{TopologyError, TopologyResult};
use tracing::debug;

pub use graph::{EdgeData, GraphDocument, GraphEdge, GraphElements, GraphNode, NodeData};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Dot,
    Graph,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [Self::Json, Self::Dot, Self::Graph];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Dot => "dot",
            Self::Graph => "cytoscape",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "dot" | "graphviz" => Ok(Self::Dot),
            "cytoscape" | "graph" | "node-edge" => Ok(Self::Graph),
            _ => Err(TopologyError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Parses `format` and renders the snapshot. An unknown format is rejected
/// before anything is rendered.
pub fn export(snapshot: &TopologySnapshot, format: &str) -> TopologyResult<Vec<u8>> {
    let format: ExportFormat = format.parse()?;
    render(snapshot, format)
}

pub fn render(snapshot: &TopologySnapshot, format: ExportFormat) -> TopologyResult<Vec<u8>> {
    let bytes = match format {
        ExportFormat::Json => serde_json::to_vec_pretty(snapshot)?,
        ExportFormat::Dot => dot::render(snapshot).into_bytes(),
        ExportFormat::Graph => serde_json::to_vec_pretty(&GraphDocument::from_snapshot(snapshot))?,
    };
    debug!("Rendered {} export ({} bytes)", format, bytes.len());
    Ok(bytes)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
