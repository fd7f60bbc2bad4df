//! Nodes/edges document in the shape graph visualizers (Cytoscape and
//! friends) load directly: `{ "elements": { "nodes": [...], "edges": [...] } }`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use topomap_common::topology::TopologySnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub elements: GraphElements,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphElements {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub data: NodeData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub data: EdgeData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, String>,
}

impl GraphDocument {
    pub fn from_snapshot(snapshot: &TopologySnapshot) -> Self {
        let mut nodes = Vec::with_capacity(snapshot.workloads.len() + snapshot.services.len());

        for w in &snapshot.workloads {
            nodes.push(GraphNode {
                data: NodeData {
                    id: w.id.clone(),
                    label: w.name.clone(),
                    kind: "workload".to_string(),
                    attributes: BTreeMap::from([
                        ("image".to_string(), w.image.clone()),
                        ("state".to_string(), w.state.clone()),
                        ("runtime".to_string(), w.runtime.clone()),
                    ]),
                },
            });
        }

        for s in &snapshot.services {
            nodes.push(GraphNode {
                data: NodeData {
                    id: format!("service:{}", s.name),
                    label: s.name.clone(),
                    kind: "service".to_string(),
                    attributes: BTreeMap::from([
                        ("service_type".to_string(), s.service_type.to_string()),
                        ("workloads".to_string(), s.workloads.len().to_string()),
                    ]),
                },
            });
        }

        let edges = snapshot
            .connections
            .iter()
            .map(|c| GraphEdge {
                data: EdgeData {
                    id: c.id.clone(),
                    source: c.source.id.clone(),
                    target: c.target.id.clone(),
                    attributes: BTreeMap::from([
                        ("protocol".to_string(), c.protocol.clone()),
                        ("port".to_string(), c.port.to_string()),
                        ("status".to_string(), c.status.to_string()),
                    ]),
                },
            })
            .collect();

        Self {
            elements: GraphElements { nodes, edges },
        }
    }
}
