use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use topomap_common::inventory::Inventory;
use topomap_common::topology::TopologySnapshot;
use topomap_common::TopologyError;
use topomap_core::export::{export, GraphDocument};

use crate::support::{analyzer, network, workload, CountingInventory};

async fn snapshot() -> Arc<TopologySnapshot> {
    let backend = network("4f1c9a7be2d35e6f0a11", "backend", "bridge");
    let inventory = Inventory {
        workloads: vec![
            workload("a1b2c3d4e5f6a7b8c9d0", "shop_web_1")
                .image("nginx:1.27")
                .attach(&backend, "172.21.0.2")
                .port(80)
                .build(),
            workload("0f9e8d7c6b5a4f3e2d1c", "shop_api_1")
                .attach(&backend, "172.21.0.3")
                .port(8080)
                .build(),
            workload("99887766554433221100", "shop_db_1")
                .image("postgres:16")
                .attach(&backend, "172.21.0.4")
                .port(5432)
                .build(),
        ],
        networks: vec![backend],
    };
    analyzer(Arc::new(CountingInventory::new(inventory)))
        .snapshot(&CancellationToken::new())
        .await
        .unwrap()
}

#[tokio::test]
async fn json_export_round_trips_collections() {
    let snapshot = snapshot().await;

    let bytes = export(&snapshot, "json").unwrap();
    let back: TopologySnapshot = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(back.networks, snapshot.networks);
    assert_eq!(back.workloads, snapshot.workloads);
    assert_eq!(back.services, snapshot.services);
    assert_eq!(back.dependencies, snapshot.dependencies);
    assert_eq!(back.clusters, snapshot.clusters);
    assert_eq!(back.connections.len(), snapshot.connections.len());
    for (a, b) in back.connections.iter().zip(&snapshot.connections) {
        assert_eq!((&a.id, a.status, a.port), (&b.id, b.status, b.port));
    }
}

#[tokio::test]
async fn dot_export_has_one_line_per_node_and_edge() {
    let snapshot = snapshot().await;

    let dot = String::from_utf8(export(&snapshot, "dot").unwrap()).unwrap();
    let node_lines = dot
        .lines()
        .filter(|l| l.contains("[label=") && !l.contains("->"))
        .count();
    let edge_lines = dot.lines().filter(|l| l.contains("->")).count();

    assert!(dot.starts_with("digraph NetworkTopology {"));
    assert_eq!(node_lines, snapshot.workloads.len() + snapshot.services.len());
    assert_eq!(edge_lines, snapshot.connections.len());
    assert!(dot.contains("\"a1b2c3d4e5f6\" [label=\"shop_web_1\\nnginx:1.27\"]"));
    assert!(dot.contains("[label=\"tcp:5432\"]"));
}

#[tokio::test]
async fn graph_export_carries_flat_attributes() {
    let snapshot = snapshot().await;

    let bytes = export(&snapshot, "cytoscape").unwrap();
    let doc: GraphDocument = serde_json::from_slice(&bytes).unwrap();
    let raw: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(doc.elements.nodes.len(), snapshot.workloads.len() + snapshot.services.len());
    assert_eq!(doc.elements.edges.len(), snapshot.connections.len());
    let first_node = &raw["elements"]["nodes"][0]["data"];
    assert_eq!(first_node["type"], "workload");
    assert_eq!(first_node["image"], "nginx:1.27");
    let first_edge = &raw["elements"]["edges"][0]["data"];
    assert_eq!(first_edge["protocol"], "tcp");
}

#[tokio::test]
async fn unsupported_format_is_a_validation_error() {
    let snapshot = snapshot().await;

    let err = export(&snapshot, "svg").unwrap_err();

    assert!(matches!(err, TopologyError::UnsupportedFormat(_)));
}
