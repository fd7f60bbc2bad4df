use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use topomap_common::config::AnalyzerConfig;
use topomap_common::inventory::Inventory;
use topomap_common::topology::ConnectionStatus;
use topomap_core::TopologyAnalyzer;

use crate::support::{network, workload, CountingInventory};

/// Both workloads live on loopback; only the listener's port answers.
#[tokio::test]
async fn tcp_probes_classify_open_and_closed_ports() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let open_port = listener.local_addr().unwrap().port();
    let closed = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let closed_port = closed.local_addr().unwrap().port();
    drop(closed);

    let lo = network("loopback", "lo", "bridge");
    let inventory = Inventory {
        workloads: vec![
            workload("client", "app_client_1").attach(&lo, "127.0.0.1").build(),
            workload("server", "app_server_1")
                .attach(&lo, "127.0.0.1")
                .port(open_port)
                .port(closed_port)
                .build(),
        ],
        networks: vec![lo],
    };
    let config = AnalyzerConfig::default().with_probe_timeout(Duration::from_secs(1));
    let analyzer = TopologyAnalyzer::new(Arc::new(CountingInventory::new(inventory)), config);

    let snapshot = analyzer.snapshot(&CancellationToken::new()).await.unwrap();

    let status_of = |port: u16| {
        snapshot
            .connections
            .iter()
            .find(|c| c.port == port)
            .map(|c| c.status)
    };
    assert_eq!(status_of(open_port), Some(ConnectionStatus::Active));
    assert_eq!(status_of(closed_port), Some(ConnectionStatus::Failed));
    assert_eq!(snapshot.analysis_metrics.connection_tests, 2);
    assert_eq!(snapshot.analysis_metrics.successful_tests, 1);
    assert_eq!(snapshot.analysis_metrics.failed_tests, 1);
}

#[tokio::test]
async fn disabled_probing_reports_unknown_edges() {
    let lo = network("loopback", "lo", "bridge");
    let inventory = Inventory {
        workloads: vec![
            workload("client", "app_client_1").attach(&lo, "127.0.0.1").build(),
            workload("server", "app_server_1").attach(&lo, "127.0.0.1").port(1).build(),
        ],
        networks: vec![lo],
    };
    let config = AnalyzerConfig::default().with_probing(false);
    let analyzer = TopologyAnalyzer::new(Arc::new(CountingInventory::new(inventory)), config);

    let snapshot = analyzer.snapshot(&CancellationToken::new()).await.unwrap();

    assert_eq!(snapshot.connections.len(), 1);
    assert_eq!(snapshot.connections[0].status, ConnectionStatus::Unknown);
    assert_eq!(snapshot.analysis_metrics.unknown_tests, 1);
}
