use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use topomap_common::inventory::Inventory;
use topomap_common::topology::{ClusterType, HealthImpactLevel, NameSource, ServiceType, TopologySnapshot};

use crate::support::{analyzer, network, workload, CountingInventory};

async fn analyze(inventory: Inventory) -> Arc<TopologySnapshot> {
    analyzer(Arc::new(CountingInventory::new(inventory)))
        .snapshot(&CancellationToken::new())
        .await
        .unwrap()
}

#[tokio::test]
async fn database_on_shared_bridge_is_a_critical_required_dependency() {
    let backend = network("9b1e4c0d2a7f55e1", "backend", "bridge");
    let inventory = Inventory {
        workloads: vec![
            workload("api0000000000001", "shop_api_1").attach(&backend, "172.20.0.2").build(),
            workload("db00000000000001", "shop_db_1")
                .attach(&backend, "172.20.0.3")
                .port(5432)
                .build(),
        ],
        networks: vec![backend],
    };

    let snapshot = analyze(inventory).await;

    assert_eq!(snapshot.dependencies.len(), 1);
    let dep = &snapshot.dependencies[0];
    assert_eq!(dep.source_service, "api");
    assert_eq!(dep.target_service, "db");
    assert!(dep.required);
    assert_eq!(dep.health_impact, HealthImpactLevel::Critical);
    assert_eq!(dep.ports, [5432]);
}

#[tokio::test]
async fn deployment_group_without_shared_network_forms_one_project_cluster() {
    let inventory = Inventory {
        networks: Vec::new(),
        workloads: vec![
            workload("w1", "one").label("com.docker.compose.project", "shop").build(),
            workload("w2", "two").label("com.docker.compose.project", "shop").build(),
            workload("w3", "three").label("com.docker.compose.project", "shop").build(),
        ],
    };

    let snapshot = analyze(inventory).await;

    assert_eq!(snapshot.clusters_of_type(ClusterType::DeploymentProject).len(), 1);
    assert_eq!(snapshot.clusters[0].members.len(), 3);
    assert!(snapshot.clusters_of_type(ClusterType::NetworkScoped).is_empty());
}

#[tokio::test]
async fn bare_workload_joins_nothing() {
    let inventory = Inventory {
        networks: Vec::new(),
        workloads: vec![workload("lonely", "lonely").build()],
    };

    let snapshot = analyze(inventory).await;

    assert!(snapshot.workload("lonely").is_some());
    assert!(snapshot.services.is_empty());
    assert!(snapshot.clusters.is_empty());
    assert!(snapshot.connections.is_empty());
}

#[tokio::test]
async fn workloads_on_different_networks_are_never_connected() {
    let front = network("front", "front", "bridge");
    let back = network("back", "back", "bridge");
    let inventory = Inventory {
        workloads: vec![
            workload("w1", "shop_web_1").attach(&front, "10.1.0.2").port(80).build(),
            workload("w2", "shop_db_1").attach(&back, "10.2.0.2").port(5432).build(),
        ],
        networks: vec![front, back],
    };

    let snapshot = analyze(inventory).await;

    assert!(snapshot.connections.is_empty());
    assert!(snapshot.dependencies.is_empty());
    assert!(snapshot.clusters.is_empty());
}

#[tokio::test]
async fn explicit_labels_beat_image_and_name_heuristics() {
    let inventory = Inventory {
        networks: Vec::new(),
        workloads: vec![
            workload("w1", "shop_cache_1")
                .image("redis:7")
                .label("service.name", "sessions")
                .label("service.type", "api")
                .build(),
            workload("w2", "shop_cache_2").image("redis:7").build(),
        ],
    };

    let snapshot = analyze(inventory).await;

    let sessions = snapshot.service("sessions").unwrap();
    assert_eq!(sessions.service_type, ServiceType::Api);
    assert_eq!(sessions.name_source, NameSource::ServiceLabel);

    let cache = snapshot.service("cache").unwrap();
    assert_eq!(cache.service_type, ServiceType::Cache);
    assert_eq!(cache.name_source, NameSource::NameHeuristic);
    assert_eq!(snapshot.services_of_type(ServiceType::Cache).len(), 1);
}

#[tokio::test]
async fn single_member_groupings_never_become_clusters() {
    let solo = network("solo", "solo", "bridge");
    let inventory = Inventory {
        workloads: vec![
            workload("w1", "a").attach(&solo, "10.3.0.2").label("com.docker.compose.project", "p1").build(),
            workload("w2", "b").label("com.docker.compose.project", "p2").build(),
        ],
        networks: vec![solo],
    };

    let snapshot = analyze(inventory).await;

    assert!(snapshot.clusters.is_empty());
    assert!(snapshot.clusters.iter().all(|c| c.members.len() >= 2));
}

#[tokio::test]
async fn reanalysis_of_unchanged_inventory_is_identical() {
    let backend = network("net-backend-0001", "backend", "overlay");
    let inventory = Inventory {
        workloads: vec![
            workload("w1", "shop_api_1")
                .attach(&backend, "10.0.9.2")
                .label("com.docker.compose.project", "shop")
                .port(8080)
                .build(),
            workload("w2", "shop_db_1")
                .attach(&backend, "10.0.9.3")
                .label("com.docker.compose.project", "shop")
                .port(5432)
                .build(),
        ],
        networks: vec![backend],
    };
    let provider = Arc::new(CountingInventory::new(inventory));
    let analyzer = analyzer(provider.clone());
    let cancel = CancellationToken::new();

    let first = analyzer.snapshot(&cancel).await.unwrap();
    analyzer.invalidate();
    let second = analyzer.snapshot(&cancel).await.unwrap();

    assert_eq!(provider.calls(), 2);
    let ids = |s: &TopologySnapshot| {
        (
            s.networks.iter().map(|n| n.id.clone()).collect::<Vec<_>>(),
            s.workloads.iter().map(|w| w.id.clone()).collect::<Vec<_>>(),
            s.services.iter().map(|x| x.name.clone()).collect::<Vec<_>>(),
            s.clusters.iter().map(|c| c.id.clone()).collect::<Vec<_>>(),
            s.connections.iter().map(|c| c.id.clone()).collect::<Vec<_>>(),
        )
    };
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first.summary.complexity, second.summary.complexity);
    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[tokio::test]
async fn malformed_fields_are_warned_not_fatal() {
    let backend = network("n1", "backend", "bridge");
    let inventory = Inventory {
        workloads: vec![
            workload("w1", "shop_api_1").attach(&backend, "not-an-ip").build(),
            workload("", "nameless").build(),
        ],
        networks: vec![backend],
    };

    let snapshot = analyze(inventory).await;

    assert_eq!(snapshot.workloads.len(), 1);
    assert_eq!(snapshot.workloads[0].interfaces[0].ip_address, None);
    assert_eq!(snapshot.analysis_metrics.warnings.len(), 2);
}
