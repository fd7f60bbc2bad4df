use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use topomap_common::config::AnalyzerConfig;
use topomap_common::inventory::Inventory;
use topomap_common::TopologyError;
use topomap_core::TopologyAnalyzer;

use crate::support::{network, workload, AlwaysOpen, CountingInventory};

fn inventory() -> Inventory {
    let backend = network("n1", "backend", "bridge");
    Inventory {
        workloads: vec![
            workload("w1", "shop_api_1").attach(&backend, "10.0.0.2").build(),
            workload("w2", "shop_db_1").attach(&backend, "10.0.0.3").port(5432).build(),
        ],
        networks: vec![backend],
    }
}

#[tokio::test]
async fn repeated_analysis_within_ttl_hits_the_cache() {
    let provider = Arc::new(CountingInventory::new(inventory()));
    let analyzer = crate::support::analyzer(provider.clone());
    let cancel = CancellationToken::new();
    let ttl = Duration::from_secs(60);

    let first = analyzer.analyze(&cancel, ttl).await.unwrap();
    let second = analyzer.analyze(&cancel, ttl).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn concurrent_callers_after_expiry_trigger_one_rebuild() {
    let provider = Arc::new(CountingInventory::new(inventory()).with_delay(Duration::from_millis(50)));
    let analyzer = Arc::new(
        TopologyAnalyzer::new(provider.clone(), AnalyzerConfig::default()).with_prober(Arc::new(AlwaysOpen)),
    );
    let cancel = CancellationToken::new();

    analyzer.analyze(&cancel, Duration::from_secs(60)).await.unwrap();
    assert_eq!(provider.calls(), 1);

    tokio::time::sleep(Duration::from_millis(20)).await;
    let ttl = Duration::from_millis(10);

    let mut callers = JoinSet::new();
    for _ in 0..16 {
        let analyzer = Arc::clone(&analyzer);
        let cancel = cancel.clone();
        callers.spawn(async move { analyzer.analyze(&cancel, ttl).await.unwrap() });
    }

    let mut snapshots = Vec::new();
    while let Some(joined) = callers.join_next().await {
        snapshots.push(joined.unwrap());
    }

    assert_eq!(provider.calls(), 2);
    assert!(snapshots.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
}

#[tokio::test]
async fn invalidate_forces_the_next_call_to_rebuild() {
    let provider = Arc::new(CountingInventory::new(inventory()));
    let analyzer = crate::support::analyzer(provider.clone());
    let cancel = CancellationToken::new();

    let first = analyzer.snapshot(&cancel).await.unwrap();
    analyzer.invalidate();
    assert!(analyzer.cached().is_none());
    let second = analyzer.snapshot(&cancel).await.unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(provider.calls(), 2);
    assert!(second.analysis_metrics.cache_hit_rate < 1.0);
}

#[tokio::test]
async fn concurrent_callers_share_one_failed_inventory_read() {
    let provider = Arc::new(
        CountingInventory::new(inventory())
            .with_delay(Duration::from_millis(50))
            .unavailable(),
    );
    let analyzer = Arc::new(crate::support::analyzer(provider.clone()));
    let cancel = CancellationToken::new();

    let mut callers = JoinSet::new();
    for _ in 0..8 {
        let analyzer = Arc::clone(&analyzer);
        let cancel = cancel.clone();
        callers.spawn(async move { analyzer.snapshot(&cancel).await });
    }

    let mut failures = 0;
    while let Some(joined) = callers.join_next().await {
        let err = joined.unwrap().unwrap_err();
        assert!(matches!(err, TopologyError::Inventory(_)));
        assert!(err.to_string().contains("container runtime unreachable"));
        failures += 1;
    }

    assert_eq!(failures, 8);
    assert_eq!(provider.calls(), 1);
    assert!(analyzer.cached().is_none());
}
