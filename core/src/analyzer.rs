//! # Topology Analyzer
//!
//! Wires the phases together and owns the snapshot cache.
//!
//! ```text
//! cache miss ─> inventory ─> networks ∥ workloads ─> services ─> probes
//!            ─> dependencies ∥ clusters ─> summary ─> snapshot
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use topomap_common::config::AnalyzerConfig;
use topomap_common::inventory::InventoryProvider;
use topomap_common::topology::{AnalysisMetrics, TopologySnapshot};
use topomap_common::{TopologyError, TopologyResult};
use tracing::{debug, info, warn};

use crate::cache::TopologyCache;
use crate::cluster::identify_clusters;
use crate::dependency::map_dependencies;
use crate::discovery::discover_services;
use crate::export::{self, ExportFormat};
use crate::mapping::{map_networks, map_workloads};
use crate::network::TcpProber;
use crate::prober::{ConnectionProber, Prober};
use crate::summary::{summarize, SummaryInput};

pub struct TopologyAnalyzer {
    provider: Arc<dyn InventoryProvider>,
    prober: Arc<dyn Prober>,
    config: AnalyzerConfig,
    cache: TopologyCache<TopologyError>,
}

impl TopologyAnalyzer {
    /// Probes with plain TCP connects bounded by `config.probe_timeout`.
    pub fn new(provider: Arc<dyn InventoryProvider>, config: AnalyzerConfig) -> Self {
        let prober = Arc::new(TcpProber::new(config.probe_timeout));
        Self {
            provider,
            prober,
            config,
            cache: TopologyCache::new(),
        }
    }

    pub fn with_prober(mut self, prober: Arc<dyn Prober>) -> Self {
        self.prober = prober;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Returns the cached snapshot while it is younger than `ttl`, otherwise
    /// rebuilds it. Concurrent callers during a rebuild share its result.
    pub async fn analyze(&self, cancel: &CancellationToken, ttl: Duration) -> TopologyResult<Arc<TopologySnapshot>> {
        self.cache.get_or_build(ttl, || self.build(cancel)).await
    }

    /// [`analyze`](Self::analyze) with the configured TTL.
    pub async fn snapshot(&self, cancel: &CancellationToken) -> TopologyResult<Arc<TopologySnapshot>> {
        self.analyze(cancel, self.config.cache_ttl).await
    }

    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    /// The cached snapshot if still within the configured TTL. Never rebuilds.
    pub fn cached(&self) -> Option<Arc<TopologySnapshot>> {
        self.cache.peek(self.config.cache_ttl)
    }

    pub fn export(&self, snapshot: &TopologySnapshot, format: &str) -> TopologyResult<Vec<u8>> {
        export::export(snapshot, format)
    }

    pub fn render(&self, snapshot: &TopologySnapshot, format: ExportFormat) -> TopologyResult<Vec<u8>> {
        export::render(snapshot, format)
    }

    /// Rebuilds every `interval` until `cancel` fires and hands each snapshot
    /// whose fingerprint differs from the previous one to `on_change`.
    ///
    /// Inventory failures are logged and retried on the next tick.
    pub async fn monitor<F>(&self, interval: Duration, cancel: &CancellationToken, mut on_change: F) -> TopologyResult<()>
    where
        F: FnMut(&TopologySnapshot),
    {
        let mut last_fingerprint: Option<String> = None;

        loop {
            self.invalidate();
            match self.analyze(cancel, self.config.cache_ttl).await {
                Ok(snapshot) => {
                    let fingerprint = snapshot.fingerprint();
                    if last_fingerprint.as_deref() != Some(fingerprint.as_str()) {
                        info!("Topology changed: {}", fingerprint);
                        on_change(&snapshot);
                        last_fingerprint = Some(fingerprint);
                    } else {
                        debug!("Topology unchanged");
                    }
                }
                Err(TopologyError::Cancelled) => return Ok(()),
                Err(e) => warn!("Monitor tick failed: {}", e),
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    async fn build(&self, cancel: &CancellationToken) -> TopologyResult<TopologySnapshot> {
        let started = Instant::now();
        info!("Building topology snapshot");

        let inventory = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TopologyError::Cancelled),
            detected = self.provider.detect(cancel) => detected.map_err(TopologyError::inventory)?,
        };
        let discovery_duration = started.elapsed();
        info!(
            "Inventory reported {} networks and {} workloads",
            inventory.networks.len(),
            inventory.workloads.len()
        );

        let mapping_started = Instant::now();
        let ((networks, network_warnings), (workloads, workload_warnings)) = rayon::join(
            || map_networks(&inventory.networks, &inventory.workloads),
            || map_workloads(&inventory.workloads),
        );
        let (services, service_warnings) = discover_services(&workloads);
        let mapping_duration = mapping_started.elapsed();

        let mut probes = ConnectionProber::new(Arc::clone(&self.prober), self.config.effective_concurrency())
            .enabled(self.config.probing_enabled)
            .run(&workloads, cancel)
            .await;

        let ((dependencies, dependency_warnings), (clusters, cluster_warnings)) = rayon::join(
            || map_dependencies(&services, &workloads, &probes.connections),
            || identify_clusters(&networks, &workloads),
        );

        let summary = summarize(&SummaryInput {
            networks: &networks,
            workloads: &workloads,
            services: &services,
            connections: &probes.connections,
            dependencies: &dependencies,
            clusters: &clusters,
        });

        let data_source_counts = BTreeMap::from([
            ("networks".to_string(), networks.len()),
            ("workloads".to_string(), workloads.len()),
            ("services".to_string(), services.len()),
            ("connections".to_string(), probes.connections.len()),
            ("dependencies".to_string(), dependencies.len()),
            ("clusters".to_string(), clusters.len()),
        ]);

        let warnings: Vec<_> = network_warnings
            .into_iter()
            .chain(workload_warnings)
            .chain(service_warnings)
            .chain(std::mem::take(&mut probes.warnings))
            .chain(dependency_warnings)
            .chain(cluster_warnings)
            .collect();

        let analysis_metrics = AnalysisMetrics {
            analysis_duration_ms: millis(started.elapsed()),
            discovery_duration_ms: millis(discovery_duration),
            mapping_duration_ms: millis(mapping_duration),
            probe_duration_ms: millis(probes.duration),
            connection_tests: probes.tests,
            successful_tests: probes.successful,
            failed_tests: probes.failed,
            unknown_tests: probes.unknown,
            abandoned_tests: probes.abandoned,
            cache_hit_rate: self.cache.hit_rate(),
            data_source_counts,
            warnings,
        };

        info!(
            "Snapshot ready: {} services, {} connections, {} dependencies, {} clusters ({} warnings) in {} ms",
            services.len(),
            probes.connections.len(),
            dependencies.len(),
            clusters.len(),
            analysis_metrics.warnings.len(),
            analysis_metrics.analysis_duration_ms
        );

        Ok(TopologySnapshot {
            generated_at: Utc::now(),
            networks,
            workloads,
            services,
            connections: probes.connections,
            dependencies,
            clusters,
            summary,
            analysis_metrics,
        })
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StaticInventory, StubProber};
    use async_trait::async_trait;
    use topomap_common::inventory::{Inventory, RawAttachment, RawNetwork, RawPortExposure, RawWorkload};
    use topomap_common::topology::{ConnectionStatus, HealthImpactLevel};

    fn raw_workload(id: &str, name: &str, ip: &str, port: Option<u16>) -> RawWorkload {
        RawWorkload {
            id: id.to_string(),
            name: name.to_string(),
            image: "acme/app:1".to_string(),
            state: "running".to_string(),
            attachments: vec![RawAttachment {
                network_id: "net1".to_string(),
                network_name: "backend".to_string(),
                ip_address: ip.to_string(),
                ..RawAttachment::default()
            }],
            ports: port
                .map(|p| {
                    vec![RawPortExposure {
                        container_port: p,
                        protocol: "tcp".to_string(),
                        ..RawPortExposure::default()
                    }]
                })
                .unwrap_or_default(),
            ..RawWorkload::default()
        }
    }

    fn inventory() -> Inventory {
        Inventory {
            networks: vec![RawNetwork {
                id: "net1".to_string(),
                name: "backend".to_string(),
                driver: "bridge".to_string(),
                ..RawNetwork::default()
            }],
            workloads: vec![
                raw_workload("api1", "shop_api_1", "172.18.0.2", None),
                raw_workload("db1", "shop_db_1", "172.18.0.3", Some(5432)),
            ],
        }
    }

    fn analyzer(provider: Arc<StaticInventory>) -> TopologyAnalyzer {
        TopologyAnalyzer::new(provider, AnalyzerConfig::default())
            .with_prober(Arc::new(StubProber::with_open(&["172.18.0.3:5432"])))
    }

    #[tokio::test]
    async fn builds_full_snapshot() {
        let provider = Arc::new(StaticInventory::new(inventory()));
        let snapshot = analyzer(provider).snapshot(&CancellationToken::new()).await.unwrap();

        assert_eq!(snapshot.networks[0].connected_workloads, ["api1", "db1"]);
        assert_eq!(snapshot.services.len(), 2);
        assert_eq!(snapshot.connections.len(), 1);
        assert_eq!(snapshot.connections[0].status, ConnectionStatus::Active);
        assert_eq!(snapshot.dependencies.len(), 1);
        assert!(snapshot.dependencies[0].required);
        assert_eq!(snapshot.dependencies[0].health_impact, HealthImpactLevel::Critical);
        assert_eq!(snapshot.clusters.len(), 1);
        assert_eq!(snapshot.analysis_metrics.connection_tests, 1);
        assert_eq!(snapshot.analysis_metrics.successful_tests, 1);
        assert_eq!(snapshot.analysis_metrics.data_source_counts.get("services"), Some(&2));
    }

    #[tokio::test]
    async fn second_call_within_ttl_reuses_snapshot() {
        let provider = Arc::new(StaticInventory::new(inventory()));
        let analyzer = analyzer(provider.clone());
        let cancel = CancellationToken::new();

        let first = analyzer.snapshot(&cancel).await.unwrap();
        let second = analyzer.snapshot(&cancel).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.calls(), 1);
        assert!(analyzer.cached().is_some());

        analyzer.invalidate();
        assert!(analyzer.cached().is_none());
        analyzer.snapshot(&cancel).await.unwrap();
        assert_eq!(provider.calls(), 2);
    }

    struct BrokenInventory;

    #[async_trait]
    impl InventoryProvider for BrokenInventory {
        async fn detect(&self, _cancel: &CancellationToken) -> anyhow::Result<Inventory> {
            anyhow::bail!("docker daemon unreachable")
        }
    }

    #[tokio::test]
    async fn inventory_failure_is_fatal() {
        let analyzer = TopologyAnalyzer::new(Arc::new(BrokenInventory), AnalyzerConfig::default());

        let err = analyzer.snapshot(&CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, TopologyError::Inventory(_)));
        assert!(err.to_string().contains("docker daemon unreachable"));
        assert!(analyzer.cached().is_none());
    }

    #[tokio::test]
    async fn cancelled_before_inventory_is_reported() {
        let provider = Arc::new(StaticInventory::new(inventory()));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = analyzer(provider.clone()).snapshot(&cancel).await.unwrap_err();

        assert!(matches!(err, TopologyError::Cancelled));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn monitor_reports_first_snapshot_then_stops() {
        let provider = Arc::new(StaticInventory::new(inventory()));
        let analyzer = analyzer(provider.clone());
        let cancel = CancellationToken::new();
        let stop = cancel.clone();
        let mut changes = 0;

        analyzer
            .monitor(Duration::from_millis(10), &cancel, |_| {
                changes += 1;
                stop.cancel();
            })
            .await
            .unwrap();

        assert_eq!(changes, 1);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn monitor_skips_unchanged_ticks() {
        let provider = Arc::new(StaticInventory::new(inventory()));
        let analyzer = analyzer(provider.clone());
        let cancel = CancellationToken::new();
        let stop = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            stop.cancel();
        });
        let mut changes = 0;

        analyzer
            .monitor(Duration::from_millis(10), &cancel, |_| changes += 1)
            .await
            .unwrap();

        assert_eq!(changes, 1);
        assert!(provider.calls() > 1);
    }
}
