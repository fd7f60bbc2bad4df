//! Inventory builders and providers shared by the scenario tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use topomap_common::config::AnalyzerConfig;
use topomap_common::inventory::{
    Inventory, InventoryProvider, RawAttachment, RawNetwork, RawPortExposure, RawWorkload,
};
use topomap_core::{Prober, TopologyAnalyzer};

pub fn network(id: &str, name: &str, driver: &str) -> RawNetwork {
    RawNetwork {
        id: id.to_string(),
        name: name.to_string(),
        driver: driver.to_string(),
        scope: "local".to_string(),
        runtime: "docker".to_string(),
        ..RawNetwork::default()
    }
}

pub struct WorkloadBuilder(RawWorkload);

pub fn workload(id: &str, name: &str) -> WorkloadBuilder {
    WorkloadBuilder(RawWorkload {
        id: id.to_string(),
        name: name.to_string(),
        image: "acme/app:1".to_string(),
        state: "running".to_string(),
        runtime: "docker".to_string(),
        ..RawWorkload::default()
    })
}

impl WorkloadBuilder {
    pub fn image(mut self, image: &str) -> Self {
        self.0.image = image.to_string();
        self
    }

    pub fn label(mut self, key: &str, value: &str) -> Self {
        self.0.labels.insert(key.to_string(), value.to_string());
        self
    }

    pub fn attach(mut self, network: &RawNetwork, ip: &str) -> Self {
        self.0.attachments.push(RawAttachment {
            network_id: network.id.clone(),
            network_name: network.name.clone(),
            ip_address: ip.to_string(),
            ..RawAttachment::default()
        });
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.0.ports.push(RawPortExposure {
            container_port: port,
            protocol: "tcp".to_string(),
            ..RawPortExposure::default()
        });
        self
    }

    pub fn build(self) -> RawWorkload {
        self.0
    }
}

/// Returns a fixed inventory and counts how often it was asked.
pub struct CountingInventory {
    inventory: Inventory,
    delay: Duration,
    unavailable: bool,
    calls: AtomicUsize,
}

impl CountingInventory {
    pub fn new(inventory: Inventory) -> Self {
        Self {
            inventory,
            delay: Duration::ZERO,
            unavailable: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Every `detect` fails after the delay.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InventoryProvider for CountingInventory {
    async fn detect(&self, _cancel: &CancellationToken) -> anyhow::Result<Inventory> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.unavailable {
            anyhow::bail!("container runtime unreachable");
        }
        Ok(self.inventory.clone())
    }
}

/// Every probe succeeds without touching the network.
pub struct AlwaysOpen;

#[async_trait]
impl Prober for AlwaysOpen {
    async fn probe(&self, _target: SocketAddr) -> anyhow::Result<()> {
        Ok(())
    }
}

pub fn analyzer(provider: Arc<CountingInventory>) -> TopologyAnalyzer {
    TopologyAnalyzer::new(provider, AnalyzerConfig::default()).with_prober(Arc::new(AlwaysOpen))
}
