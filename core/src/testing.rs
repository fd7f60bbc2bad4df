//! Builders and test doubles shared by the unit tests of this crate.

use std::collections::{BTreeMap, HashSet};
use std::net::{IpAddr, SocketAddr};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use topomap_common::inventory::{Inventory, InventoryProvider};
use topomap_common::topology::{
    AnalysisMetrics, DiscoveryInfo, ExposedPort, NetworkType, Summary, TopologyNetwork,
    TopologySnapshot, TopologyWorkload, WorkloadInterface,
};

use crate::prober::Prober;

pub fn workload(id: &str, name: &str) -> WorkloadBuilder {
    WorkloadBuilder {
        inner: TopologyWorkload {
            id: id.to_string(),
            name: name.to_string(),
            image: String::new(),
            state: "running".to_string(),
            runtime: "docker".to_string(),
            interfaces: Vec::new(),
            exposed_ports: Vec::new(),
            labels: BTreeMap::new(),
            discovery: DiscoveryInfo::default(),
            health_status: String::new(),
            resource_limits: None,
        },
    }
}

pub struct WorkloadBuilder {
    inner: TopologyWorkload,
}

impl WorkloadBuilder {
    pub fn image(mut self, image: &str) -> Self {
        self.inner.image = image.to_string();
        self
    }

    pub fn state(mut self, state: &str) -> Self {
        self.inner.state = state.to_string();
        self
    }

    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.inner.labels.insert(key.to_string(), value.to_string());
        self
    }

    pub fn port(self, port: u16) -> Self {
        self.port_with_protocol(port, "tcp")
    }

    pub fn port_with_protocol(mut self, port: u16, protocol: &str) -> Self {
        self.inner.exposed_ports.push(ExposedPort {
            container_port: port,
            host_port: None,
            host_ip: String::new(),
            protocol: protocol.to_string(),
            service_name: None,
        });
        self
    }

    pub fn attach(mut self, network_id: &str, ip: &str) -> Self {
        self.inner.interfaces.push(WorkloadInterface {
            network_id: network_id.to_string(),
            network_name: network_id.to_string(),
            ip_address: ip.parse::<IpAddr>().ok(),
            mac_address: None,
            gateway: None,
            subnet: None,
            mtu: None,
        });
        self
    }

    pub fn build(self) -> TopologyWorkload {
        self.inner
    }
}

pub fn network(id: &str, driver: &str, members: &[&str]) -> TopologyNetwork {
    TopologyNetwork {
        id: id.to_string(),
        name: format!("{id}-net"),
        driver: driver.to_string(),
        scope: "local".to_string(),
        subnet: String::new(),
        gateway: String::new(),
        internal: false,
        attachable: false,
        network_type: NetworkType::from_driver(driver),
        labels: BTreeMap::new(),
        options: BTreeMap::new(),
        connected_workloads: members.iter().map(|m| m.to_string()).collect(),
        runtime: "docker".to_string(),
    }
}

/// Inventory provider returning a fixed inventory and counting its calls.
pub struct StaticInventory {
    inventory: Inventory,
    calls: AtomicUsize,
}

impl StaticInventory {
    pub fn new(inventory: Inventory) -> Self {
        Self {
            inventory,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InventoryProvider for StaticInventory {
    async fn detect(&self, _cancel: &CancellationToken) -> anyhow::Result<Inventory> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.inventory.clone())
    }
}

/// Prober that succeeds for a fixed set of open sockets and records every target.
#[derive(Default)]
pub struct StubProber {
    open: HashSet<SocketAddr>,
    seen: Mutex<Vec<SocketAddr>>,
}

impl StubProber {
    pub fn with_open(open: &[&str]) -> Self {
        Self {
            open: open.iter().filter_map(|s| s.parse().ok()).collect(),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<SocketAddr> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Prober for StubProber {
    async fn probe(&self, target: SocketAddr) -> anyhow::Result<()> {
        self.seen.lock().unwrap().push(target);
        if self.open.contains(&target) {
            Ok(())
        } else {
            anyhow::bail!("connection refused")
        }
    }
}

pub fn empty_snapshot() -> TopologySnapshot {
    TopologySnapshot {
        generated_at: Utc::now(),
        networks: Vec::new(),
        workloads: Vec::new(),
        services: Vec::new(),
        connections: Vec::new(),
        dependencies: Vec::new(),
        clusters: Vec::new(),
        summary: Summary::default(),
        analysis_metrics: AnalysisMetrics::default(),
    }
}
