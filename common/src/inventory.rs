//! # Inventory Port
//!
//! Raw facts about the container environment, exactly as an external provider
//! reports them, and the [`InventoryProvider`] trait the analyzer consumes.
//!
//! Nothing in this crate talks to a runtime directly; shelling out to runtime
//! tooling and parsing its output is the provider's job.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// One point-in-time view of the environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub networks: Vec<RawNetwork>,
    #[serde(default)]
    pub workloads: Vec<RawWorkload>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawNetwork {
    pub id: String,
    pub name: String,
    pub driver: String,
    pub scope: String,
    pub internal: bool,
    pub attachable: bool,
    pub labels: BTreeMap<String, String>,
    pub options: BTreeMap<String, String>,
    pub subnet: String,
    pub gateway: String,
    pub runtime: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawWorkload {
    pub id: String,
    pub name: String,
    pub image: String,
    pub state: String,
    pub labels: BTreeMap<String, String>,
    pub health_status: String,
    pub resource_limits: Option<RawResourceLimits>,
    pub attachments: Vec<RawAttachment>,
    pub ports: Vec<RawPortExposure>,
    pub runtime: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAttachment {
    pub network_id: String,
    pub network_name: String,
    pub ip_address: String,
    pub mac_address: String,
    pub gateway: String,
    pub subnet: String,
    pub mtu: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPortExposure {
    pub container_port: u16,
    pub host_port: Option<u16>,
    pub host_ip: String,
    pub protocol: String,
}

/// Quotas as reported by the runtime. Zero or negative means "not set".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawResourceLimits {
    pub memory: i64,
    pub cpu_quota: i64,
    pub cpu_period: i64,
    pub cpu_shares: i64,
}

/// Supplies the current set of networks and workloads.
///
/// Called at most once per rebuild. Any error returned here is fatal for the
/// analysis that requested it.
#[async_trait]
pub trait InventoryProvider: Send + Sync {
    async fn detect(&self, cancel: &CancellationToken) -> anyhow::Result<Inventory>;
}
