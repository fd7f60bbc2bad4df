use std::collections::BTreeMap;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyWorkload {
    pub id: String,
    pub name: String,
    pub image: String,
    pub state: String,
    pub runtime: String,
    pub interfaces: Vec<WorkloadInterface>,
    pub exposed_ports: Vec<ExposedPort>,
    pub labels: BTreeMap<String, String>,
    pub discovery: DiscoveryInfo,
    pub health_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_limits: Option<ResourceLimits>,
}

impl TopologyWorkload {
    /// Address of the first interface. This is the address probes and
    /// service endpoints use.
    pub fn primary_address(&self) -> Option<IpAddr> {
        self.interfaces.first().and_then(|intf| intf.ip_address)
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// First interface on a network the other workload is also attached to.
    pub fn shared_interface(&self, other: &TopologyWorkload) -> Option<&WorkloadInterface> {
        self.interfaces
            .iter()
            .find(|intf| other.interfaces.iter().any(|peer| intf.same_network(peer)))
    }

    /// True when both workloads share at least one network.
    pub fn shares_network_with(&self, other: &TopologyWorkload) -> bool {
        self.shared_interface(other).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadInterface {
    pub network_id: String,
    pub network_name: String,
    pub ip_address: Option<IpAddr>,
    pub mac_address: Option<String>,
    pub gateway: Option<IpAddr>,
    pub subnet: Option<String>,
    pub mtu: Option<u32>,
}

impl WorkloadInterface {
    /// Matches on network identity, or on name when a provider left the identity out.
    pub fn same_network(&self, other: &WorkloadInterface) -> bool {
        if !self.network_id.is_empty() && !other.network_id.is_empty() {
            return self.network_id == other.network_id;
        }
        !self.network_name.is_empty() && self.network_name == other.network_name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposedPort {
    pub container_port: u16,
    pub host_port: Option<u16>,
    pub host_ip: String,
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_limit: Option<String>,
}
