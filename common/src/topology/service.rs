use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Web,
    Api,
    Database,
    Cache,
    Queue,
    Worker,
    Proxy,
    Other,
}

impl ServiceType {
    pub const ALL: [ServiceType; 8] = [
        Self::Web,
        Self::Api,
        Self::Database,
        Self::Cache,
        Self::Queue,
        Self::Worker,
        Self::Proxy,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Api => "api",
            Self::Database => "database",
            Self::Cache => "cache",
            Self::Queue => "queue",
            Self::Worker => "worker",
            Self::Proxy => "proxy",
            Self::Other => "other",
        }
    }

    /// Service types that weigh more in the complexity score.
    pub fn is_routing_heavy(&self) -> bool {
        matches!(self, Self::Api | Self::Proxy)
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown service type: {s}"))
    }
}

/// Where a service's name came from. `NameHeuristic` marks low-confidence groupings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameSource {
    DeploymentLabel,
    ServiceLabel,
    NameHeuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyService {
    pub name: String,
    pub service_type: ServiceType,
    pub name_source: NameSource,
    pub workloads: Vec<String>,
    pub endpoints: Vec<ServiceEndpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancer: Option<LoadBalancerConfig>,
    pub health_checks: Vec<HealthCheckConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_policy: Option<TrafficPolicy>,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
}

impl TopologyService {
    pub fn contains(&self, workload_id: &str) -> bool {
        self.workloads.iter().any(|id| id == workload_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub address: Option<IpAddr>,
    pub port: u16,
    pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerConfig {
    pub kind: String,
    pub algorithm: String,
    pub session_affinity: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckConfig {
    pub endpoint: String,
    pub interval_secs: u64,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circuit_breaker: Option<CircuitBreakerConfig>,
}

impl TrafficPolicy {
    pub fn is_empty(&self) -> bool {
        self.connect_timeout_secs.is_none()
            && self.request_timeout_secs.is_none()
            && self.circuit_breaker.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub recovery_timeout_secs: u64,
}
