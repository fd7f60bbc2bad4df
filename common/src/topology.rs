//! # Topology Model
//!
//! The derived, serializable view of the environment. A [`snapshot::TopologySnapshot`]
//! is built once per cache miss and never mutated afterwards.

pub mod cluster;
pub mod connection;
pub mod dependency;
pub mod network;
pub mod service;
pub mod snapshot;
pub mod workload;

pub use cluster::{
    ClusterGateway, ClusterMember, ClusterType, IsolationLevel, NetworkCluster, NetworkPolicyRule,
    PolicyAction, PolicyDirection,
};
pub use connection::{ConnectionDirection, ConnectionNode, ConnectionStatus, NetworkConnection, NodeKind};
pub use dependency::{DependencyType, HealthImpactLevel, ServiceDependency};
pub use network::{NetworkType, TopologyNetwork};
pub use service::{
    CircuitBreakerConfig, HealthCheckConfig, LoadBalancerConfig, NameSource, ServiceEndpoint,
    ServiceType, TopologyService, TrafficPolicy,
};
pub use snapshot::{AnalysisMetrics, AnalysisWarning, ComplexityMetrics, Phase, Summary, TopologySnapshot};
pub use workload::{DiscoveryInfo, ExposedPort, ResourceLimits, TopologyWorkload, WorkloadInterface};

/// First `n` characters of an identity, or the whole identity when shorter.
pub fn short_id(id: &str, n: usize) -> &str {
    match id.char_indices().nth(n) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}
