//! # Snapshot
//!
//! The immutable result of one analysis pass, plus its summary and the
//! bookkeeping collected while building it.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::short_id;
use super::{
    ClusterType, ConnectionStatus, NetworkCluster, NetworkConnection, ServiceDependency,
    ServiceType, TopologyNetwork, TopologyService, TopologyWorkload,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub generated_at: DateTime<Utc>,
    pub networks: Vec<TopologyNetwork>,
    pub workloads: Vec<TopologyWorkload>,
    pub services: Vec<TopologyService>,
    pub connections: Vec<NetworkConnection>,
    pub dependencies: Vec<ServiceDependency>,
    pub clusters: Vec<NetworkCluster>,
    pub summary: Summary,
    pub analysis_metrics: AnalysisMetrics,
}

impl TopologySnapshot {
    pub fn workload(&self, id: &str) -> Option<&TopologyWorkload> {
        self.workloads.iter().find(|w| w.id == id)
    }

    pub fn service(&self, name: &str) -> Option<&TopologyService> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn services_of_type(&self, service_type: ServiceType) -> Vec<&TopologyService> {
        self.services
            .iter()
            .filter(|s| s.service_type == service_type)
            .collect()
    }

    pub fn connections_with_status(&self, status: ConnectionStatus) -> Vec<&NetworkConnection> {
        self.connections
            .iter()
            .filter(|c| c.status == status)
            .collect()
    }

    pub fn clusters_of_type(&self, cluster_type: ClusterType) -> Vec<&NetworkCluster> {
        self.clusters
            .iter()
            .filter(|c| c.cluster_type == cluster_type)
            .collect()
    }

    /// Change-detection key built from category counts and network identities.
    ///
    /// Probe outcomes are not part of it: a flapping port is not a topology change.
    pub fn fingerprint(&self) -> String {
        let mut network_ids: Vec<&str> = self
            .networks
            .iter()
            .map(|n| short_id(&n.id, 8))
            .collect();
        network_ids.sort_unstable();

        format!(
            "nets:{},workloads:{},services:{},connections:{},net_ids:{}",
            self.networks.len(),
            self.workloads.len(),
            self.services.len(),
            self.connections.len(),
            network_ids.join(",")
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_networks: usize,
    pub total_workloads: usize,
    pub total_services: usize,
    pub total_connections: usize,
    pub total_dependencies: usize,
    pub total_clusters: usize,
    pub networks_by_driver: BTreeMap<String, usize>,
    pub workloads_by_state: BTreeMap<String, usize>,
    pub services_by_type: BTreeMap<String, usize>,
    pub complexity: ComplexityMetrics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexityMetrics {
    pub network_complexity: f64,
    pub service_complexity: f64,
    pub connection_density: f64,
    /// `edges - nodes + 2`. A heuristic only: it carries no graph-theoretic
    /// meaning once the topology has more than one connected component.
    pub cyclomatic_complexity: i64,
    /// Longest chain in the service dependency graph, counted in edges.
    pub max_depth: usize,
    pub branching_factor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NetworkMapping,
    WorkloadMapping,
    ServiceDiscovery,
    Probing,
    DependencyMapping,
    ClusterIdentification,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NetworkMapping => "network mapping",
            Self::WorkloadMapping => "workload mapping",
            Self::ServiceDiscovery => "service discovery",
            Self::Probing => "probing",
            Self::DependencyMapping => "dependency mapping",
            Self::ClusterIdentification => "cluster identification",
        };
        f.write_str(s)
    }
}

/// A per-item problem that was skipped over rather than aborting the phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWarning {
    pub phase: Phase,
    pub subject: String,
    pub message: String,
}

impl AnalysisWarning {
    pub fn new(phase: Phase, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            phase,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetrics {
    pub analysis_duration_ms: u64,
    pub discovery_duration_ms: u64,
    pub mapping_duration_ms: u64,
    pub probe_duration_ms: u64,
    pub connection_tests: usize,
    pub successful_tests: usize,
    pub failed_tests: usize,
    pub unknown_tests: usize,
    /// Probes that were still queued or in flight when the caller cancelled.
    pub abandoned_tests: usize,
    pub cache_hit_rate: f64,
    pub data_source_counts: BTreeMap<String, usize>,
    pub warnings: Vec<AnalysisWarning>,
}
