//! # Cluster Identifier
//!
//! Two independent groupings of workloads: one cluster per shared network and
//! one per deployment group. A workload can sit in several clusters at once.
//! Groupings with fewer than two members are dropped.

use std::collections::{BTreeMap, HashMap};

use topomap_common::topology::{
    short_id, AnalysisWarning, ClusterGateway, ClusterMember, ClusterType, IsolationLevel,
    NetworkCluster, NetworkPolicyRule, Phase, PolicyAction, PolicyDirection, TopologyNetwork,
    TopologyWorkload,
};
use tracing::{debug, info};

use crate::discovery::inference::{DEPLOYMENT_GROUP_LABEL, DEPLOYMENT_SERVICE_LABEL};
use crate::mapping::record;

const MIN_MEMBERS: usize = 2;

/// Network members that do not resolve to a known workload are left out of
/// the cluster and reported as warnings.
pub fn identify_clusters(
    networks: &[TopologyNetwork],
    workloads: &[TopologyWorkload],
) -> (Vec<NetworkCluster>, Vec<AnalysisWarning>) {
    let by_id: HashMap<&str, &TopologyWorkload> = workloads.iter().map(|w| (w.id.as_str(), w)).collect();

    let mut warnings = Vec::new();
    let mut clusters: Vec<NetworkCluster> = networks
        .iter()
        .filter_map(|net| network_cluster(net, &by_id, &mut warnings))
        .collect();
    let network_scoped = clusters.len();

    clusters.extend(project_clusters(workloads));

    info!(
        "Identified {} clusters ({} network-scoped, {} deployment projects)",
        clusters.len(),
        network_scoped,
        clusters.len() - network_scoped
    );
    (clusters, warnings)
}

pub fn isolation_for(network: &TopologyNetwork) -> IsolationLevel {
    if network.internal {
        IsolationLevel::Strict
    } else if network.is_bridge() {
        IsolationLevel::Moderate
    } else {
        IsolationLevel::Permissive
    }
}

fn network_cluster(
    network: &TopologyNetwork,
    by_id: &HashMap<&str, &TopologyWorkload>,
    warnings: &mut Vec<AnalysisWarning>,
) -> Option<NetworkCluster> {
    let mut members = Vec::with_capacity(network.connected_workloads.len());
    for id in &network.connected_workloads {
        let Some(w) = by_id.get(id.as_str()) else {
            record(
                warnings,
                AnalysisWarning::new(
                    Phase::ClusterIdentification,
                    network.name.as_str(),
                    format!("connected workload '{id}' is not in the inventory"),
                ),
            );
            continue;
        };
        members.push(ClusterMember {
            id: w.id.clone(),
            name: w.name.clone(),
            role: None,
            metadata: BTreeMap::from([
                ("image".to_string(), w.image.clone()),
                ("state".to_string(), w.state.clone()),
            ]),
        });
    }

    if members.len() < MIN_MEMBERS {
        debug!("Network {} has {} members, no cluster", network.name, members.len());
        return None;
    }

    let key = if network.id.is_empty() { &network.name } else { &network.id };
    let mut policies = Vec::new();
    if network.internal {
        policies.push(NetworkPolicyRule {
            action: PolicyAction::Deny,
            direction: PolicyDirection::Egress,
            peer: "external".to_string(),
        });
    }

    Some(NetworkCluster {
        id: format!("network-{}", short_id(key, 12)),
        name: format!("Network {}", network.name),
        cluster_type: ClusterType::NetworkScoped,
        members,
        subnets: if network.subnet.is_empty() { Vec::new() } else { vec![network.subnet.clone()] },
        isolation: isolation_for(network),
        policies,
        gateway: (!network.gateway.is_empty()).then(|| ClusterGateway {
            kind: network.driver.clone(),
            address: network.gateway.clone(),
        }),
        metadata: BTreeMap::from([
            ("network_id".to_string(), network.id.clone()),
            ("network_driver".to_string(), network.driver.clone()),
            ("network_scope".to_string(), network.scope.clone()),
        ]),
    })
}

fn project_clusters(workloads: &[TopologyWorkload]) -> Vec<NetworkCluster> {
    let mut projects: BTreeMap<&str, Vec<&TopologyWorkload>> = BTreeMap::new();
    for workload in workloads {
        if let Some(project) = workload.label(DEPLOYMENT_GROUP_LABEL).filter(|p| !p.trim().is_empty()) {
            projects.entry(project).or_default().push(workload);
        }
    }

    projects
        .into_iter()
        .filter(|(_, members)| members.len() >= MIN_MEMBERS)
        .map(|(project, members)| {
            let mut subnets: Vec<String> = Vec::new();
            for subnet in members.iter().flat_map(|w| w.interfaces.iter().filter_map(|i| i.subnet.clone())) {
                if !subnets.contains(&subnet) {
                    subnets.push(subnet);
                }
            }

            NetworkCluster {
                id: format!("project-{project}"),
                name: format!("Project {project}"),
                cluster_type: ClusterType::DeploymentProject,
                members: members.iter().map(|w| project_member(w)).collect(),
                subnets,
                isolation: IsolationLevel::Moderate,
                policies: Vec::new(),
                gateway: None,
                metadata: BTreeMap::from([("deployment_project".to_string(), project.to_string())]),
            }
        })
        .collect()
}

fn project_member(workload: &TopologyWorkload) -> ClusterMember {
    let role = workload
        .label(DEPLOYMENT_SERVICE_LABEL)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string);
    let mut metadata = BTreeMap::new();
    if let Some(role) = &role {
        metadata.insert("deployment_service".to_string(), role.clone());
    }
    ClusterMember {
        id: workload.id.clone(),
        name: workload.name.clone(),
        role,
        metadata,
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
