//! # Dependency Mapper
//!
//! Collapses workload-level connections into service-level dependencies.

use std::collections::{HashMap, HashSet};

use topomap_common::topology::{
    AnalysisWarning, DependencyType, HealthImpactLevel, NetworkConnection, NodeKind, Phase,
    ServiceDependency, TopologyService, TopologyWorkload,
};
use tracing::{debug, info};

use crate::mapping::record;

const SYNCHRONOUS_PROTOCOLS: &[&str] = &["tcp", "http", "https", "grpc"];
const REQUIRED_PORTS: &[u16] = &[3306, 5432, 6379];

/// Builds one dependency per (source service, target service) pair observed in
/// `connections`, in first-seen order.
///
/// Connections whose endpoints belong to no service, or to the same service,
/// are skipped. Endpoints naming a workload that is not in `workloads` are
/// skipped with a warning. Repeated pairs merge their ports into the existing
/// record.
pub fn map_dependencies(
    services: &[TopologyService],
    workloads: &[TopologyWorkload],
    connections: &[NetworkConnection],
) -> (Vec<ServiceDependency>, Vec<AnalysisWarning>) {
    let known: HashSet<&str> = workloads.iter().map(|w| w.id.as_str()).collect();
    let owner: HashMap<&str, &TopologyService> = services
        .iter()
        .flat_map(|svc| svc.workloads.iter().map(move |id| (id.as_str(), svc)))
        .collect();

    let mut warnings = Vec::new();
    let mut dependencies: Vec<ServiceDependency> = Vec::new();
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();

    for conn in connections {
        let unknown = [&conn.source, &conn.target]
            .into_iter()
            .find(|node| node.kind == NodeKind::Workload && !known.contains(node.id.as_str()));
        if let Some(node) = unknown {
            record(
                &mut warnings,
                AnalysisWarning::new(
                    Phase::DependencyMapping,
                    conn.id.as_str(),
                    format!("connection references unknown workload '{}'", node.id),
                ),
            );
            continue;
        }

        let (Some(source), Some(target)) = (
            owner.get(conn.source.id.as_str()),
            owner.get(conn.target.id.as_str()),
        ) else {
            continue;
        };
        if source.name == target.name {
            continue;
        }

        match index.get(&(source.name.as_str(), target.name.as_str())) {
            Some(&idx) => {
                let dep = &mut dependencies[idx];
                if !dep.ports.contains(&conn.port) {
                    dep.ports.push(conn.port);
                    dep.required |= is_required_port(conn.port);
                    dep.health_impact = dep.health_impact.max(health_impact(conn.port));
                }
            }
            None => {
                index.insert((source.name.as_str(), target.name.as_str()), dependencies.len());
                dependencies.push(ServiceDependency {
                    source_service: source.name.clone(),
                    target_service: target.name.clone(),
                    dependency_type: dependency_type(&conn.protocol),
                    protocol: conn.protocol.clone(),
                    ports: vec![conn.port],
                    required: is_required_port(conn.port),
                    health_impact: health_impact(conn.port),
                    circuit_breaker: target
                        .traffic_policy
                        .as_ref()
                        .and_then(|policy| policy.circuit_breaker),
                });
            }
        }
    }

    debug!("Resolved {} connections into service edges", connections.len());
    info!("Mapped {} service dependencies", dependencies.len());
    (dependencies, warnings)
}

pub fn dependency_type(protocol: &str) -> DependencyType {
    if SYNCHRONOUS_PROTOCOLS.iter().any(|p| p.eq_ignore_ascii_case(protocol)) {
        DependencyType::Synchronous
    } else {
        DependencyType::Asynchronous
    }
}

pub fn is_required_port(port: u16) -> bool {
    REQUIRED_PORTS.contains(&port)
}

pub fn health_impact(port: u16) -> HealthImpactLevel {
    match port {
        3306 | 5432 | 27017 => HealthImpactLevel::Critical,
        6379 => HealthImpactLevel::High,
        80 | 443 | 8080 => HealthImpactLevel::Medium,
        _ => HealthImpactLevel::Low,
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
