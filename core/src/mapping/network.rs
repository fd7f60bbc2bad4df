use std::collections::HashSet;

use topomap_common::inventory::{RawNetwork, RawWorkload};
use topomap_common::network::{parse_ip, subnet::parse_subnet};
use topomap_common::topology::{AnalysisWarning, NetworkType, Phase, TopologyNetwork};
use tracing::debug;

use super::record;

/// Maps detected networks and computes which workloads are attached to each.
///
/// A workload counts as attached when one of its attachments names the
/// network by identity, or by name for providers that omit identities.
pub fn map_networks(
    raw_networks: &[RawNetwork],
    raw_workloads: &[RawWorkload],
) -> (Vec<TopologyNetwork>, Vec<AnalysisWarning>) {
    let mut warnings = Vec::new();
    let mut networks = Vec::with_capacity(raw_networks.len());
    let mut seen: HashSet<&str> = HashSet::new();

    for raw in raw_networks {
        if raw.id.is_empty() && raw.name.is_empty() {
            record(
                &mut warnings,
                AnalysisWarning::new(Phase::NetworkMapping, "<unnamed>", "network has neither id nor name"),
            );
            continue;
        }

        let key = if raw.id.is_empty() { raw.name.as_str() } else { raw.id.as_str() };
        if !seen.insert(key) {
            record(
                &mut warnings,
                AnalysisWarning::new(Phase::NetworkMapping, key, "duplicate network skipped"),
            );
            continue;
        }

        let subnet = match parse_subnet(&raw.subnet) {
            Ok(_) => raw.subnet.trim().to_string(),
            Err(message) => {
                record(&mut warnings, AnalysisWarning::new(Phase::NetworkMapping, key, message));
                String::new()
            }
        };

        let gateway = match parse_ip(&raw.gateway) {
            Ok(_) => raw.gateway.trim().to_string(),
            Err(message) => {
                record(&mut warnings, AnalysisWarning::new(Phase::NetworkMapping, key, message));
                String::new()
            }
        };

        networks.push(TopologyNetwork {
            id: raw.id.clone(),
            name: raw.name.clone(),
            driver: raw.driver.clone(),
            scope: raw.scope.clone(),
            subnet,
            gateway,
            internal: raw.internal,
            attachable: raw.attachable,
            network_type: NetworkType::from_driver(&raw.driver),
            labels: raw.labels.clone(),
            options: raw.options.clone(),
            connected_workloads: connected_workloads(raw, raw_workloads),
            runtime: raw.runtime.clone(),
        });
    }

    debug!("Mapped {} networks", networks.len());
    (networks, warnings)
}

fn connected_workloads(network: &RawNetwork, raw_workloads: &[RawWorkload]) -> Vec<String> {
    let mut members: Vec<String> = Vec::new();

    for workload in raw_workloads.iter().filter(|w| !w.id.is_empty()) {
        let attached = workload.attachments.iter().any(|att| {
            (!att.network_id.is_empty() && att.network_id == network.id)
                || (!att.network_name.is_empty() && att.network_name == network.name)
        });

        if attached && !members.contains(&workload.id) {
            members.push(workload.id.clone());
        }
    }

    members
}
