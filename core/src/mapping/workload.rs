use std::collections::HashSet;

use topomap_common::inventory::{RawAttachment, RawPortExposure, RawResourceLimits, RawWorkload};
use topomap_common::network::{mac::normalize_mac, parse_ip, subnet::parse_subnet};
use topomap_common::topology::{
    AnalysisWarning, DiscoveryInfo, ExposedPort, Phase, ResourceLimits, TopologyWorkload,
    WorkloadInterface,
};
use tracing::debug;

use super::record;

const DNS_NAME_LABEL: &str = "service.dns.name";
const TAGS_LABEL: &str = "service.tags";
const DEFAULT_PROTOCOL: &str = "tcp";

/// Maps detected workloads one-to-one onto topology workloads.
///
/// Workloads without an identity and repeated identities are skipped, so
/// every identity in the output is unique.
pub fn map_workloads(raw_workloads: &[RawWorkload]) -> (Vec<TopologyWorkload>, Vec<AnalysisWarning>) {
    let mut warnings = Vec::new();
    let mut workloads = Vec::with_capacity(raw_workloads.len());
    let mut seen: HashSet<&str> = HashSet::new();

    for raw in raw_workloads {
        if raw.id.is_empty() {
            let subject = if raw.name.is_empty() { "<unnamed>" } else { raw.name.as_str() };
            record(
                &mut warnings,
                AnalysisWarning::new(Phase::WorkloadMapping, subject, "workload has no id"),
            );
            continue;
        }
        if !seen.insert(raw.id.as_str()) {
            record(
                &mut warnings,
                AnalysisWarning::new(Phase::WorkloadMapping, &raw.id, "duplicate workload skipped"),
            );
            continue;
        }

        let interfaces = raw
            .attachments
            .iter()
            .filter_map(|att| map_interface(&raw.id, att, &mut warnings))
            .collect();

        let exposed_ports = raw
            .ports
            .iter()
            .filter_map(|port| map_port(&raw.id, port, &mut warnings))
            .collect();

        workloads.push(TopologyWorkload {
            id: raw.id.clone(),
            name: raw.name.clone(),
            image: raw.image.clone(),
            state: raw.state.clone(),
            runtime: raw.runtime.clone(),
            interfaces,
            exposed_ports,
            labels: raw.labels.clone(),
            discovery: discovery_info(raw),
            health_status: raw.health_status.clone(),
            resource_limits: raw.resource_limits.as_ref().and_then(convert_limits),
        });
    }

    debug!("Mapped {} workloads", workloads.len());
    (workloads, warnings)
}

fn map_interface(
    workload_id: &str,
    att: &RawAttachment,
    warnings: &mut Vec<AnalysisWarning>,
) -> Option<WorkloadInterface> {
    if att.network_id.is_empty() && att.network_name.is_empty() {
        record(
            warnings,
            AnalysisWarning::new(
                Phase::WorkloadMapping,
                workload_id,
                "network attachment names no network",
            ),
        );
        return None;
    }

    let ip_address = keep(parse_ip(&att.ip_address), workload_id, warnings);
    let mac_address = keep(normalize_mac(&att.mac_address), workload_id, warnings);
    let gateway = keep(parse_ip(&att.gateway), workload_id, warnings);
    let subnet = keep(
        parse_subnet(&att.subnet).map(|net| net.map(|n| n.to_string())),
        workload_id,
        warnings,
    );

    Some(WorkloadInterface {
        network_id: att.network_id.clone(),
        network_name: att.network_name.clone(),
        ip_address,
        mac_address,
        gateway,
        subnet,
        mtu: att.mtu.filter(|mtu| *mtu > 0),
    })
}

/// Keeps a parsed optional field, or drops it with a warning.
fn keep<T>(
    result: Result<Option<T>, String>,
    workload_id: &str,
    warnings: &mut Vec<AnalysisWarning>,
) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(message) => {
            record(warnings, AnalysisWarning::new(Phase::WorkloadMapping, workload_id, message));
            None
        }
    }
}

fn map_port(
    workload_id: &str,
    port: &RawPortExposure,
    warnings: &mut Vec<AnalysisWarning>,
) -> Option<ExposedPort> {
    if port.container_port == 0 {
        record(
            warnings,
            AnalysisWarning::new(Phase::WorkloadMapping, workload_id, "exposed port 0 skipped"),
        );
        return None;
    }

    let protocol = match port.protocol.trim() {
        "" => DEFAULT_PROTOCOL.to_string(),
        other => other.to_ascii_lowercase(),
    };

    Some(ExposedPort {
        container_port: port.container_port,
        host_port: port.host_port.filter(|p| *p > 0),
        host_ip: port.host_ip.clone(),
        protocol,
        service_name: well_known_port_name(port.container_port).map(str::to_string),
    })
}

/// Conventional service name for a port, if it has one.
pub fn well_known_port_name(port: u16) -> Option<&'static str> {
    let name = match port {
        80 => "http",
        443 => "https",
        3000 | 4200 => "http-dev",
        3306 => "mysql",
        5432 => "postgres",
        5672 => "amqp",
        6379 => "redis",
        8080 => "http-alt",
        9092 => "kafka",
        27017 => "mongodb",
        _ => return None,
    };
    Some(name)
}

fn discovery_info(raw: &RawWorkload) -> DiscoveryInfo {
    let dns_name = raw
        .labels
        .get(DNS_NAME_LABEL)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let tags = raw
        .labels
        .get(TAGS_LABEL)
        .map(|tags| {
            tags.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    DiscoveryInfo { dns_name, tags }
}

fn convert_limits(raw: &RawResourceLimits) -> Option<ResourceLimits> {
    let memory_limit = (raw.memory > 0).then(|| raw.memory.to_string());
    let cpu_limit = (raw.cpu_quota > 0 && raw.cpu_period > 0)
        .then(|| format!("{:.2}", raw.cpu_quota as f64 / raw.cpu_period as f64));

    if memory_limit.is_none() && cpu_limit.is_none() {
        return None;
    }
    Some(ResourceLimits { memory_limit, cpu_limit })
}
