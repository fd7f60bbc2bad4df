//! # Validation
//!
//! Structural and hygiene checks over a finished snapshot. Findings are
//! advisory; nothing here fails an analysis.

use std::fmt;

use serde::{Deserialize, Serialize};
use topomap_common::network::subnet::subnet_contains;
use topomap_common::topology::{short_id, ConnectionStatus, TopologyNetwork, TopologySnapshot, WorkloadInterface};

const DENSITY_THRESHOLD: f64 = 0.8;
const CYCLOMATIC_THRESHOLD: i64 = 50;
const CROWDED_BRIDGE_THRESHOLD: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "warning",
            Self::Info => "info",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
}

impl ValidationIssue {
    fn warning(message: String) -> Self {
        Self {
            severity: Severity::Warning,
            message,
        }
    }

    fn info(message: &str) -> Self {
        Self {
            severity: Severity::Info,
            message: message.to_string(),
        }
    }
}

pub fn validate(snapshot: &TopologySnapshot) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for w in snapshot.workloads.iter().filter(|w| w.interfaces.is_empty()) {
        issues.push(ValidationIssue::warning(format!(
            "Workload {} ({}) has no network interfaces",
            w.name,
            short_id(&w.id, 12)
        )));
    }

    for s in snapshot.services.iter().filter(|s| s.workloads.is_empty()) {
        issues.push(ValidationIssue::warning(format!("Service {} has no workloads", s.name)));
    }

    let failed = snapshot.connections_with_status(ConnectionStatus::Failed).len();
    if failed > 0 {
        issues.push(ValidationIssue::warning(format!(
            "{failed} connections are in failed state"
        )));
    }

    let complexity = &snapshot.summary.complexity;
    if complexity.connection_density > DENSITY_THRESHOLD {
        issues.push(ValidationIssue::info(
            "High connection density (>80%) may indicate over-coupling",
        ));
    }
    if complexity.cyclomatic_complexity > CYCLOMATIC_THRESHOLD {
        issues.push(ValidationIssue::info(
            "High cyclomatic complexity may indicate complex dependencies",
        ));
    }

    for net in &snapshot.networks {
        if net.is_bridge() && !net.internal && net.connected_workloads.len() > CROWDED_BRIDGE_THRESHOLD {
            issues.push(ValidationIssue::warning(format!(
                "Network {} has many workloads ({}) on an external bridge",
                net.name,
                net.connected_workloads.len()
            )));
        }
    }

    for w in &snapshot.workloads {
        for intf in &w.interfaces {
            let Some(ip) = intf.ip_address else { continue };
            let Some(subnet) = claimed_subnet(intf, &snapshot.networks) else { continue };
            if subnet_contains(subnet, ip) == Some(false) {
                issues.push(ValidationIssue::warning(format!(
                    "Workload {} address {} is outside subnet {} of network {}",
                    w.name, ip, subnet, intf.network_name
                )));
            }
        }
    }

    issues
}

/// Subnet of the network record the interface belongs to, falling back to the
/// subnet reported on the attachment itself.
fn claimed_subnet<'a>(intf: &'a WorkloadInterface, networks: &'a [TopologyNetwork]) -> Option<&'a str> {
    networks
        .iter()
        .find(|n| {
            (!intf.network_id.is_empty() && n.id == intf.network_id)
                || (intf.network_id.is_empty() && n.name == intf.network_name)
        })
        .map(|n| n.subnet.as_str())
        .filter(|s| !s.is_empty())
        .or(intf.subnet.as_deref())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
