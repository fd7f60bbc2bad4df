//! # Service Discovery
//!
//! Groups mapped workloads into logical services.
//!
//! Identity comes from the ordered rules in [`inference`]; everything else a
//! service carries (endpoints, merged labels, policy attachments) is collected
//! from its member workloads in inventory order.

pub mod inference;

use std::collections::HashMap;
use std::str::FromStr;

use topomap_common::topology::{
    AnalysisWarning, CircuitBreakerConfig, HealthCheckConfig, LoadBalancerConfig, Phase,
    ServiceEndpoint, TopologyService, TopologyWorkload, TrafficPolicy,
};
use tracing::{debug, info};

use crate::mapping::record;
use inference::{infer_service_name, infer_service_type};

const SERVICE_LABEL_PREFIX: &str = "service.";
const ANNOTATION_PREFIX: &str = "annotation.";

const LB_TYPE_LABEL: &str = "service.lb.type";
const LB_ALGORITHM_LABEL: &str = "service.lb.algorithm";
const LB_AFFINITY_LABEL: &str = "service.lb.affinity";
const HEALTHCHECK_ENDPOINT_LABEL: &str = "service.healthcheck.endpoint";
const HEALTHCHECK_INTERVAL_LABEL: &str = "service.healthcheck.interval";
const HEALTHCHECK_TIMEOUT_LABEL: &str = "service.healthcheck.timeout";
const CONNECT_TIMEOUT_LABEL: &str = "service.timeout.connect";
const REQUEST_TIMEOUT_LABEL: &str = "service.timeout.request";
const CB_THRESHOLD_LABEL: &str = "service.circuit_breaker.threshold";
const CB_RECOVERY_LABEL: &str = "service.circuit_breaker.recovery";

const DEFAULT_LB_ALGORITHM: &str = "round_robin";
const DEFAULT_HEALTHCHECK_INTERVAL_SECS: u64 = 30;
const DEFAULT_HEALTHCHECK_TIMEOUT_SECS: u64 = 5;
const DEFAULT_CB_RECOVERY_SECS: u64 = 30;

/// Groups workloads into services.
///
/// A workload whose name cannot be inferred joins no service. Services appear
/// in the order their first member appears; the service type is decided by
/// that first member.
pub fn discover_services(workloads: &[TopologyWorkload]) -> (Vec<TopologyService>, Vec<AnalysisWarning>) {
    let mut warnings = Vec::new();
    let mut services: Vec<TopologyService> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();
    let mut unassigned = 0usize;

    for workload in workloads {
        let Some((name, name_source)) = infer_service_name(workload) else {
            debug!("No service name for workload {}", workload.id);
            unassigned += 1;
            continue;
        };

        let idx = *by_name.entry(name.clone()).or_insert_with(|| {
            services.push(TopologyService {
                name: name.clone(),
                service_type: infer_service_type(workload),
                name_source,
                workloads: Vec::new(),
                endpoints: Vec::new(),
                load_balancer: None,
                health_checks: Vec::new(),
                traffic_policy: None,
                labels: Default::default(),
                annotations: Default::default(),
            });
            services.len() - 1
        });

        absorb(&mut services[idx], workload, &mut warnings);
    }

    info!(
        "Discovered {} services ({} workloads left unassigned)",
        services.len(),
        unassigned
    );
    (services, warnings)
}

fn absorb(service: &mut TopologyService, workload: &TopologyWorkload, warnings: &mut Vec<AnalysisWarning>) {
    service.workloads.push(workload.id.clone());

    let address = workload.primary_address();
    for port in &workload.exposed_ports {
        let endpoint = ServiceEndpoint {
            address,
            port: port.container_port,
            protocol: port.protocol.clone(),
        };
        if !service.endpoints.contains(&endpoint) {
            service.endpoints.push(endpoint);
        }
    }

    for (key, value) in &workload.labels {
        if let Some(stripped) = key.strip_prefix(SERVICE_LABEL_PREFIX) {
            service.labels.insert(stripped.to_string(), value.clone());
        } else if let Some(stripped) = key.strip_prefix(ANNOTATION_PREFIX) {
            service.annotations.insert(stripped.to_string(), value.clone());
        }
    }

    let mut policy = PolicyReader {
        workload,
        service: &service.name,
        warnings,
    };

    if service.load_balancer.is_none() {
        service.load_balancer = policy.load_balancer();
    }
    if let Some(check) = policy.health_check() {
        if !service.health_checks.contains(&check) {
            service.health_checks.push(check);
        }
    }
    if service.traffic_policy.is_none() {
        service.traffic_policy = policy.traffic_policy();
    }
}

/// Reads policy attachments from one workload's labels, recording malformed values.
struct PolicyReader<'a> {
    workload: &'a TopologyWorkload,
    service: &'a str,
    warnings: &'a mut Vec<AnalysisWarning>,
}

impl PolicyReader<'_> {
    fn text(&self, key: &str) -> Option<String> {
        self.workload
            .label(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn number<T: FromStr>(&mut self, key: &str) -> Option<T> {
        let raw = self.text(key)?;
        match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(_) => {
                record(
                    self.warnings,
                    AnalysisWarning::new(
                        Phase::ServiceDiscovery,
                        self.service,
                        format!("ignoring {key}={raw:?} on {}: not a number", self.workload.id),
                    ),
                );
                None
            }
        }
    }

    fn load_balancer(&mut self) -> Option<LoadBalancerConfig> {
        let kind = self.text(LB_TYPE_LABEL)?;
        let algorithm = self
            .text(LB_ALGORITHM_LABEL)
            .unwrap_or_else(|| DEFAULT_LB_ALGORITHM.to_string());
        let session_affinity = self
            .text(LB_AFFINITY_LABEL)
            .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "yes" | "1" | "client_ip"));
        Some(LoadBalancerConfig {
            kind,
            algorithm,
            session_affinity,
        })
    }

    fn health_check(&mut self) -> Option<HealthCheckConfig> {
        let endpoint = self.text(HEALTHCHECK_ENDPOINT_LABEL)?;
        Some(HealthCheckConfig {
            endpoint,
            interval_secs: self
                .number(HEALTHCHECK_INTERVAL_LABEL)
                .unwrap_or(DEFAULT_HEALTHCHECK_INTERVAL_SECS),
            timeout_secs: self
                .number(HEALTHCHECK_TIMEOUT_LABEL)
                .unwrap_or(DEFAULT_HEALTHCHECK_TIMEOUT_SECS),
        })
    }

    fn traffic_policy(&mut self) -> Option<TrafficPolicy> {
        let circuit_breaker = self
            .number::<u32>(CB_THRESHOLD_LABEL)
            .map(|failure_threshold| CircuitBreakerConfig {
                failure_threshold,
                recovery_timeout_secs: self.number(CB_RECOVERY_LABEL).unwrap_or(DEFAULT_CB_RECOVERY_SECS),
            });
        let policy = TrafficPolicy {
            connect_timeout_secs: self.number(CONNECT_TIMEOUT_LABEL),
            request_timeout_secs: self.number(REQUEST_TIMEOUT_LABEL),
            circuit_breaker,
        };
        (!policy.is_empty()).then_some(policy)
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
