//! Ordered inference chains for service identity.
//!
//! Each chain is a list of functions tried in priority order; the first one
//! that answers wins.

use topomap_common::topology::{NameSource, ServiceType, TopologyWorkload};

pub const DEPLOYMENT_SERVICE_LABEL: &str = "com.docker.compose.service";
pub const DEPLOYMENT_GROUP_LABEL: &str = "com.docker.compose.project";
pub const SERVICE_NAME_LABEL: &str = "service.name";
pub const SERVICE_TYPE_LABEL: &str = "service.type";

type NameRule = fn(&TopologyWorkload) -> Option<(String, NameSource)>;
type TypeRule = fn(&TopologyWorkload) -> Option<ServiceType>;

const NAME_RULES: &[NameRule] = &[name_from_deployment_label, name_from_service_label, name_from_display_name];
const TYPE_RULES: &[TypeRule] = &[type_from_label, type_from_image, type_from_ports];

/// Keyword families shared by the label vocabulary and the image match.
const KEYWORDS: &[(ServiceType, &[&str])] = &[
    (ServiceType::Web, &["web", "http", "frontend"]),
    (ServiceType::Api, &["api", "rest", "grpc"]),
    (ServiceType::Database, &["database", "db", "mysql", "postgres", "mongodb"]),
    (ServiceType::Cache, &["cache", "redis", "memcached"]),
    (ServiceType::Queue, &["queue", "kafka", "rabbitmq"]),
    (ServiceType::Worker, &["worker", "job"]),
    (ServiceType::Proxy, &["proxy", "nginx", "haproxy"]),
];

/// Family order for substring matching on image references:
/// `postgres-api-gateway` is a database, not an api.
const IMAGE_ORDER: [ServiceType; 7] = [
    ServiceType::Database,
    ServiceType::Cache,
    ServiceType::Queue,
    ServiceType::Proxy,
    ServiceType::Web,
    ServiceType::Worker,
    ServiceType::Api,
];

pub fn infer_service_name(workload: &TopologyWorkload) -> Option<(String, NameSource)> {
    NAME_RULES.iter().find_map(|rule| rule(workload))
}

pub fn infer_service_type(workload: &TopologyWorkload) -> ServiceType {
    TYPE_RULES
        .iter()
        .find_map(|rule| rule(workload))
        .unwrap_or(ServiceType::Other)
}

/// Exact, case-insensitive lookup in the label vocabulary.
pub fn classify_keyword(value: &str) -> Option<ServiceType> {
    let value = value.trim().to_ascii_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.contains(&value.as_str()))
        .map(|(service_type, _)| *service_type)
}

pub fn classify_port(port: u16) -> Option<ServiceType> {
    match port {
        80 | 8080 | 3000 | 4200 => Some(ServiceType::Web),
        3306 | 5432 | 27017 => Some(ServiceType::Database),
        6379 => Some(ServiceType::Cache),
        5672 | 9092 => Some(ServiceType::Queue),
        _ => None,
    }
}

fn non_empty_label(workload: &TopologyWorkload, key: &str) -> Option<String> {
    workload
        .label(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn name_from_deployment_label(workload: &TopologyWorkload) -> Option<(String, NameSource)> {
    non_empty_label(workload, DEPLOYMENT_SERVICE_LABEL).map(|name| (name, NameSource::DeploymentLabel))
}

fn name_from_service_label(workload: &TopologyWorkload) -> Option<(String, NameSource)> {
    non_empty_label(workload, SERVICE_NAME_LABEL).map(|name| (name, NameSource::ServiceLabel))
}

/// Second-to-last `_`/`-` delimited token of the display name, so
/// `shop_api_1` groups under `api`. Single-token names yield nothing.
fn name_from_display_name(workload: &TopologyWorkload) -> Option<(String, NameSource)> {
    let name = workload.name.trim_start_matches('/');
    let tokens: Vec<&str> = name.split(['_', '-']).collect();
    if tokens.len() < 2 {
        return None;
    }
    let candidate = tokens[tokens.len() - 2];
    if candidate.is_empty() {
        return None;
    }
    Some((candidate.to_string(), NameSource::NameHeuristic))
}

fn type_from_label(workload: &TopologyWorkload) -> Option<ServiceType> {
    workload.label(SERVICE_TYPE_LABEL).and_then(classify_keyword)
}

fn type_from_image(workload: &TopologyWorkload) -> Option<ServiceType> {
    let image = workload.image.to_ascii_lowercase();
    if image.is_empty() {
        return None;
    }
    IMAGE_ORDER.iter().copied().find(|service_type| {
        KEYWORDS
            .iter()
            .filter(|(t, _)| t == service_type)
            .flat_map(|(_, words)| words.iter())
            .any(|word| image.contains(word))
    })
}

fn type_from_ports(workload: &TopologyWorkload) -> Option<ServiceType> {
    workload
        .exposed_ports
        .iter()
        .find_map(|port| classify_port(port.container_port))
}
