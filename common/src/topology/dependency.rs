use std::fmt;

use serde::{Deserialize, Serialize};

use super::service::CircuitBreakerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    Synchronous,
    Asynchronous,
    Optional,
}

/// Ordered from least to most severe so the worst impact can be taken with `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthImpactLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for HealthImpactLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDependency {
    pub source_service: String,
    pub target_service: String,
    pub dependency_type: DependencyType,
    pub protocol: String,
    pub ports: Vec<u16>,
    pub required: bool,
    pub health_impact: HealthImpactLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circuit_breaker: Option<CircuitBreakerConfig>,
}
