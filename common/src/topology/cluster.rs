use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterType {
    NetworkScoped,
    DeploymentProject,
    Environment,
    Logical,
}

impl ClusterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkScoped => "network_scoped",
            Self::DeploymentProject => "deployment_project",
            Self::Environment => "environment",
            Self::Logical => "logical",
        }
    }
}

impl fmt::Display for ClusterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ClusterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "network_scoped" | "network" => Ok(Self::NetworkScoped),
            "deployment_project" | "project" => Ok(Self::DeploymentProject),
            "environment" => Ok(Self::Environment),
            "logical" => Ok(Self::Logical),
            other => Err(format!("unknown cluster type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    Strict,
    Moderate,
    Permissive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCluster {
    pub id: String,
    pub name: String,
    pub cluster_type: ClusterType,
    pub members: Vec<ClusterMember>,
    pub subnets: Vec<String>,
    pub isolation: IsolationLevel,
    pub policies: Vec<NetworkPolicyRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<ClusterGateway>,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMember {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyAction {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyDirection {
    Ingress,
    Egress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPolicyRule {
    pub action: PolicyAction,
    pub direction: PolicyDirection,
    /// Free-form selector, e.g. `cluster` or `external`.
    pub peer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterGateway {
    pub kind: String,
    pub address: String,
}
