use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkType {
    Bridge,
    Host,
    Overlay,
    Macvlan,
    Custom,
}

impl NetworkType {
    /// Exact match on the driver name; anything unrecognised is `Custom`.
    pub fn from_driver(driver: &str) -> Self {
        match driver {
            "bridge" => Self::Bridge,
            "host" => Self::Host,
            "overlay" => Self::Overlay,
            "macvlan" => Self::Macvlan,
            _ => Self::Custom,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bridge => "bridge",
            Self::Host => "host",
            Self::Overlay => "overlay",
            Self::Macvlan => "macvlan",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyNetwork {
    pub id: String,
    pub name: String,
    pub driver: String,
    pub scope: String,
    /// CIDR block, empty when the provider did not report one.
    pub subnet: String,
    pub gateway: String,
    pub internal: bool,
    pub attachable: bool,
    pub network_type: NetworkType,
    pub labels: BTreeMap<String, String>,
    pub options: BTreeMap<String, String>,
    pub connected_workloads: Vec<String>,
    pub runtime: String,
}

impl TopologyNetwork {
    pub fn is_bridge(&self) -> bool {
        self.driver == "bridge"
    }
}
