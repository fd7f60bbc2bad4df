use std::net::IpAddr;
use std::str::FromStr;

use pnet::ipnetwork::IpNetwork;

/// Parses a CIDR block such as `172.18.0.0/16`.
pub fn parse_subnet(raw: &str) -> Result<Option<IpNetwork>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    IpNetwork::from_str(trimmed)
        .map(Some)
        .map_err(|e| format!("invalid subnet '{trimmed}': {e}"))
}

/// `None` when the subnet cannot be parsed, so callers can skip the check.
pub fn subnet_contains(subnet: &str, addr: IpAddr) -> Option<bool> {
    match parse_subnet(subnet) {
        Ok(Some(net)) => Some(net.contains(addr)),
        _ => None,
    }
}
