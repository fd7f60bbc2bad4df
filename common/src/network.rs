//! Address normalization for values that arrive as free-form strings.

pub mod mac;
pub mod subnet;

use std::net::IpAddr;

/// Parses an interface or gateway address. Empty input is "absent", not an error.
pub fn parse_ip(raw: &str) -> Result<Option<IpAddr>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<IpAddr>()
        .map(Some)
        .map_err(|e| format!("invalid address '{trimmed}': {e}"))
}
