use std::str::FromStr;

use pnet::util::MacAddr;

/// Normalizes a MAC address to lowercase colon-separated form.
///
/// Returns `Ok(None)` for an empty value and an error message for anything
/// that is not a 6-octet hardware address.
pub fn normalize_mac(raw: &str) -> Result<Option<String>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    MacAddr::from_str(&trimmed.replace('-', ":"))
        .map(|mac| Some(mac.to_string()))
        .map_err(|_| format!("invalid MAC address '{trimmed}'"))
}
