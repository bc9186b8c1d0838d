//! Validation helpers
//!
//! Pure string checks used by attribute types. Every helper returns
//! `Err(message)` with a human readable reason and never touches the network.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use regex::Regex;

static HOSTNAME_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?$").unwrap());

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$").unwrap()
});

static ID_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+$").unwrap());

static COUNTRY_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]{2}$").unwrap());

/// Validate CIDR block format (e.g., "10.0.0.0/16" or "2001:db8::/32")
pub fn validate_cidr(cidr: &str) -> Result<(), String> {
    let Some((ip, prefix)) = cidr.split_once('/') else {
        return Err(format!(
            "Invalid CIDR format '{}': expected IP/prefix",
            cidr
        ));
    };

    let max_prefix = match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => 32,
        Ok(IpAddr::V6(_)) => 128,
        Err(_) => return Err(format!("Invalid IP address '{}' in CIDR '{}'", ip, cidr)),
    };

    match prefix.parse::<u8>() {
        Ok(p) if p <= max_prefix => Ok(()),
        Ok(p) => Err(format!(
            "Invalid prefix length '{}': must be 0-{}",
            p, max_prefix
        )),
        Err(_) => Err(format!(
            "Invalid prefix length '{}': must be a number",
            prefix
        )),
    }
}

/// Validate an IPv4 or IPv6 address literal
pub fn validate_ip(ip: &str) -> Result<(), String> {
    if ip.parse::<Ipv4Addr>().is_ok() || ip.parse::<Ipv6Addr>().is_ok() {
        Ok(())
    } else {
        Err(format!("Invalid IP address '{}'", ip))
    }
}

/// Validate a DNS hostname; a leading `*.` wildcard label is accepted
pub fn validate_hostname(hostname: &str) -> Result<(), String> {
    let name = hostname.strip_prefix("*.").unwrap_or(hostname);
    let name = name.strip_suffix('.').unwrap_or(name);

    if name.is_empty() || name.len() > 253 {
        return Err(format!(
            "Invalid hostname '{}': must be 1-253 characters",
            hostname
        ));
    }

    if let Some(label) = name.split('.').find(|l| !HOSTNAME_LABEL.is_match(l)) {
        return Err(format!(
            "Invalid hostname '{}': label '{}' is not a valid DNS label",
            hostname, label
        ));
    }

    Ok(())
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if EMAIL.is_match(email) {
        Ok(())
    } else {
        Err(format!("Invalid email address '{}'", email))
    }
}

/// Validate that an ID carries the expected type prefix (e.g., "usr" for "usr-abc123")
pub fn validate_id_prefix(id: &str, prefix: &str) -> Result<(), String> {
    match id.split_once('-') {
        Some((p, rest)) if p == prefix && ID_SUFFIX.is_match(rest) => Ok(()),
        _ => Err(format!(
            "Invalid ID '{}': expected format {}-<id>",
            id, prefix
        )),
    }
}

/// Validate that an ID carries one of several allowed prefixes
pub fn validate_id_prefixes(id: &str, prefixes: &[&str]) -> Result<(), String> {
    if prefixes
        .iter()
        .any(|prefix| validate_id_prefix(id, prefix).is_ok())
    {
        Ok(())
    } else {
        Err(format!(
            "Invalid ID '{}': expected a prefix of {}",
            id,
            prefixes.join(", ")
        ))
    }
}

/// Validate enum membership
pub fn validate_enum(value: &str, allowed: &[&str]) -> Result<(), String> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(format!(
            "Invalid value '{}', expected one of: {}",
            value,
            allowed.join(", ")
        ))
    }
}

/// Validate a TCP/UDP port number
pub fn validate_port(port: i64) -> Result<(), String> {
    if (1..=65535).contains(&port) {
        Ok(())
    } else {
        Err(format!("Invalid port {}: must be 1-65535", port))
    }
}

/// Validate an ISO 3166-1 alpha-2 country code (e.g., "US")
pub fn validate_country_code(code: &str) -> Result<(), String> {
    if COUNTRY_CODE.is_match(code) {
        Ok(())
    } else {
        Err(format!(
            "Invalid country code '{}': expected two uppercase letters",
            code
        ))
    }
}

/// Validate an http(s) URL
pub fn validate_url(raw: &str) -> Result<(), String> {
    let rest = raw
        .strip_prefix("https://")
        .or_else(|| raw.strip_prefix("http://"))
        .ok_or_else(|| format!("Invalid URL '{}': must start with http:// or https://", raw))?;

    let host = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host = match host.rsplit_once(':') {
        Some((h, port)) if !h.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => h,
        _ => host,
    };

    validate_hostname(host)
        .or_else(|_| validate_ip(host.trim_start_matches('[').trim_end_matches(']')))
        .map_err(|_| format!("Invalid URL '{}': bad host '{}'", raw, host))
}
