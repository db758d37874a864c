//! Registered (first-level) domain lookup backed by the Public Suffix List.
//!
//! Uses Mozilla's list compiled into the `psl` crate, so multi-label
//! suffixes such as `co.uk` or `github.io` are handled without network
//! access.

use std::net::IpAddr;

/// Returns the registrable domain (eTLD+1) of a hostname.
///
/// - `www.example.com` gives `example.com`
/// - `example.co.uk` gives `example.co.uk`
/// - `co.uk` (a bare public suffix) gives `None`
/// - IP literals give `None`
///
/// A trailing `:port` is ignored and the result is lower-cased.
#[must_use]
pub fn registered_domain(domain: &str) -> Option<String> {
    let host = bare_host(domain);
    if host.is_empty() || is_ip_literal(&host) {
        return None;
    }

    psl::domain(host.as_bytes())
        .and_then(|d| std::str::from_utf8(d.as_bytes()).ok())
        .map(str::to_string)
}

/// Returns true when `domain` already sits at registered-domain granularity.
///
/// Hosts without a registered domain (IP literals, bare suffixes) count as
/// registered too: there is nothing coarser to fall back to. The port, a
/// trailing dot and letter case are ignored, as in [`registered_domain`].
#[must_use]
pub fn is_registered_domain(domain: &str) -> bool {
    registered_domain(domain).is_none_or(|fld| fld == bare_host(domain))
}

/// Lower-cased host with port and trailing dot removed.
fn bare_host(domain: &str) -> String {
    strip_port(domain.trim())
        .trim_end_matches('.')
        .to_ascii_lowercase()
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // Bracketed IPv6, with or without port.
        return host
            .find(']')
            .map_or(host, |end| &host[..=end]);
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => {
            name
        }
        _ => host,
    }
}

fn is_ip_literal(host: &str) -> bool {
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    bare.parse::<IpAddr>().is_ok()
}
