//! Wildcard stripping for domain list entries.

use std::sync::LazyLock;

use regex::Regex;

use crate::utils::compile_static_regex;

/// Matches a `*.` marker followed by at least one character.
///
/// The leading greedy `.*` anchors on the last marker, so stripping once
/// leaves nothing for a second pass to strip.
static WILDCARD_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"^.*\*\.(.+)$"));

/// Strips a wildcard prefix from a raw domain entry.
///
/// `*.example.com` becomes `example.com`; anything without a `*.` marker
/// followed by text is returned unchanged (after trimming whitespace).
///
/// ```
/// use favicon_core::domain::normalize;
///
/// assert_eq!(normalize("*.example.com"), "example.com");
/// assert_eq!(normalize("example.com"), "example.com");
/// ```
#[must_use]
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    WILDCARD_RE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| trimmed.to_string(), |m| m.as_str().to_string())
}
