//! Output file naming: one `{domain}.ico` per normalized domain.

use std::path::{Component, Path};

/// Extension of every downloaded favicon.
pub const ICON_EXTENSION: &str = "ico";

/// Returns the output file name for `domain`, or `None` when the domain
/// cannot name a file inside the output directory.
///
/// Ordinary hostnames map to `{domain}.ico` unchanged. Characters that are
/// unsafe in file names (a port colon, for instance) collapse to `_`.
#[must_use]
pub fn icon_file_name(domain: &str) -> Option<String> {
    let stem = sanitize_domain(domain);
    if stem.is_empty() || stem.chars().all(|c| c == '.') || !is_single_segment(&stem) {
        return None;
    }
    Some(format!("{stem}.{ICON_EXTENSION}"))
}

fn sanitize_domain(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_sep = false;
    for ch in value.trim().chars() {
        let mapped = match ch {
            c if c.is_alphanumeric() || matches!(c, '-' | '.') => c,
            _ => '_',
        };
        if mapped == '_' {
            if !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else {
            out.push(mapped);
            prev_sep = false;
        }
    }
    out.trim_matches('_').to_string()
}

fn is_single_segment(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none()
}
