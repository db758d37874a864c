//! Shared User-Agent string for probe and download HTTP clients.
//!
//! Probe and download traffic identify the same way so servers see one tool.

/// Tool label appended after the version.
const TOOL_LABEL: &str = "favicon-resolver";

/// Default User-Agent for every request the crate issues.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("favicons/{version} ({TOOL_LABEL})")
}
