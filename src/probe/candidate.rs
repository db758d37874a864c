//! Icon candidates and the `.ico` selection rule.

use serde::Serialize;

/// Format tag the selection rule requires.
pub const ICO_FORMAT: &str = "ico";

/// Literal URL suffix the selection rule requires (case-sensitive).
pub const ICO_SUFFIX: &str = ".ico";

/// An icon reference discovered while probing a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IconCandidate {
    /// Absolute icon URL.
    pub url: String,
    /// Declared format: lower-cased file extension of the URL path, without
    /// the dot. Empty when the path has no extension.
    pub format: String,
    /// Declared width in pixels (0 when unknown).
    pub width: u32,
    /// Declared height in pixels (0 when unknown).
    pub height: u32,
}

impl IconCandidate {
    /// Creates a candidate with unknown dimensions.
    #[must_use]
    pub fn new(url: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: format.into(),
            width: 0,
            height: 0,
        }
    }

    /// Sets declared dimensions.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sort key used to order candidates largest first.
    #[must_use]
    pub fn area_hint(&self) -> u64 {
        u64::from(self.width) + u64::from(self.height)
    }

    /// Returns true if this candidate satisfies the selection rule: format
    /// exactly `"ico"` and URL ending in `.ico`.
    #[must_use]
    pub fn is_ico(&self) -> bool {
        self.format == ICO_FORMAT && self.url.ends_with(ICO_SUFFIX)
    }
}

/// Selects the first candidate satisfying [`IconCandidate::is_ico`].
///
/// Candidates are scanned in the order given; no other ranking applies.
#[must_use]
pub fn select_favicon(candidates: &[IconCandidate]) -> Option<&IconCandidate> {
    candidates.iter().find(|candidate| candidate.is_ico())
}

/// Orders candidates largest first, keeping discovery order among equals.
pub fn sort_largest_first(candidates: &mut [IconCandidate]) {
    candidates.sort_by_key(|candidate| std::cmp::Reverse(candidate.area_hint()));
}
