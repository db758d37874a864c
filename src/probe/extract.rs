//! Icon declaration extraction from HTML.
//!
//! Recognised declarations, in document order:
//! - `<link>` tags whose `rel` contains `icon`, `apple-touch-icon` or
//!   `apple-touch-icon-precomposed` and that carry an `href`
//! - `<meta>` tags named (`name` or `property`) `msapplication-TileImage` or
//!   `og:image` that carry a `content`

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::candidate::IconCandidate;
use crate::utils::compile_static_regex;

const ICON_RELS: &[&str] = &["icon", "apple-touch-icon", "apple-touch-icon-precomposed"];
const ICON_META_NAMES: &[&str] = &["msapplication-tileimage", "og:image"];

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?is)<(link|meta)\b([^>]*)>"));
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#,
    )
});
static SIZE_IN_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?i)(\d{2,4})x(\d{2,4})"));

/// Extracts icon candidates declared in `html`, resolving hrefs against `page_url`.
///
/// Candidates come back in document order; ranking is left to the caller.
#[must_use]
pub fn extract_icon_links(page_url: &Url, html: &str) -> Vec<IconCandidate> {
    TAG_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let tag = caps.get(1)?.as_str().to_ascii_lowercase();
            let attrs = parse_attributes(caps.get(2)?.as_str());
            let href = match tag.as_str() {
                "link" if declares_icon_rel(&attrs) => attrs.get("href")?,
                "meta" if declares_icon_meta(&attrs) => attrs.get("content")?,
                _ => return None,
            };
            candidate_from_href(page_url, href, attrs.get("sizes").map(String::as_str))
        })
        .collect()
}

/// Returns the declared format of an icon URL: its lower-cased path extension.
#[must_use]
pub fn format_from_url(url: &Url) -> String {
    let last_segment = url.path().rsplit('/').next().unwrap_or_default();
    last_segment
        .trim_start_matches('.')
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

fn candidate_from_href(page_url: &Url, href: &str, sizes: Option<&str>) -> Option<IconCandidate> {
    let href = decode_entities(href.trim());
    if href.is_empty() || href.starts_with("data:image/") {
        return None;
    }

    let resolved = page_url.join(&href).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }

    let (width, height) = sizes
        .and_then(parse_sizes_attribute)
        .or_else(|| size_from_name(&href))
        .unwrap_or((0, 0));
    let format = format_from_url(&resolved);
    Some(IconCandidate::new(resolved.to_string(), format).with_size(width, height))
}

fn declares_icon_rel(attrs: &HashMap<String, String>) -> bool {
    attrs.get("rel").is_some_and(|rel| {
        rel.split_ascii_whitespace()
            .any(|token| ICON_RELS.iter().any(|r| token.eq_ignore_ascii_case(r)))
    })
}

fn declares_icon_meta(attrs: &HashMap<String, String>) -> bool {
    attrs
        .get("name")
        .or_else(|| attrs.get("property"))
        .is_some_and(|name| {
            ICON_META_NAMES
                .iter()
                .any(|n| name.trim().eq_ignore_ascii_case(n))
        })
}

fn parse_attributes(raw: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    for caps in ATTR_RE.captures_iter(raw) {
        let Some(name) = caps.get(1) else { continue };
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map_or("", |m| m.as_str());
        // First occurrence wins, as in browsers.
        attrs
            .entry(name.as_str().to_ascii_lowercase())
            .or_insert_with(|| value.to_string());
    }
    attrs
}

/// Parses a `sizes` attribute (`"16x16 32x32"`) and returns the largest entry.
fn parse_sizes_attribute(sizes: &str) -> Option<(u32, u32)> {
    if sizes.trim().eq_ignore_ascii_case("any") {
        return None;
    }
    sizes
        .split_ascii_whitespace()
        .filter_map(parse_dimension_pair)
        .max_by_key(|(w, h)| u64::from(*w) + u64::from(*h))
}

fn parse_dimension_pair(value: &str) -> Option<(u32, u32)> {
    let (w, h) = value.split_once(['x', 'X', '\u{d7}'])?;
    Some((digits_to_u32(w)?, digits_to_u32(h)?))
}

fn size_from_name(href: &str) -> Option<(u32, u32)> {
    let caps = SIZE_IN_NAME_RE.captures(href)?;
    Some((
        digits_to_u32(caps.get(1)?.as_str())?,
        digits_to_u32(caps.get(2)?.as_str())?,
    ))
}

fn digits_to_u32(value: &str) -> Option<u32> {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&amp;", "&")
        .replace("&#38;", "&")
        .replace("&#x2F;", "/")
        .replace("&#47;", "/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://www.example.com/blog/index.html").unwrap()
    }

    #[test]
    fn test_extracts_shortcut_icon_relative_href() {
        let html = r#"<html><head>
            <link rel="shortcut icon" href="/favicon.ico" type="image/x-icon">
        </head></html>"#;
        let icons = extract_icon_links(&page(), html);
        assert_eq!(icons.len(), 1);
        assert_eq!(icons[0].url, "https://www.example.com/favicon.ico");
        assert_eq!(icons[0].format, "ico");
    }

    #[test]
    fn test_extracts_in_document_order_with_sizes() {
        let html = r#"
            <link rel="apple-touch-icon" sizes="180x180" href="/apple-touch-icon.png">
            <link rel="icon" type="image/png" sizes="16x16 32x32" href="icons/fav.png">
            <link rel="stylesheet" href="/main.css">
            <meta property="og:image" content="https://cdn.example.com/og-1200x630.jpg">
        "#;
        let icons = extract_icon_links(&page(), html);
        let summary: Vec<(&str, &str, u32)> = icons
            .iter()
            .map(|c| (c.url.as_str(), c.format.as_str(), c.width))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("https://www.example.com/apple-touch-icon.png", "png", 180),
                ("https://www.example.com/blog/icons/fav.png", "png", 32),
                ("https://cdn.example.com/og-1200x630.jpg", "jpg", 1200),
            ]
        );
    }

    #[test]
    fn test_protocol_relative_href_takes_page_scheme() {
        let page = Url::parse("http://example.com/").unwrap();
        let html = r#"<link rel=icon href=//static.example.com/favicon.ico>"#;
        let icons = extract_icon_links(&page, html);
        assert_eq!(icons[0].url, "http://static.example.com/favicon.ico");
    }

    #[test]
    fn test_data_uri_and_empty_href_skipped() {
        let html = r#"
            <link rel="icon" href="data:image/png;base64,iVBORw0KGgo=">
            <link rel="icon" href="  ">
            <link rel="icon">
        "#;
        assert!(extract_icon_links(&page(), html).is_empty());
    }

    #[test]
    fn test_rel_and_attribute_names_are_case_insensitive() {
        let html = r#"<LINK REL='Shortcut Icon' HREF='/Favicon.ico'>"#;
        let icons = extract_icon_links(&page(), html);
        assert_eq!(icons.len(), 1);
        assert_eq!(icons[0].url, "https://www.example.com/Favicon.ico");
        assert_eq!(icons[0].format, "ico");
    }

    #[test]
    fn test_mask_icon_is_not_an_icon_rel() {
        let html = r##"<link rel="mask-icon" href="/safari.svg" color="#000">"##;
        assert!(extract_icon_links(&page(), html).is_empty());
    }

    #[test]
    fn test_msapplication_tile_image_meta() {
        let html = r#"<meta name="msapplication-TileImage" content="/mstile-144x144.png">"#;
        let icons = extract_icon_links(&page(), html);
        assert_eq!(icons[0].url, "https://www.example.com/mstile-144x144.png");
        assert_eq!((icons[0].width, icons[0].height), (144, 144));
    }

    #[test]
    fn test_query_string_kept_and_entities_decoded() {
        let html = r#"<link rel="icon" href="/favicon.ico?v=2&amp;t=1">"#;
        let icons = extract_icon_links(&page(), html);
        assert_eq!(icons[0].url, "https://www.example.com/favicon.ico?v=2&t=1");
        assert_eq!(icons[0].format, "ico");
        assert!(!icons[0].is_ico(), "query string breaks the .ico suffix");
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        let html = r#"<link rel="icon" href="javascript:alert(1)">"#;
        assert!(extract_icon_links(&page(), html).is_empty());
    }

    #[test]
    fn test_format_from_url() {
        let parse = |s: &str| Url::parse(s).unwrap();
        assert_eq!(format_from_url(&parse("https://x/a/favicon.ICO")), "ico");
        assert_eq!(format_from_url(&parse("https://x/icon")), "");
        assert_eq!(format_from_url(&parse("https://x/a.b/icon")), "");
        assert_eq!(format_from_url(&parse("https://x/.ico")), "");
        assert_eq!(format_from_url(&parse("https://x/icon.php?f=a.ico")), "php");
    }

    #[test]
    fn test_sizes_any_falls_back_to_name() {
        assert_eq!(parse_sizes_attribute("any"), None);
        assert_eq!(parse_sizes_attribute("16x16 48x48 32x32"), Some((48, 48)));
        assert_eq!(size_from_name("/icon-96x96.png"), Some((96, 96)));
        assert_eq!(size_from_name("/icon.png"), None);
    }
}
