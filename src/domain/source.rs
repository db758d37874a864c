//! Domain list loading.
//!
//! Two layouts are accepted:
//! - a CSV table whose header row holds year labels and whose cells hold
//!   domains (read column by column, header excluded);
//! - plain text with one domain per line, `#` comments allowed.
//!
//! Files named `*.csv` are always read as a table. Other input (stdin,
//! extension-less files) is a table when its first line contains a comma.
//! Either way the result is deduplicated, keeping first-seen order.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, instrument};

use super::SourceError;

/// Layout detected for a domain list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListLayout {
    /// Comma-separated columns with a header row.
    Columns,
    /// One entry per line.
    Lines,
}

/// Detects the layout of a domain list from its first meaningful line.
#[must_use]
pub fn detect_layout(text: &str) -> ListLayout {
    let first = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'));
    match first {
        Some(line) if line.contains(',') => ListLayout::Columns,
        _ => ListLayout::Lines,
    }
}

/// Picks the layout of a list file: `.csv` files always carry a header row,
/// anything else falls back to [`detect_layout`].
#[must_use]
pub fn layout_for_path(path: &Path, text: &str) -> ListLayout {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        ListLayout::Columns
    } else {
        detect_layout(text)
    }
}

/// Parses a domain list in either layout into a deduplicated list of raw entries.
///
/// Entries are returned as written (wildcards included); normalization is the
/// caller's job.
#[must_use]
pub fn parse_domain_list(text: &str) -> Vec<String> {
    parse_domain_list_as(text, detect_layout(text))
}

/// Parses a domain list using a known layout.
#[must_use]
pub fn parse_domain_list_as(text: &str, layout: ListLayout) -> Vec<String> {
    let entries = match layout {
        ListLayout::Columns => column_entries(text),
        ListLayout::Lines => line_entries(text),
    };
    dedup_preserving_order(entries)
}

/// Reads and parses a domain list file.
///
/// # Errors
///
/// Returns [`SourceError::Io`] when the file cannot be read.
#[instrument(level = "debug", fields(path = %path.display()))]
pub fn load_domain_file(path: &Path) -> Result<Vec<String>, SourceError> {
    let text = std::fs::read_to_string(path).map_err(|e| SourceError::io(path, e))?;
    let layout = layout_for_path(path, &text);
    let domains = parse_domain_list_as(&text, layout);
    debug!(count = domains.len(), ?layout, "loaded domain list");
    Ok(domains)
}

/// Deduplicates entries, keeping the first occurrence of each.
#[must_use]
pub fn dedup_preserving_order<I>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.clone()))
        .collect()
}

fn line_entries(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn column_entries(text: &str) -> Vec<String> {
    let rows: Vec<Vec<String>> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .skip(1)
        .map(|line| line.split(',').map(clean_cell).collect())
        .collect();

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut entries = Vec::new();
    for column in 0..width {
        for row in &rows {
            if let Some(cell) = row.get(column)
                && !cell.is_empty()
            {
                entries.push(cell.clone());
            }
        }
    }
    entries
}

fn clean_cell(cell: &str) -> String {
    cell.trim().trim_matches('"').trim().to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const HATENA_SAMPLE: &str = "\
2004,2010,2020
*.hatena.ne.jp,example.com,example.org
example.com,*.hatena.ne.jp,
,news.example.net,
";

    #[test]
    fn test_detect_layout() {
        assert_eq!(detect_layout(HATENA_SAMPLE), ListLayout::Columns);
        assert_eq!(detect_layout("example.com\nexample.org\n"), ListLayout::Lines);
        assert_eq!(detect_layout("# header, with comma\nexample.com"), ListLayout::Lines);
        assert_eq!(detect_layout(""), ListLayout::Lines);
    }

    #[test]
    fn test_columns_read_column_by_column_and_deduplicate() {
        let domains = parse_domain_list(HATENA_SAMPLE);
        assert_eq!(
            domains,
            vec![
                "*.hatena.ne.jp",
                "example.com",
                "news.example.net",
                "example.org",
            ]
        );
    }

    #[test]
    fn test_columns_skip_header_and_blank_cells() {
        let domains = parse_domain_list("2020,2021\n,a.com\nb.org,\n");
        assert_eq!(domains, vec!["b.org", "a.com"]);
    }

    #[test]
    fn test_columns_strip_quotes() {
        let domains = parse_domain_list("\"2020\",\"2021\"\n\"a.com\",\"b.org\"\n");
        assert_eq!(domains, vec!["a.com", "b.org"]);
    }

    #[test]
    fn test_lines_skip_comments_and_blanks() {
        let domains = parse_domain_list("# favorites\nexample.com\n\n  *.example.org  \nexample.com\n");
        assert_eq!(domains, vec!["example.com", "*.example.org"]);
    }

    #[test]
    fn test_dedup_keeps_raw_wildcard_variants() {
        let domains = dedup_preserving_order(vec![
            "*.a.com".to_string(),
            "a.com".to_string(),
            "*.a.com".to_string(),
        ]);
        assert_eq!(domains, vec!["*.a.com", "a.com"]);
    }

    #[test]
    fn test_load_domain_file_reads_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, HATENA_SAMPLE).unwrap();

        let domains = load_domain_file(&path).unwrap();
        assert_eq!(domains.len(), 4);
    }

    #[test]
    fn test_single_year_column_csv_skips_header() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("domains.CSV");
        std::fs::write(&path, "2020\na.com\nb.org\n").unwrap();

        let domains = load_domain_file(&path).unwrap();
        assert_eq!(domains, vec!["a.com", "b.org"]);
    }

    #[test]
    fn test_plain_list_file_keeps_first_line() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("domains.txt");
        std::fs::write(&path, "a.com\nb.org\n").unwrap();

        assert_eq!(layout_for_path(&path, "a.com\nb.org\n"), ListLayout::Lines);
        assert_eq!(load_domain_file(&path).unwrap(), vec!["a.com", "b.org"]);
    }

    #[test]
    fn test_load_domain_file_missing_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = load_domain_file(&dir.path().join("missing.csv"));
        assert!(matches!(result, Err(SourceError::Io { .. })));
    }
}
