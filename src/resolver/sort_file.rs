//! Parsing of directory-local sort files.

/// Names listed in a sort file, in file order.
///
/// One name per line, relative to the directory holding the sort file. Blank lines and lines
/// starting with `#` are skipped. Surrounding separators are removed so `sub/` and `/a.js`
/// match the reader's listing names.
pub fn parse_sort_file(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.trim_matches('/').to_string())
        .filter(|line| !line.is_empty())
        .collect()
}
