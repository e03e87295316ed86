use std::sync::OnceLock;

use regex::Regex;

fn redundant_separators() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/{2,}").expect("invalid separator regex"))
}

/// Collapse separators and resolve `.` / `..` segments.
///
/// Backslashes are converted to forward slashes so Windows-style inputs produce the same
/// result. A `..` that would climb above the root is dropped. Leading and trailing separators
/// present in the input are preserved.
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let collapsed = redundant_separators().replace_all(&unified, "/");

    let leading = collapsed.starts_with('/');
    let trailing = collapsed.len() > 1 && collapsed.ends_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in collapsed.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut result = segments.join("/");
    if leading {
        result.insert(0, '/');
    }
    if trailing && !segments.is_empty() {
        result.push('/');
    }
    result
}

/// Normalise a path to the canonical resource form: one leading `/`, no trailing `/`.
pub fn as_path(path: &str) -> String {
    let normalized = normalize_path(path);
    let trimmed = normalized.trim_matches('/');
    format!("/{trimmed}")
}

/// Normalise a path to the canonical directory form: leading and trailing `/`.
pub fn as_dir_path(path: &str) -> String {
    let normalized = as_path(path);
    if normalized == "/" {
        normalized
    } else {
        format!("{normalized}/")
    }
}

/// Join a directory and a child name.
///
/// Generated paths are only glued with a single separator since their syntax belongs to the
/// generator; regular paths are normalised with [`as_path`].
pub fn join_paths(dir: &str, name: &str, generated: bool) -> String {
    if !generated {
        return as_path(&format!("{dir}/{name}"));
    }

    match (dir.ends_with('/'), name.starts_with('/')) {
        (true, true) => format!("{dir}{}", &name[1..]),
        (false, false) => format!("{dir}/{name}"),
        _ => format!("{dir}{name}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_separators_and_dot_segments() {
        assert_eq!(normalize_path("/js//lib/./a.js"), "/js/lib/a.js");
        assert_eq!(normalize_path("js/lib/../b.js"), "js/b.js");
        assert_eq!(normalize_path("/../a.js"), "/a.js");
    }

    #[test]
    fn normalises_backslashes_from_windows_inputs() {
        assert_eq!(as_path("js\\vendor\\jquery.js"), "/js/vendor/jquery.js");
    }

    #[test]
    fn as_path_adds_leading_and_strips_trailing_separator() {
        assert_eq!(as_path("js/app.js"), "/js/app.js");
        assert_eq!(as_path("/js/lib/"), "/js/lib");
        assert_eq!(as_path(""), "/");
    }

    #[test]
    fn as_dir_path_wraps_with_separators() {
        assert_eq!(as_dir_path("bundles"), "/bundles/");
        assert_eq!(as_dir_path("/bundles//v1"), "/bundles/v1/");
        assert_eq!(as_dir_path("/"), "/");
    }

    #[test]
    fn joins_regular_paths_with_normalisation() {
        assert_eq!(join_paths("/js/lib/", "/a.js", false), "/js/lib/a.js");
        assert_eq!(join_paths("js/lib", "sub/", false), "/js/lib/sub");
    }

    #[test]
    fn joins_generated_paths_verbatim() {
        assert_eq!(join_paths("jar:/lib/", "/a.js", true), "jar:/lib/a.js");
        assert_eq!(join_paths("jar:/lib", "a.js", true), "jar:/lib/a.js");
        assert_eq!(join_paths("jar://lib/", "a.js", true), "jar://lib/a.js");
    }
}
