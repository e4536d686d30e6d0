//! Path string helpers: splitting, joining and relative resolution.

/// Raw target split into its components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPath {
    pub path: String,
    /// Query string without the leading `?`.
    pub query: String,
    /// Hash including the leading `#`.
    pub hash: String,
}

/// Split `raw` into bare path, query string and hash.
pub fn parse_path(raw: &str) -> ParsedPath {
    let (rest, hash) = match raw.find('#') {
        Some(i) => (&raw[..i], raw[i..].to_string()),
        None => (raw, String::new()),
    };
    let (path, query) = match rest.find('?') {
        Some(i) => (&rest[..i], rest[i + 1..].to_string()),
        None => (rest, String::new()),
    };
    ParsedPath {
        path: path.to_string(),
        query,
        hash,
    }
}

/// Collapse doubled slashes.
pub fn clean_path(path: &str) -> String {
    path.replace("//", "/")
}

/// Resolve `relative` against `base`.
///
/// With `append`, the base is treated as a directory even without a trailing slash.
pub fn resolve_path(relative: &str, base: &str, append: bool) -> String {
    match relative.chars().next() {
        Some('/') => return relative.to_string(),
        Some('?') | Some('#') => return format!("{base}{relative}"),
        _ => {}
    }

    let mut stack: Vec<&str> = base.split('/').collect();
    if !append || stack.last().is_some_and(|s| s.is_empty()) {
        stack.pop();
    }

    for segment in relative.strip_prefix('/').unwrap_or(relative).split('/') {
        match segment {
            ".." => {
                stack.pop();
            }
            "." => {}
            other => stack.push(other),
        }
    }

    if stack.first() != Some(&"") {
        stack.insert(0, "");
    }
    stack.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path() {
        let parsed = parse_path("/a/b?x=1&y=2#top");
        assert_eq!(parsed.path, "/a/b");
        assert_eq!(parsed.query, "x=1&y=2");
        assert_eq!(parsed.hash, "#top");

        let bare = parse_path("/only");
        assert_eq!(bare.query, "");
        assert_eq!(bare.hash, "");
    }

    #[test]
    fn test_hash_before_query() {
        let parsed = parse_path("/a#frag?notquery");
        assert_eq!(parsed.path, "/a");
        assert_eq!(parsed.query, "");
        assert_eq!(parsed.hash, "#frag?notquery");
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(resolve_path("/abs", "/a/b", false), "/abs");
        assert_eq!(resolve_path("c", "/a/b", false), "/a/c");
        assert_eq!(resolve_path("c", "/a/b", true), "/a/b/c");
        assert_eq!(resolve_path("c", "/a/b/", true), "/a/b/c");
        assert_eq!(resolve_path("../c", "/a/b", false), "/c");
        assert_eq!(resolve_path("./c", "/a/b", false), "/a/c");
        assert_eq!(resolve_path("?q=1", "/a/b", false), "/a/b?q=1");
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("/a//b"), "/a/b");
        assert_eq!(clean_path("/a/b"), "/a/b");
    }
}
