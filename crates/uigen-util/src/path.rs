//! Virtual path helpers.
//!
//! Virtual paths are `/`-rooted strings that never touch the host filesystem.
//! A normalized path has no `.` or `..` segments, no repeated slashes and no
//! trailing slash (except the root itself).

use thiserror::Error;

/// The virtual root.
pub const ROOT: &str = "/";

/// Path normalization failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// A `..` segment climbed above the root.
    #[error("path escapes the virtual root: {0}")]
    OutsideRoot(String),
}

/// Normalize a virtual path.
///
/// A missing leading `/` is added, so `App.jsx` becomes `/App.jsx`.
///
/// # Errors
/// Returns [`PathError::OutsideRoot`] when `..` climbs above `/`.
pub fn normalize(path: &str) -> Result<String, PathError> {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(PathError::OutsideRoot(path.to_string()));
                }
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Ok(ROOT.to_string());
    }

    let mut out = String::with_capacity(path.len() + 1);
    for segment in segments {
        out.push('/');
        out.push_str(segment);
    }
    Ok(out)
}

/// Join `relative` onto the directory `base_dir` and normalize the result.
///
/// # Errors
/// Returns [`PathError::OutsideRoot`] when the result would leave the root.
pub fn join(base_dir: &str, relative: &str) -> Result<String, PathError> {
    if relative.starts_with('/') {
        return normalize(relative);
    }
    normalize(&format!("{base_dir}/{relative}"))
}

/// Parent directory of a normalized path. The root has no parent.
#[must_use]
pub fn parent(path: &str) -> Option<&str> {
    if path == ROOT {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(ROOT),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Last segment of a normalized path (`""` for the root).
#[must_use]
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}

/// Extension of the last segment, without the dot.
#[must_use]
pub fn extension(path: &str) -> Option<&str> {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(idx) => Some(&name[idx + 1..]),
    }
}

/// Child path of a normalized directory path.
#[must_use]
pub fn child(dir: &str, name: &str) -> String {
    if dir == ROOT {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Segments of a normalized path, root excluded.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Whether `ancestor` is a strict ancestor of `path`.
#[must_use]
pub fn is_ancestor(ancestor: &str, path: &str) -> bool {
    if ancestor == path {
        return false;
    }
    if ancestor == ROOT {
        return true;
    }
    path.strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/a/b/c.txt").unwrap(), "/a/b/c.txt");
        assert_eq!(normalize("a/b").unwrap(), "/a/b");
        assert_eq!(normalize("/a//b/./c/").unwrap(), "/a/b/c");
        assert_eq!(normalize("/a/b/../c").unwrap(), "/a/c");
        assert_eq!(normalize("").unwrap(), "/");
        assert_eq!(normalize("/").unwrap(), "/");
        assert_eq!(normalize("/a/..").unwrap(), "/");
    }

    #[test]
    fn test_normalize_outside_root() {
        assert!(matches!(normalize("/.."), Err(PathError::OutsideRoot(_))));
        assert!(matches!(normalize("/a/../../b"), Err(PathError::OutsideRoot(_))));
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/src", "./util").unwrap(), "/src/util");
        assert_eq!(join("/src/components", "../lib/a").unwrap(), "/src/lib/a");
        assert_eq!(join("/", "./App").unwrap(), "/App");
        assert_eq!(join("/src", "/abs").unwrap(), "/abs");
        assert!(join("/", "../x").is_err());
    }

    #[test]
    fn test_parent_and_name() {
        assert_eq!(parent("/"), None);
        assert_eq!(parent("/a"), Some("/"));
        assert_eq!(parent("/a/b.txt"), Some("/a"));
        assert_eq!(file_name("/a/b.txt"), "b.txt");
        assert_eq!(file_name("/"), "");
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("/src/App.tsx"), Some("tsx"));
        assert_eq!(extension("/src/a.module.css"), Some("css"));
        assert_eq!(extension("/.env"), None);
        assert_eq!(extension("/src/Makefile"), None);
    }

    #[test]
    fn test_child_and_segments() {
        assert_eq!(child("/", "a"), "/a");
        assert_eq!(child("/a", "b"), "/a/b");
        assert_eq!(segments("/a/b").collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(segments("/").count(), 0);
    }

    #[test]
    fn test_is_ancestor() {
        assert!(is_ancestor("/", "/a"));
        assert!(is_ancestor("/a", "/a/b"));
        assert!(!is_ancestor("/a", "/ab"));
        assert!(!is_ancestor("/a", "/a"));
        assert!(!is_ancestor("/a/b", "/a"));
    }
}
