use super::NodeKind;
use thiserror::Error;

/// Validation failure of a file tree operation.
///
/// A failed operation never changes the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VfsError {
    #[error("no such file or directory: {path}")]
    NotFound { path: String },

    #[error("path already exists: {path}")]
    AlreadyExists { path: String },

    #[error("{path} is a {actual}, expected a {expected}")]
    WrongType {
        path: String,
        expected: NodeKind,
        actual: NodeKind,
    },

    #[error("search text not found in {path}")]
    NoMatch { path: String },

    #[error("search text occurs {count} times in {path}; provide more context or set replace_all")]
    Ambiguous { path: String, count: usize },

    #[error("line {line} is out of range for {path} ({line_count} lines)")]
    OutOfRange {
        path: String,
        line: usize,
        line_count: usize,
    },

    #[error("search text for {path} must not be empty")]
    EmptySearch { path: String },

    #[error("invalid path {path}: {reason}")]
    InvalidPath { path: String, reason: String },
}

impl VfsError {
    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "VFS_NOT_FOUND",
            Self::AlreadyExists { .. } => "VFS_ALREADY_EXISTS",
            Self::WrongType { .. } => "VFS_WRONG_TYPE",
            Self::NoMatch { .. } => "VFS_NO_MATCH",
            Self::Ambiguous { .. } => "VFS_AMBIGUOUS",
            Self::OutOfRange { .. } => "VFS_OUT_OF_RANGE",
            Self::EmptySearch { .. } => "VFS_EMPTY_SEARCH",
            Self::InvalidPath { .. } => "VFS_INVALID_PATH",
        }
    }

    /// The path the failure refers to.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::NotFound { path }
            | Self::AlreadyExists { path }
            | Self::WrongType { path, .. }
            | Self::NoMatch { path }
            | Self::Ambiguous { path, .. }
            | Self::OutOfRange { path, .. }
            | Self::EmptySearch { path }
            | Self::InvalidPath { path, .. } => path,
        }
    }

    pub(crate) fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub(crate) fn already_exists(path: impl Into<String>) -> Self {
        Self::AlreadyExists { path: path.into() }
    }

    pub(crate) fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn expected_file(path: impl Into<String>) -> Self {
        Self::WrongType {
            path: path.into(),
            expected: NodeKind::File,
            actual: NodeKind::Directory,
        }
    }

    pub(crate) fn expected_directory(path: impl Into<String>) -> Self {
        Self::WrongType {
            path: path.into(),
            expected: NodeKind::Directory,
            actual: NodeKind::File,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_paths() {
        let err = VfsError::not_found("/a.txt");
        assert_eq!(err.code(), "VFS_NOT_FOUND");
        assert_eq!(err.path(), "/a.txt");

        let err = VfsError::Ambiguous {
            path: "/a.txt".to_string(),
            count: 3,
        };
        assert_eq!(err.code(), "VFS_AMBIGUOUS");
        assert!(err.to_string().contains("3 times"));
    }

    #[test]
    fn test_wrong_type_display() {
        let err = VfsError::expected_file("/src");
        assert_eq!(err.to_string(), "/src is a directory, expected a file");
    }
}
