//! Editor commands applied to a session's tree.

use serde::{Deserialize, Serialize};

use crate::vfs::{DirEntry, FileTree, LineRange, VfsError};

/// One mutation or query against the virtual tree.
///
/// Serialized with a `"command"` tag, e.g.
/// `{"command": "str_replace", "path": "/App.jsx", "old_str": "a", "new_str": "b"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Create a file, creating missing parent directories.
    Create {
        path: String,
        #[serde(default, alias = "file_text")]
        content: String,
    },

    /// Create a directory, creating missing parents.
    CreateDirectory { path: String },

    /// Replace a file's content.
    Update {
        path: String,
        #[serde(alias = "file_text")]
        content: String,
    },

    /// Delete a file or a directory with everything under it.
    Delete { path: String },

    /// Move a node and its subtree.
    Rename { path: String, new_path: String },

    /// Read a file or list a directory.
    View {
        path: String,
        /// 1-based inclusive `[start, end]`; `end = -1` reads to the end.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        view_range: Option<[i64; 2]>,
    },

    /// Replace text inside a file.
    StrReplace {
        path: String,
        old_str: String,
        #[serde(default)]
        new_str: String,
        #[serde(default)]
        replace_all: bool,
    },

    /// Insert text after line `insert_line` (0 inserts at the top).
    Insert {
        path: String,
        insert_line: usize,
        new_str: String,
    },
}

/// What a successful command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// The tree changed.
    Applied,
    /// File text returned by `view`.
    Content(String),
    /// Directory listing returned by `view`.
    Listing(Vec<DirEntry>),
    /// Number of replacements made by `str_replace`.
    Replaced(usize),
}

impl Command {
    /// The command name as serialized.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::CreateDirectory { .. } => "create_directory",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::Rename { .. } => "rename",
            Self::View { .. } => "view",
            Self::StrReplace { .. } => "str_replace",
            Self::Insert { .. } => "insert",
        }
    }

    /// The path the command targets.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Create { path, .. }
            | Self::CreateDirectory { path }
            | Self::Update { path, .. }
            | Self::Delete { path }
            | Self::Rename { path, .. }
            | Self::View { path, .. }
            | Self::StrReplace { path, .. }
            | Self::Insert { path, .. } => path,
        }
    }

    /// Whether a successful run changes the tree.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::View { .. })
    }

    /// Run the command against `tree`. A failing command leaves the tree
    /// unchanged.
    ///
    /// # Errors
    /// The validation error of the underlying tree operation.
    pub fn apply(&self, tree: &mut FileTree) -> Result<CommandOutput, VfsError> {
        match self {
            Self::Create { path, content } => tree.create(path, content.as_str())?,
            Self::CreateDirectory { path } => tree.create_directory(path)?,
            Self::Update { path, content } => tree.update(path, content.as_str())?,
            Self::Delete { path } => {
                tree.delete(path)?;
            }
            Self::Rename { path, new_path } => tree.rename(path, new_path)?,
            Self::View { path, view_range } => {
                if tree.is_dir(path) {
                    return tree.list_directory(path).map(CommandOutput::Listing);
                }
                let content = tree.view(path, None)?;
                let Some(view_range) = *view_range else {
                    return Ok(CommandOutput::Content(content));
                };
                let line_count = content.split_inclusive('\n').count();
                let range = line_range(path, view_range, line_count)?;
                return tree.view(path, Some(range)).map(CommandOutput::Content);
            }
            Self::StrReplace {
                path,
                old_str,
                new_str,
                replace_all,
            } => {
                return tree
                    .replace_in_file(path, old_str, new_str, *replace_all)
                    .map(CommandOutput::Replaced);
            }
            Self::Insert {
                path,
                insert_line,
                new_str,
            } => tree.insert_in_file(path, insert_line + 1, new_str)?,
        }
        Ok(CommandOutput::Applied)
    }
}

fn line_range(path: &str, [start, end]: [i64; 2], line_count: usize) -> Result<LineRange, VfsError> {
    let out_of_range = |line: i64| VfsError::OutOfRange {
        path: path.to_string(),
        line: usize::try_from(line).unwrap_or(0),
        line_count,
    };
    let start = usize::try_from(start).map_err(|_| out_of_range(start))?;
    let end = match end {
        -1 => None,
        end => Some(usize::try_from(end).map_err(|_| out_of_range(end))?),
    };
    Ok(LineRange::new(start, end))
}
