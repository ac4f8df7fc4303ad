//! Flat, path-keyed persistence format for [`FileTree`].

use super::node::{Node, NodeKind};
use super::{FileTree, VfsError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uigen_util::path;

/// Descriptor of one node in the serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedNode {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl SerializedNode {
    #[must_use]
    pub fn file(content: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::File,
            content: Some(content.into()),
        }
    }

    #[must_use]
    pub fn directory() -> Self {
        Self {
            kind: NodeKind::Directory,
            content: None,
        }
    }
}

/// Absolute path to node descriptor, root excluded.
pub type SerializedTree = BTreeMap<String, SerializedNode>;

impl FileTree {
    /// Flatten the tree into its serialized form.
    #[must_use]
    pub fn serialize(&self) -> SerializedTree {
        let mut out = SerializedTree::new();
        for child in self.root().children() {
            flatten(child, &mut out);
        }
        out
    }

    /// Rebuild a tree from its serialized form.
    ///
    /// Directories may be listed explicitly or implied by descendants. An
    /// explicit `/` directory entry is ignored.
    ///
    /// # Errors
    /// `InvalidPath` for a file at `/` or a path escaping the root,
    /// `WrongType` when a file entry is also the ancestor of another entry,
    /// `AlreadyExists` when two keys normalize to the same path.
    pub fn deserialize(blob: &SerializedTree) -> Result<Self, VfsError> {
        let mut tree = Self::new();
        for (raw_path, node) in blob {
            match node.kind {
                NodeKind::Directory => {
                    let normalized = path::normalize(raw_path)
                        .map_err(|e| VfsError::invalid(raw_path.as_str(), e.to_string()))?;
                    if normalized == path::ROOT || tree.is_dir(&normalized) {
                        continue;
                    }
                    tree.create_directory(&normalized)?;
                }
                NodeKind::File => {
                    tree.create(raw_path, node.content.clone().unwrap_or_default())?;
                }
            }
        }
        Ok(tree)
    }

    /// Serialize to a JSON value.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (path, node) in self.serialize() {
            let mut entry = serde_json::Map::new();
            entry.insert("type".to_string(), node.kind.as_str().into());
            if let Some(content) = node.content {
                entry.insert("content".to_string(), content.into());
            }
            map.insert(path, serde_json::Value::Object(entry));
        }
        serde_json::Value::Object(map)
    }

    /// Rebuild a tree from a JSON value produced by [`Self::to_json`].
    ///
    /// # Errors
    /// Returns [`crate::Error::Json`] for a malformed value and
    /// [`crate::Error::Vfs`] when the entries do not form a valid tree.
    pub fn from_json(value: serde_json::Value) -> crate::Result<Self> {
        let blob: SerializedTree = serde_json::from_value(value)?;
        Ok(Self::deserialize(&blob)?)
    }
}

fn flatten(node: &Node, out: &mut SerializedTree) {
    match node {
        Node::File(file) => {
            out.insert(file.path().to_string(), SerializedNode::file(file.content()));
        }
        Node::Directory(dir) => {
            out.insert(dir.path().to_string(), SerializedNode::directory());
            for child in dir.children() {
                flatten(child, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> FileTree {
        let mut tree = FileTree::new();
        tree.create("/App.jsx", "export default () => null;").unwrap();
        tree.create("/src/util.ts", "export const x = 1;").unwrap();
        tree.create_directory("/empty").unwrap();
        tree
    }

    #[test]
    fn test_serialize_shape() {
        let value = sample().to_json();
        assert_eq!(
            value,
            json!({
                "/App.jsx": { "type": "file", "content": "export default () => null;" },
                "/empty": { "type": "directory" },
                "/src": { "type": "directory" },
                "/src/util.ts": { "type": "file", "content": "export const x = 1;" },
            })
        );
    }

    #[test]
    fn test_round_trip() {
        let tree = sample();
        let back = FileTree::from_json(tree.to_json()).unwrap();
        assert_eq!(back, tree);
        assert_eq!(back.serialize(), tree.serialize());
    }

    #[test]
    fn test_implied_directories_and_explicit_root() {
        let value = json!({
            "/": { "type": "directory" },
            "/a/b/c.txt": { "type": "file", "content": "x" },
        });
        let tree = FileTree::from_json(value).unwrap();
        assert!(tree.is_dir("/a/b"));
        assert_eq!(tree.read("/a/b/c.txt"), Some("x"));
    }

    #[test]
    fn test_file_as_ancestor_is_rejected() {
        let value = json!({
            "/a": { "type": "file", "content": "" },
            "/a/b.txt": { "type": "file", "content": "x" },
        });
        let err = FileTree::from_json(value).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Vfs(VfsError::WrongType { .. })
        ));
    }

    #[test]
    fn test_root_file_is_rejected() {
        let mut blob = SerializedTree::new();
        blob.insert("/".to_string(), SerializedNode::file("x"));
        assert!(matches!(
            FileTree::deserialize(&blob),
            Err(VfsError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_malformed_json() {
        let err = FileTree::from_json(json!({ "/a": { "type": "socket" } })).unwrap_err();
        assert!(matches!(err, crate::Error::Json(_)));
    }
}
