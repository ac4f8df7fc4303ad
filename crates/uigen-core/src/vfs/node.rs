//! Tree nodes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uigen_util::path;

/// Kind of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

impl NodeKind {
    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A file with text content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    path: String,
    name: String,
    content: String,
}

impl FileNode {
    pub(crate) fn new(path: String, content: String) -> Self {
        let name = path::file_name(&path).to_string();
        Self {
            path,
            name,
            content,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    pub(crate) fn set_content(&mut self, content: String) {
        self.content = content;
    }
}

/// A directory. Children are keyed by name and kept sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryNode {
    path: String,
    name: String,
    children: BTreeMap<String, Node>,
}

impl DirectoryNode {
    pub(crate) fn new(path: String) -> Self {
        let name = path::file_name(&path).to_string();
        Self {
            path,
            name,
            children: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Child nodes in name order.
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.children.values()
    }

    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.get(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub(crate) fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children.get_mut(name)
    }

    pub(crate) fn children_mut(&mut self) -> &mut BTreeMap<String, Node> {
        &mut self.children
    }

    pub(crate) fn insert(&mut self, node: Node) {
        self.children.insert(node.name().to_string(), node);
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Node> {
        self.children.remove(name)
    }
}

/// A node of the virtual tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    File(FileNode),
    Directory(DirectoryNode),
}

impl Node {
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::File(f) => f.path(),
            Self::Directory(d) => d.path(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::File(f) => f.name(),
            Self::Directory(d) => d.name(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::File(_) => NodeKind::File,
            Self::Directory(_) => NodeKind::Directory,
        }
    }

    #[must_use]
    pub fn as_file(&self) -> Option<&FileNode> {
        match self {
            Self::File(f) => Some(f),
            Self::Directory(_) => None,
        }
    }

    #[must_use]
    pub fn as_directory(&self) -> Option<&DirectoryNode> {
        match self {
            Self::File(_) => None,
            Self::Directory(d) => Some(d),
        }
    }

    /// Move this node (and every descendant) to `new_path`.
    pub(crate) fn relocate(&mut self, new_path: &str) {
        let name = path::file_name(new_path).to_string();
        match self {
            Self::File(f) => {
                f.path = new_path.to_string();
                f.name = name;
            }
            Self::Directory(d) => {
                d.path = new_path.to_string();
                d.name = name;
                for (child_name, child) in &mut d.children {
                    child.relocate(&path::child(new_path, child_name));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relocate_rewrites_descendants() {
        let mut dir = DirectoryNode::new("/a".to_string());
        let mut inner = DirectoryNode::new("/a/b".to_string());
        inner.insert(Node::File(FileNode::new("/a/b/c.txt".to_string(), "x".to_string())));
        dir.insert(Node::Directory(inner));

        let mut node = Node::Directory(dir);
        node.relocate("/z");

        assert_eq!(node.path(), "/z");
        assert_eq!(node.name(), "z");
        let b = node.as_directory().unwrap().child("b").unwrap();
        assert_eq!(b.path(), "/z/b");
        let c = b.as_directory().unwrap().child("c.txt").unwrap();
        assert_eq!(c.path(), "/z/b/c.txt");
        assert_eq!(c.as_file().unwrap().content(), "x");
    }

    #[test]
    fn test_node_kind_serialization() {
        assert_eq!(serde_json::to_string(&NodeKind::File).unwrap(), "\"file\"");
        assert_eq!(
            serde_json::to_string(&NodeKind::Directory).unwrap(),
            "\"directory\""
        );
    }
}
