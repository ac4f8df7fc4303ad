//! Virtual project tree.
//!
//! The tree lives only in memory. Paths are `/`-rooted virtual paths
//! normalized by [`uigen_util::path::normalize`].

mod error;
mod node;
mod serialize;
mod tree;

pub use error::VfsError;
pub use node::{DirectoryNode, FileNode, Node, NodeKind};
pub use serialize::{SerializedNode, SerializedTree};
pub use tree::{DirEntry, FileTree, LineRange};
