//! The virtual project tree.

use super::node::{DirectoryNode, FileNode, Node, NodeKind};
use super::VfsError;
use uigen_util::path;

/// 1-based inclusive line window for [`FileTree::view`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    /// `None` reads to the end of the file.
    pub end: Option<usize>,
}

impl LineRange {
    #[must_use]
    pub fn new(start: usize, end: Option<usize>) -> Self {
        Self { start, end }
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: String,
    pub kind: NodeKind,
}

/// In-memory hierarchical file store.
///
/// Every mutation validates first and only then changes the tree, so a
/// failing call leaves the tree exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTree {
    root: Node,
}

impl Default for FileTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FileTree {
    /// Create an empty tree (just the root directory).
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::Directory(DirectoryNode::new(path::ROOT.to_string())),
        }
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &DirectoryNode {
        match &self.root {
            Node::Directory(dir) => dir,
            Node::File(_) => unreachable!("the root is always a directory"),
        }
    }

    fn root_mut(&mut self) -> &mut DirectoryNode {
        match &mut self.root {
            Node::Directory(dir) => dir,
            Node::File(_) => unreachable!("the root is always a directory"),
        }
    }

    /// Look up a node by path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Node> {
        let path = path::normalize(path).ok()?;
        self.find(&path)
    }

    /// Whether a node exists at `path`.
    #[must_use]
    pub fn exists(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Whether a file exists at `path`.
    #[must_use]
    pub fn is_file(&self, path: &str) -> bool {
        matches!(self.get(path), Some(Node::File(_)))
    }

    /// Whether a directory exists at `path`.
    #[must_use]
    pub fn is_dir(&self, path: &str) -> bool {
        matches!(self.get(path), Some(Node::Directory(_)))
    }

    /// Content of the file at `path`, if it is a file.
    #[must_use]
    pub fn read(&self, path: &str) -> Option<&str> {
        self.get(path)
            .and_then(Node::as_file)
            .map(FileNode::content)
    }

    /// Every file path in sorted order.
    #[must_use]
    pub fn files(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_files(&self.root, &mut out);
        out
    }

    /// Number of nodes, root excluded.
    #[must_use]
    pub fn len(&self) -> usize {
        count_nodes(&self.root) - 1
    }

    /// Whether the tree holds nothing but the root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root().is_empty()
    }

    fn find(&self, normalized: &str) -> Option<&Node> {
        let mut node = &self.root;
        for segment in path::segments(normalized) {
            node = match node {
                Node::Directory(dir) => dir.child(segment)?,
                Node::File(_) => return None,
            };
        }
        Some(node)
    }

    fn find_mut(&mut self, normalized: &str) -> Option<&mut Node> {
        let mut node = &mut self.root;
        for segment in path::segments(normalized) {
            node = match node {
                Node::Directory(dir) => dir.child_mut(segment)?,
                Node::File(_) => return None,
            };
        }
        Some(node)
    }

    /// Check that no existing ancestor of `normalized` is a file.
    fn check_ancestors(&self, normalized: &str) -> Result<(), VfsError> {
        let mut node = &self.root;
        let mut current = path::ROOT.to_string();
        let parent = path::parent(normalized).unwrap_or(path::ROOT);
        for segment in path::segments(parent) {
            current = path::child(&current, segment);
            let Node::Directory(dir) = node else {
                unreachable!("descent only continues through directories")
            };
            match dir.child(segment) {
                None => return Ok(()),
                Some(Node::File(_)) => return Err(VfsError::expected_directory(current)),
                Some(child) => node = child,
            }
        }
        Ok(())
    }

    /// Walk to `dir_path`, creating missing directories on the way.
    ///
    /// Callers validate with [`Self::check_ancestors`] first.
    fn ensure_dir(&mut self, dir_path: &str) -> Result<&mut DirectoryNode, VfsError> {
        let mut current = self.root_mut();
        for segment in path::segments(dir_path) {
            let child_path = path::child(current.path(), segment);
            let entry = current
                .children_mut()
                .entry(segment.to_string())
                .or_insert_with(|| Node::Directory(DirectoryNode::new(child_path.clone())));
            current = match entry {
                Node::Directory(dir) => dir,
                Node::File(_) => return Err(VfsError::expected_directory(child_path)),
            };
        }
        Ok(current)
    }

    fn parent_dir_mut(&mut self, normalized: &str) -> Option<&mut DirectoryNode> {
        let parent = path::parent(normalized)?;
        match self.find_mut(parent)? {
            Node::Directory(dir) => Some(dir),
            Node::File(_) => None,
        }
    }

    fn file_mut(&mut self, normalized: &str) -> Result<&mut FileNode, VfsError> {
        match self.find_mut(normalized) {
            Some(Node::File(file)) => Ok(file),
            Some(Node::Directory(_)) => Err(VfsError::expected_file(normalized)),
            None => Err(VfsError::not_found(normalized)),
        }
    }

    fn file(&self, normalized: &str) -> Result<&FileNode, VfsError> {
        match self.find(normalized) {
            Some(Node::File(file)) => Ok(file),
            Some(Node::Directory(_)) => Err(VfsError::expected_file(normalized)),
            None => Err(VfsError::not_found(normalized)),
        }
    }

    /// Create a file, creating missing ancestor directories.
    ///
    /// # Errors
    /// `AlreadyExists` if `path` is occupied, `WrongType` if an ancestor is a
    /// file, `InvalidPath` for the root or a path escaping it.
    pub fn create(&mut self, path: &str, content: impl Into<String>) -> Result<(), VfsError> {
        let path = normalize_non_root(path)?;
        if self.find(&path).is_some() {
            return Err(VfsError::already_exists(path));
        }
        self.check_ancestors(&path)?;

        let parent = path::parent(&path).unwrap_or(path::ROOT).to_string();
        let dir = self.ensure_dir(&parent)?;
        dir.insert(Node::File(FileNode::new(path, content.into())));
        Ok(())
    }

    /// Create a directory, creating missing ancestors.
    ///
    /// # Errors
    /// `AlreadyExists` if `path` is occupied, `WrongType` if an ancestor is a
    /// file, `InvalidPath` for the root.
    pub fn create_directory(&mut self, path: &str) -> Result<(), VfsError> {
        let path = normalize_non_root(path)?;
        if self.find(&path).is_some() {
            return Err(VfsError::already_exists(path));
        }
        self.check_ancestors(&path)?;
        self.ensure_dir(&path)?;
        Ok(())
    }

    /// Replace the content of an existing file.
    ///
    /// # Errors
    /// `NotFound` if absent, `WrongType` if `path` is a directory.
    pub fn update(&mut self, path: &str, content: impl Into<String>) -> Result<(), VfsError> {
        let path = normalize(path)?;
        self.file_mut(&path)?.set_content(content.into());
        Ok(())
    }

    /// Remove a node; directories take their whole subtree with them.
    ///
    /// # Errors
    /// `NotFound` if absent, `InvalidPath` for the root.
    pub fn delete(&mut self, path: &str) -> Result<Node, VfsError> {
        let path = normalize_non_root(path)?;
        let name = path::file_name(&path).to_string();
        self.parent_dir_mut(&path)
            .and_then(|dir| dir.remove(&name))
            .ok_or_else(|| VfsError::not_found(path))
    }

    /// Move a node (and its subtree) from `from` to `to`.
    ///
    /// Missing ancestors of `to` are created.
    ///
    /// # Errors
    /// `NotFound` if `from` is absent, `AlreadyExists` if `to` is occupied,
    /// `WrongType` if an ancestor of `to` is a file, `InvalidPath` when moving
    /// the root or moving a directory into itself.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<(), VfsError> {
        let from = normalize_non_root(from)?;
        let to = normalize_non_root(to)?;

        if self.find(&from).is_none() {
            return Err(VfsError::not_found(from));
        }
        if self.find(&to).is_some() {
            return Err(VfsError::already_exists(to));
        }
        if path::is_ancestor(&from, &to) {
            return Err(VfsError::invalid(
                to,
                format!("cannot move {from} into its own subtree"),
            ));
        }
        self.check_ancestors(&to)?;

        let mut node = self.delete(&from)?;
        node.relocate(&to);
        let parent = path::parent(&to).unwrap_or(path::ROOT).to_string();
        self.ensure_dir(&parent)?.insert(node);
        Ok(())
    }

    /// Read a file, optionally windowed to a line range.
    ///
    /// # Errors
    /// `NotFound`, `WrongType` on directories, `OutOfRange` for a bad window.
    pub fn view(&self, path: &str, range: Option<LineRange>) -> Result<String, VfsError> {
        let path = normalize(path)?;
        let content = self.file(&path)?.content();
        let Some(range) = range else {
            return Ok(content.to_string());
        };

        let lines: Vec<&str> = content.split_inclusive('\n').collect();
        let line_count = lines.len();
        let out_of_range = |line| VfsError::OutOfRange {
            path: path.clone(),
            line,
            line_count,
        };

        if range.start == 0 || range.start > line_count.max(1) {
            return Err(out_of_range(range.start));
        }
        let end = match range.end {
            Some(end) if end < range.start => return Err(out_of_range(end)),
            Some(end) => end.min(line_count),
            None => line_count,
        };

        Ok(lines
            .get(range.start - 1..end)
            .map(<[&str]>::concat)
            .unwrap_or_default())
    }

    /// List a directory's children in name order.
    ///
    /// # Errors
    /// `NotFound`, or `WrongType` when `path` is a file.
    pub fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>, VfsError> {
        let path = normalize(path)?;
        match self.find(&path) {
            Some(Node::Directory(dir)) => Ok(dir
                .children()
                .map(|child| DirEntry {
                    name: child.name().to_string(),
                    path: child.path().to_string(),
                    kind: child.kind(),
                })
                .collect()),
            Some(Node::File(_)) => Err(VfsError::expected_directory(path)),
            None => Err(VfsError::not_found(path)),
        }
    }

    /// Replace `search` with `replace` inside a file.
    ///
    /// Returns the number of replacements made.
    ///
    /// # Errors
    /// `NoMatch` when `search` does not occur, `Ambiguous` when it occurs more
    /// than once and `replace_all` is false, `EmptySearch` for an empty
    /// `search`, plus the usual `NotFound`/`WrongType`.
    pub fn replace_in_file(
        &mut self,
        path: &str,
        search: &str,
        replace: &str,
        replace_all: bool,
    ) -> Result<usize, VfsError> {
        let path = normalize(path)?;
        let file = self.file_mut(&path)?;
        if search.is_empty() {
            return Err(VfsError::EmptySearch { path });
        }

        let count = file.content().matches(search).count();
        match count {
            0 => Err(VfsError::NoMatch { path }),
            n if n > 1 && !replace_all => Err(VfsError::Ambiguous { path, count: n }),
            n => {
                let updated = if replace_all {
                    file.content().replace(search, replace)
                } else {
                    file.content().replacen(search, replace, 1)
                };
                file.set_content(updated);
                Ok(n)
            }
        }
    }

    /// Insert `text` so that it starts at 1-based line `line`.
    ///
    /// `line == line_count + 1` appends to the end of the file.
    ///
    /// # Errors
    /// `OutOfRange` if `line` is 0 or greater than `line_count + 1`.
    pub fn insert_in_file(&mut self, path: &str, line: usize, text: &str) -> Result<(), VfsError> {
        let path = normalize(path)?;
        let file = self.file_mut(&path)?;
        let content = file.content();
        let lines: Vec<&str> = content.split_inclusive('\n').collect();
        let line_count = lines.len();

        if line == 0 || line > line_count + 1 {
            return Err(VfsError::OutOfRange {
                path,
                line,
                line_count,
            });
        }

        let mut out = String::with_capacity(content.len() + text.len() + 2);
        for existing in &lines[..line - 1] {
            out.push_str(existing);
        }

        let appending = line == line_count + 1;
        if appending && !content.is_empty() && !content.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(text);
        let needs_newline = if appending {
            content.ends_with('\n')
        } else {
            true
        };
        if needs_newline && !text.ends_with('\n') {
            out.push('\n');
        }
        for existing in &lines[line - 1..] {
            out.push_str(existing);
        }

        file.set_content(out);
        Ok(())
    }

    /// Verify the structural invariants of the tree.
    ///
    /// # Errors
    /// Returns a description of the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.root.path() != path::ROOT {
            return Err(format!("root path is {}", self.root.path()));
        }
        check_node(&self.root)
    }
}

fn normalize(raw: &str) -> Result<String, VfsError> {
    path::normalize(raw).map_err(|e| VfsError::invalid(raw, e.to_string()))
}

fn normalize_non_root(raw: &str) -> Result<String, VfsError> {
    let path = normalize(raw)?;
    if path == path::ROOT {
        return Err(VfsError::invalid(path, "the root cannot be created, moved or deleted"));
    }
    Ok(path)
}

fn collect_files(node: &Node, out: &mut Vec<String>) {
    match node {
        Node::File(file) => out.push(file.path().to_string()),
        Node::Directory(dir) => {
            for child in dir.children() {
                collect_files(child, out);
            }
        }
    }
}

fn count_nodes(node: &Node) -> usize {
    match node {
        Node::File(_) => 1,
        Node::Directory(dir) => 1 + dir.children().map(count_nodes).sum::<usize>(),
    }
}

fn check_node(node: &Node) -> Result<(), String> {
    let Node::Directory(dir) = node else {
        return Ok(());
    };
    for child in dir.children() {
        let expected = path::child(dir.path(), child.name());
        if child.path() != expected {
            return Err(format!("{} should be at {expected}", child.path()));
        }
        if dir.child(child.name()).map(Node::path) != Some(child.path()) {
            return Err(format!("{} is filed under the wrong key", child.path()));
        }
        if child.name().is_empty() || child.name().contains('/') {
            return Err(format!("{} has an invalid name", child.path()));
        }
        check_node(child)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_makes_ancestors() {
        let mut tree = FileTree::new();
        tree.create("/a/b/c.txt", "x").unwrap();

        assert!(tree.is_dir("/a"));
        assert!(tree.is_dir("/a/b"));
        assert_eq!(tree.read("/a/b/c.txt"), Some("x"));
        assert_eq!(tree.len(), 3);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_create_normalizes_paths() {
        let mut tree = FileTree::new();
        tree.create("App.jsx", "").unwrap();
        tree.create("/src//lib/./util.ts", "").unwrap();
        assert!(tree.is_file("/App.jsx"));
        assert!(tree.is_file("/src/lib/util.ts"));
    }

    #[test]
    fn test_create_existing_fails() {
        let mut tree = FileTree::new();
        tree.create("/a.txt", "1").unwrap();
        let err = tree.create("/a.txt", "2").unwrap_err();
        assert_eq!(err.code(), "VFS_ALREADY_EXISTS");
        assert_eq!(tree.read("/a.txt"), Some("1"));
    }

    #[test]
    fn test_create_under_file_fails_without_side_effects() {
        let mut tree = FileTree::new();
        tree.create("/a.txt", "1").unwrap();
        let before = tree.clone();

        let err = tree.create("/a.txt/b/c.txt", "x").unwrap_err();
        assert!(matches!(err, VfsError::WrongType { .. }));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_create_root_is_invalid() {
        let mut tree = FileTree::new();
        assert!(matches!(
            tree.create("/", "x"),
            Err(VfsError::InvalidPath { .. })
        ));
        assert!(matches!(
            tree.create("/../x", "x"),
            Err(VfsError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_update() {
        let mut tree = FileTree::new();
        tree.create("/a.txt", "1").unwrap();
        tree.update("/a.txt", "2").unwrap();
        assert_eq!(tree.read("/a.txt"), Some("2"));

        assert!(matches!(
            tree.update("/missing.txt", "x"),
            Err(VfsError::NotFound { .. })
        ));

        tree.create_directory("/dir").unwrap();
        assert!(matches!(
            tree.update("/dir", "x"),
            Err(VfsError::WrongType { .. })
        ));
    }

    #[test]
    fn test_delete_cascades() {
        let mut tree = FileTree::new();
        tree.create("/a/b.txt", "x").unwrap();
        tree.create("/a/c/d.txt", "y").unwrap();

        tree.delete("/a").unwrap();

        assert!(!tree.exists("/a"));
        assert!(matches!(
            tree.view("/a/b.txt", None),
            Err(VfsError::NotFound { .. })
        ));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_delete_missing_and_root() {
        let mut tree = FileTree::new();
        assert!(matches!(tree.delete("/nope"), Err(VfsError::NotFound { .. })));
        assert!(matches!(tree.delete("/"), Err(VfsError::InvalidPath { .. })));
    }

    #[test]
    fn test_rename_moves_subtree() {
        let mut tree = FileTree::new();
        tree.create("/src/components/Button.tsx", "btn").unwrap();
        tree.create("/src/components/ui/Card.tsx", "card").unwrap();

        tree.rename("/src/components", "/lib/widgets").unwrap();

        assert!(!tree.exists("/src/components"));
        assert_eq!(tree.read("/lib/widgets/Button.tsx"), Some("btn"));
        assert_eq!(tree.read("/lib/widgets/ui/Card.tsx"), Some("card"));
        let card = tree.get("/lib/widgets/ui/Card.tsx").unwrap();
        assert_eq!(card.path(), "/lib/widgets/ui/Card.tsx");
        assert_eq!(card.name(), "Card.tsx");
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_rename_failures_leave_tree_unchanged() {
        let mut tree = FileTree::new();
        tree.create("/a/x.txt", "x").unwrap();
        tree.create("/b.txt", "b").unwrap();
        let before = tree.clone();

        assert!(matches!(
            tree.rename("/missing", "/c"),
            Err(VfsError::NotFound { .. })
        ));
        assert!(matches!(
            tree.rename("/a/x.txt", "/b.txt"),
            Err(VfsError::AlreadyExists { .. })
        ));
        assert!(matches!(
            tree.rename("/a", "/a/inner"),
            Err(VfsError::InvalidPath { .. })
        ));
        assert!(matches!(
            tree.rename("/a/x.txt", "/b.txt/x.txt"),
            Err(VfsError::WrongType { .. })
        ));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_view_with_range() {
        let mut tree = FileTree::new();
        tree.create("/f.txt", "one\ntwo\nthree\n").unwrap();

        assert_eq!(tree.view("/f.txt", None).unwrap(), "one\ntwo\nthree\n");
        assert_eq!(
            tree.view("/f.txt", Some(LineRange::new(2, Some(3)))).unwrap(),
            "two\nthree\n"
        );
        assert_eq!(
            tree.view("/f.txt", Some(LineRange::new(2, None))).unwrap(),
            "two\nthree\n"
        );
        assert_eq!(
            tree.view("/f.txt", Some(LineRange::new(1, Some(99)))).unwrap(),
            "one\ntwo\nthree\n"
        );
        assert!(matches!(
            tree.view("/f.txt", Some(LineRange::new(0, None))),
            Err(VfsError::OutOfRange { .. })
        ));
        assert!(matches!(
            tree.view("/f.txt", Some(LineRange::new(4, None))),
            Err(VfsError::OutOfRange { .. })
        ));
        assert!(matches!(
            tree.view("/f.txt", Some(LineRange::new(3, Some(2)))),
            Err(VfsError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_view_directory_is_wrong_type() {
        let mut tree = FileTree::new();
        tree.create("/src/a.ts", "").unwrap();
        assert!(matches!(
            tree.view("/src", None),
            Err(VfsError::WrongType { .. })
        ));
    }

    #[test]
    fn test_list_directory() {
        let mut tree = FileTree::new();
        tree.create("/src/b.ts", "").unwrap();
        tree.create("/src/a/index.ts", "").unwrap();

        let entries = tree.list_directory("/src").unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b.ts"]);
        assert_eq!(entries[0].kind, NodeKind::Directory);
        assert_eq!(entries[1].path, "/src/b.ts");

        assert!(matches!(
            tree.list_directory("/src/b.ts"),
            Err(VfsError::WrongType { .. })
        ));
    }

    #[test]
    fn test_replace_in_file() {
        let mut tree = FileTree::new();
        tree.create("/f.txt", "a b a").unwrap();

        assert!(matches!(
            tree.replace_in_file("/f.txt", "zzz", "y", false),
            Err(VfsError::NoMatch { .. })
        ));
        assert!(matches!(
            tree.replace_in_file("/f.txt", "a", "y", false),
            Err(VfsError::Ambiguous { count: 2, .. })
        ));
        assert!(matches!(
            tree.replace_in_file("/f.txt", "", "y", false),
            Err(VfsError::EmptySearch { .. })
        ));
        assert_eq!(tree.read("/f.txt"), Some("a b a"));

        assert_eq!(tree.replace_in_file("/f.txt", "b", "c", false).unwrap(), 1);
        assert_eq!(tree.read("/f.txt"), Some("a c a"));

        assert_eq!(tree.replace_in_file("/f.txt", "a", "z", true).unwrap(), 2);
        assert_eq!(tree.read("/f.txt"), Some("z c z"));
    }

    #[test]
    fn test_insert_in_file() {
        let mut tree = FileTree::new();
        tree.create("/f.txt", "a\nb\n").unwrap();

        tree.insert_in_file("/f.txt", 1, "first").unwrap();
        assert_eq!(tree.read("/f.txt"), Some("first\na\nb\n"));

        tree.insert_in_file("/f.txt", 3, "mid").unwrap();
        assert_eq!(tree.read("/f.txt"), Some("first\na\nmid\nb\n"));

        tree.insert_in_file("/f.txt", 5, "last").unwrap();
        assert_eq!(tree.read("/f.txt"), Some("first\na\nmid\nb\nlast\n"));
    }

    #[test]
    fn test_insert_appends_without_trailing_newline() {
        let mut tree = FileTree::new();
        tree.create("/f.txt", "a\nb").unwrap();
        tree.insert_in_file("/f.txt", 3, "c").unwrap();
        assert_eq!(tree.read("/f.txt"), Some("a\nb\nc"));

        tree.create("/empty.txt", "").unwrap();
        tree.insert_in_file("/empty.txt", 1, "hello").unwrap();
        assert_eq!(tree.read("/empty.txt"), Some("hello"));
    }

    #[test]
    fn test_insert_out_of_range() {
        let mut tree = FileTree::new();
        tree.create("/f.txt", "a\nb\n").unwrap();

        assert!(matches!(
            tree.insert_in_file("/f.txt", 4, "x"),
            Err(VfsError::OutOfRange {
                line: 4,
                line_count: 2,
                ..
            })
        ));
        assert!(matches!(
            tree.insert_in_file("/f.txt", 0, "x"),
            Err(VfsError::OutOfRange { .. })
        ));
        assert_eq!(tree.read("/f.txt"), Some("a\nb\n"));
    }

    #[test]
    fn test_files_sorted() {
        let mut tree = FileTree::new();
        tree.create("/src/b.ts", "").unwrap();
        tree.create("/App.jsx", "").unwrap();
        tree.create("/src/a.ts", "").unwrap();
        assert_eq!(tree.files(), vec!["/App.jsx", "/src/a.ts", "/src/b.ts"]);
    }
}
