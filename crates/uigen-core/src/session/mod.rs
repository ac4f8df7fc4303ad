//! A live-preview session: one tree, its command stream, and the current
//! preview generation.

mod command;

pub use command::{Command, CommandOutput};

use std::collections::VecDeque;

use crate::bundler::{CdnMapper, GraphError, ModuleGraph, ModuleGraphBuilder, TranspileCache};
use crate::compiler::TranspileEngine;
use crate::config::PreviewConfig;
use crate::preview::{self, RenderOptions};
use crate::vfs::{DirEntry, FileTree, LineRange, SerializedTree, VfsError};
use crate::Result;
use uigen_util::path;

/// One build of the module graph and its document.
#[derive(Debug, Clone)]
pub struct Generation {
    revision: u64,
    requested_entry: Option<String>,
    graph: Option<ModuleGraph>,
    document: String,
}

impl Generation {
    /// Tree revision this generation was built from.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The graph, absent when no entry could be built.
    #[must_use]
    pub fn graph(&self) -> Option<&ModuleGraph> {
        self.graph.as_ref()
    }

    #[must_use]
    pub fn document(&self) -> &str {
        &self.document
    }
}

/// Owns a [`FileTree`] and turns it into preview documents.
///
/// Every successful mutation bumps the revision. The next
/// [`render_preview`](Self::render_preview) builds a new generation that
/// replaces the previous one.
#[derive(Debug)]
pub struct Session {
    tree: FileTree,
    config: PreviewConfig,
    engine: TranspileEngine,
    cdn: CdnMapper,
    queue: VecDeque<Command>,
    revision: u64,
    generation: Option<Generation>,
    cache: TranspileCache,
}

impl Session {
    /// Start a session over an empty tree.
    ///
    /// # Errors
    /// `InvalidConfig` if `config` does not validate.
    pub fn new(config: PreviewConfig) -> Result<Self> {
        Self::with_tree(FileTree::new(), config)
    }

    /// Start a session over an existing tree.
    ///
    /// # Errors
    /// `InvalidConfig` if `config` does not validate.
    pub fn with_tree(tree: FileTree, config: PreviewConfig) -> Result<Self> {
        config.validate()?;
        let cdn = config.cdn()?;
        Ok(Self {
            tree,
            engine: TranspileEngine::new(&config),
            cdn,
            config,
            queue: VecDeque::new(),
            revision: 0,
            generation: None,
            cache: TranspileCache::new(),
        })
    }

    /// Restore a session from a serialized tree.
    ///
    /// # Errors
    /// `Vfs` for an inconsistent tree, `InvalidConfig` for a bad config.
    pub fn from_serialized(blob: &SerializedTree, config: PreviewConfig) -> Result<Self> {
        Self::with_tree(FileTree::deserialize(blob)?, config)
    }

    #[must_use]
    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    #[must_use]
    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Count of successful mutations so far.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The current generation, if a preview has been rendered.
    #[must_use]
    pub fn generation(&self) -> Option<&Generation> {
        self.generation.as_ref()
    }

    #[must_use]
    pub fn cache(&self) -> &TranspileCache {
        &self.cache
    }

    /// Snapshot of the tree for persistence.
    #[must_use]
    pub fn serialize(&self) -> SerializedTree {
        self.tree.serialize()
    }

    /// Read a file, optionally windowed.
    ///
    /// # Errors
    /// See [`FileTree::view`].
    pub fn view(&self, path: &str, range: Option<LineRange>) -> Result<String, VfsError> {
        self.tree.view(path, range)
    }

    /// List a directory.
    ///
    /// # Errors
    /// See [`FileTree::list_directory`].
    pub fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>, VfsError> {
        self.tree.list_directory(path)
    }

    /// Apply one command now.
    ///
    /// # Errors
    /// The command's validation error; the tree is unchanged.
    pub fn apply(&mut self, command: &Command) -> Result<CommandOutput, VfsError> {
        match command.apply(&mut self.tree) {
            Ok(output) => {
                if command.is_mutation() {
                    self.revision += 1;
                }
                tracing::debug!(
                    command = command.name(),
                    path = command.path(),
                    revision = self.revision,
                    "applied command"
                );
                Ok(output)
            }
            Err(e) => {
                tracing::debug!(command = command.name(), path = command.path(), error = %e, "command rejected");
                Err(e)
            }
        }
    }

    /// Queue a command to run on the next [`drain`](Self::drain).
    pub fn enqueue(&mut self, command: Command) {
        self.queue.push_back(command);
    }

    /// Number of queued commands.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Apply every queued command in arrival order. A rejected command does
    /// not stop the ones after it.
    pub fn drain(&mut self) -> Vec<Result<CommandOutput, VfsError>> {
        let mut results = Vec::with_capacity(self.queue.len());
        while let Some(command) = self.queue.pop_front() {
            results.push(self.apply(&command));
        }
        results
    }

    /// Pick the entry file: the first existing candidate, else the first
    /// `.jsx`/`.tsx` file in path order.
    #[must_use]
    pub fn detect_entry(&self) -> Option<String> {
        self.config
            .entry_candidates
            .iter()
            .find(|candidate| self.tree.is_file(candidate))
            .cloned()
            .or_else(|| {
                self.tree
                    .files()
                    .into_iter()
                    .find(|file| matches!(path::extension(file), Some("jsx" | "tsx")))
            })
    }

    /// Build the preview for `entry` (or the detected entry) and return
    /// the document.
    ///
    /// When the tree has not changed since the last call with the same
    /// entry, the existing generation is reused. Otherwise a new
    /// generation replaces it. Build failures render a message document.
    pub fn render_preview(&mut self, entry: Option<&str>) -> &str {
        let requested_entry = entry.map(str::to_string);
        let current = self
            .generation
            .as_ref()
            .is_some_and(|g| g.revision == self.revision && g.requested_entry == requested_entry);

        if !current {
            let generation = self.build_generation(requested_entry);
            self.generation = Some(generation);
        }
        self.generation
            .as_ref()
            .map_or("", |g| g.document.as_str())
    }

    /// Build the graph for `entry` (or the detected entry) without
    /// rendering. Transpiles into a scratch cache, so neither the current
    /// generation nor the shared cache changes.
    ///
    /// # Errors
    /// `Graph` when there is no usable entry.
    pub fn build_graph(&self, entry: Option<&str>) -> Result<ModuleGraph> {
        let entry = self.entry_or_detected(entry)?;
        let builder = ModuleGraphBuilder::new(&self.engine, &self.cdn);
        Ok(builder.build_graph(&self.tree, &entry)?)
    }

    fn entry_or_detected(&self, entry: Option<&str>) -> Result<String> {
        match entry {
            Some(entry) => Ok(entry.to_string()),
            None => Ok(self.detect_entry().ok_or(GraphError::NoEntry)?),
        }
    }

    /// Build against the shared cache, which is pruned to the new graph.
    fn build_cached(&mut self, entry: Option<&str>) -> Result<ModuleGraph> {
        let entry = self.entry_or_detected(entry)?;
        let builder = ModuleGraphBuilder::new(&self.engine, &self.cdn);
        Ok(builder.build_graph_cached(&self.tree, &entry, &mut self.cache)?)
    }

    fn build_generation(&mut self, requested_entry: Option<String>) -> Generation {
        let document = match self.build_cached(requested_entry.as_deref()) {
            Ok(graph) => {
                let document = preview::render(
                    &graph,
                    graph.css(),
                    &RenderOptions::from_config(&self.config),
                );
                tracing::info!(
                    revision = self.revision,
                    entry = graph.entry(),
                    modules = graph.len(),
                    warnings = graph.warnings().len(),
                    cached = self.cache.len(),
                    "new preview generation"
                );
                return Generation {
                    revision: self.revision,
                    requested_entry,
                    graph: Some(graph),
                    document,
                };
            }
            Err(e) => {
                tracing::warn!(revision = self.revision, error = %e, "no preview");
                self.cache.clear();
                preview::render_message("No preview available", &e.to_string())
            }
        };

        Generation {
            revision: self.revision,
            requested_entry,
            graph: None,
            document,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(PreviewConfig::default()).unwrap()
    }

    fn create(path: &str, content: &str) -> Command {
        Command::Create {
            path: path.into(),
            content: content.into(),
        }
    }

    #[test]
    fn test_revision_counts_successful_mutations() {
        let mut session = session();
        session.apply(&create("/a.txt", "x")).unwrap();
        assert!(session.apply(&create("/a.txt", "y")).is_err());
        session
            .apply(&Command::View {
                path: "/a.txt".into(),
                view_range: None,
            })
            .unwrap();
        assert_eq!(session.revision(), 1);
    }

    #[test]
    fn test_drain_applies_in_order_and_continues_after_errors() {
        let mut session = session();
        session.enqueue(create("/a.txt", "1"));
        session.enqueue(Command::Delete { path: "/nope".into() });
        session.enqueue(Command::Rename {
            path: "/a.txt".into(),
            new_path: "/b.txt".into(),
        });
        assert_eq!(session.pending(), 3);

        let results = session.drain();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
        assert_eq!(session.pending(), 0);
        assert_eq!(session.view("/b.txt", None).unwrap(), "1");
    }

    #[test]
    fn test_detect_entry() {
        let mut session = session();
        assert_eq!(session.detect_entry(), None);

        session.apply(&create("/components/Widget.tsx", "")).unwrap();
        assert_eq!(session.detect_entry().as_deref(), Some("/components/Widget.tsx"));

        session.apply(&create("/src/App.jsx", "")).unwrap();
        assert_eq!(session.detect_entry().as_deref(), Some("/src/App.jsx"));

        session.apply(&create("/App.jsx", "")).unwrap();
        assert_eq!(session.detect_entry().as_deref(), Some("/App.jsx"));
    }

    #[test]
    fn test_render_without_entry_is_message() {
        let mut session = session();
        let html = session.render_preview(None).to_string();
        assert!(html.contains("No preview available"));
        assert!(session.generation().unwrap().graph().is_none());
    }

    #[test]
    fn test_render_reuses_generation_until_change() {
        let mut session = session();
        session
            .apply(&create("/App.jsx", "export default () => <h1>Hi</h1>;"))
            .unwrap();

        let first = session.render_preview(None).to_string();
        assert!(first.contains("importmap"));
        assert_eq!(session.generation().unwrap().revision(), 1);

        let again = session.render_preview(None).to_string();
        assert_eq!(first, again);
        assert_eq!(session.cache().len(), 1);

        session
            .apply(&Command::Update {
                path: "/App.jsx".into(),
                content: "export default () => <h2>Bye</h2>;".into(),
            })
            .unwrap();
        let next = session.render_preview(None).to_string();
        assert_ne!(first, next);
        assert_eq!(session.generation().unwrap().revision(), 2);
        assert_eq!(session.cache().len(), 1);
    }

    #[test]
    fn test_build_graph_leaves_generation_cache_alone() {
        let mut session = session();
        session
            .apply(&create("/App.jsx", "import A from './A';\nexport default () => <A />;"))
            .unwrap();
        session
            .apply(&create("/A.jsx", "export default () => <p>a</p>;"))
            .unwrap();
        session
            .apply(&create("/Other.jsx", "export default () => <p>other</p>;"))
            .unwrap();

        let html = session.render_preview(None).to_string();
        assert_eq!(session.cache().paths(), vec!["/A.jsx", "/App.jsx"]);

        let other = session.build_graph(Some("/Other.jsx")).unwrap();
        assert_eq!(other.entry(), "/Other.jsx");
        assert_eq!(session.cache().paths(), vec!["/A.jsx", "/App.jsx"]);
        assert_eq!(session.render_preview(None), html);
    }

    #[test]
    fn test_explicit_missing_entry() {
        let mut session = session();
        let html = session.render_preview(Some("/Nope.jsx")).to_string();
        assert!(html.contains("entry file not found"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PreviewConfig::default().with_cdn_base("ftp://x");
        assert!(Session::new(config).is_err());
    }
}
