//! Module graph builder for live preview.
//!
//! ## Architecture
//!
//! 1. **Walk** - Breadth-first over imports from the entry, each file once
//! 2. **Transform** - Transpile each script (cached across generations)
//! 3. **Synthesize** - Placeholders for unresolved imports, error modules
//!    for files that fail to compile
//! 4. **Map** - Import map from canonical specifiers to `data:` URLs and
//!    from bare specifiers to CDN URLs

mod cache;
mod cdn;
mod graph;
mod placeholder;

pub use cache::TranspileCache;
pub use cdn::{split_package, CdnMapper, SHARED_PACKAGES};
pub use graph::{
    module_url, GraphStats, GraphWarning, GraphWarningKind, ImportMap, ModuleGraph, ModuleKind,
    ModuleRecord,
};
pub use placeholder::{error_module, js_string, json_module, placeholder_module, text_module};

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use thiserror::Error;

use crate::compiler::{Diagnostic, StylesheetRecord, TranspileEngine, TranspiledModule};
use crate::css;
use crate::resolver::{ResolveStatus, SpecifierKind};
use crate::vfs::FileTree;
use uigen_util::path;

/// Packages the preview document imports itself.
pub const RUNTIME_SPECIFIERS: &[&str] = &["react", "react-dom/client"];

/// Fatal graph build failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("entry file not found: {path}")]
    EntryNotFound { path: String },

    #[error("entry file {path} is not a script")]
    EntryNotScript { path: String },

    #[error("no entry file: none of the entry candidates exist and the tree has no .jsx or .tsx file")]
    NoEntry,
}

impl GraphError {
    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::EntryNotFound { .. } => "GRAPH_ENTRY_NOT_FOUND",
            Self::EntryNotScript { .. } => "GRAPH_ENTRY_NOT_SCRIPT",
            Self::NoEntry => "GRAPH_NO_ENTRY",
        }
    }
}

/// Builds a [`ModuleGraph`] from a tree and an entry file.
#[derive(Debug)]
pub struct ModuleGraphBuilder<'a> {
    engine: &'a TranspileEngine,
    cdn: &'a CdnMapper,
}

/// State of one walk.
#[derive(Default)]
struct Walk {
    queue: VecDeque<(String, ModuleKind)>,
    queued: BTreeSet<String>,
    /// Names each importer asked of a module, keyed by specifier.
    requested: BTreeMap<String, BTreeSet<String>>,
    /// Unresolved specifiers in first-seen order, with the first importer.
    unresolved: Vec<(String, String)>,
    bare: BTreeSet<String>,
    stylesheets: BTreeMap<String, StylesheetRecord>,
    failed: Vec<(String, Diagnostic)>,
}

impl Walk {
    fn enqueue(&mut self, file: &str, kind: ModuleKind) {
        if self.queued.insert(file.to_string()) {
            self.queue.push_back((file.to_string(), kind));
        }
    }

    fn names(&self, specifier: &str) -> BTreeSet<String> {
        self.requested.get(specifier).cloned().unwrap_or_default()
    }
}

impl<'a> ModuleGraphBuilder<'a> {
    #[must_use]
    pub fn new(engine: &'a TranspileEngine, cdn: &'a CdnMapper) -> Self {
        Self { engine, cdn }
    }

    /// Build the graph reachable from `entry` with a throwaway cache.
    ///
    /// # Errors
    /// `EntryNotFound` when `entry` is not a file, `EntryNotScript` when it
    /// cannot be transpiled.
    pub fn build_graph(&self, tree: &FileTree, entry: &str) -> Result<ModuleGraph, GraphError> {
        self.build_graph_cached(tree, entry, &mut TranspileCache::new())
    }

    /// Build the graph reachable from `entry`, reusing and then pruning
    /// `cache`.
    ///
    /// # Errors
    /// Same as [`build_graph`](Self::build_graph).
    pub fn build_graph_cached(
        &self,
        tree: &FileTree,
        entry: &str,
        cache: &mut TranspileCache,
    ) -> Result<ModuleGraph, GraphError> {
        let entry = path::normalize(entry)
            .ok()
            .filter(|p| tree.is_file(p))
            .ok_or_else(|| GraphError::EntryNotFound {
                path: entry.to_string(),
            })?;
        if !self.engine.is_script(&entry) {
            return Err(GraphError::EntryNotScript { path: entry });
        }

        let mut graph = ModuleGraph::new(entry.clone());
        let mut walk = Walk::default();
        walk.enqueue(&entry, ModuleKind::Local);

        while let Some((file, kind)) = walk.queue.pop_front() {
            let record = if self.engine.is_script(&file) {
                let module = self.transpile(tree, &file, cache, &mut graph);
                Self::visit_script(module, kind, &mut walk, &mut graph)
            } else {
                Self::load_asset(tree, &file, kind, &walk, &mut graph)
            };
            graph.add(record);
        }

        self.finish(&mut walk, &mut graph);

        let removed = cache.prune();
        let stats = graph.stats();
        tracing::info!(
            entry = %entry,
            modules = graph.len(),
            transpiled = stats.transpiled,
            cached = stats.cached,
            placeholders = stats.placeholders,
            evicted = removed,
            "built module graph"
        );
        Ok(graph)
    }

    fn transpile(
        &self,
        tree: &FileTree,
        file: &str,
        cache: &mut TranspileCache,
        graph: &mut ModuleGraph,
    ) -> TranspiledModule {
        let source = tree.read(file).unwrap_or_default();
        let key = TranspileCache::key(&self.engine.spec_for(file), file, source);

        if let Some(module) = cache
            .get(&key)
            .filter(|m| self.engine.is_fresh(tree, m))
            .cloned()
        {
            tracing::debug!(path = file, "transpile cache hit");
            graph.stats_mut().cached += 1;
            return module;
        }

        let module = self.engine.transpile_source(tree, file, source);
        graph.stats_mut().transpiled += 1;
        cache.insert(key, module.clone());
        module
    }

    fn visit_script(
        module: TranspiledModule,
        kind: ModuleKind,
        walk: &mut Walk,
        graph: &mut ModuleGraph,
    ) -> ModuleRecord {
        for warning in &module.warnings {
            graph.warn(GraphWarningKind::Stylesheet, &module.path, warning.clone());
        }

        let mut own_css = Vec::with_capacity(module.css.len());
        for sheet in module.css {
            own_css.push(sheet.code.clone());
            if !walk.stylesheets.contains_key(&sheet.source_path) {
                graph.push_css(sheet.code.clone());
                walk.stylesheets.insert(sheet.source_path.clone(), sheet);
            }
        }

        for import in &module.imports {
            let Some(rewritten) = import.rewritten.as_deref() else {
                continue;
            };
            walk.requested
                .entry(rewritten.to_string())
                .or_default()
                .extend(import.names.iter().cloned());

            match (import.resolution.status, import.resolution.resolved.as_deref()) {
                (ResolveStatus::Resolved, Some(resolved)) => {
                    let kind = if import.resolution.kind == SpecifierKind::Alias {
                        ModuleKind::Alias
                    } else {
                        ModuleKind::Local
                    };
                    walk.enqueue(resolved, kind);
                }
                (ResolveStatus::External, _) => {
                    if import.resolution.kind == SpecifierKind::Bare {
                        walk.bare.insert(import.specifier.clone());
                    }
                }
                _ => {
                    if !walk.unresolved.iter().any(|(s, _)| s == rewritten) {
                        walk.unresolved
                            .push((rewritten.to_string(), module.path.clone()));
                    }
                }
            }
        }

        if let Some(diagnostic) = &module.diagnostic {
            graph.warn(GraphWarningKind::SyntaxError, &module.path, diagnostic.to_string());
            graph.stats_mut().errors += 1;
            walk.failed.push((module.path.clone(), diagnostic.clone()));
        }

        let url = module_url(&module.code);
        ModuleRecord {
            specifier: module.path.clone(),
            resolved_path: Some(module.path),
            code: module.code,
            css: own_css,
            kind,
            url,
            diagnostic: module.diagnostic,
        }
    }

    /// Non-script files: stylesheets imported with bindings, JSON, text.
    fn load_asset(
        tree: &FileTree,
        file: &str,
        kind: ModuleKind,
        walk: &Walk,
        graph: &mut ModuleGraph,
    ) -> ModuleRecord {
        let source = tree.read(file).unwrap_or_default();

        let code = if css::is_stylesheet(file) {
            match walk.stylesheets.get(file) {
                Some(sheet) if css::is_css_module(file) => css::css_module_js(&sheet.exports),
                Some(sheet) => text_module(&sheet.code),
                None => text_module(source),
            }
        } else if path::extension(file) == Some("json") {
            json_module(source).unwrap_or_else(|e| {
                graph.warn(GraphWarningKind::Asset, file, format!("invalid JSON: {e}"));
                text_module(source)
            })
        } else {
            text_module(source)
        };

        tracing::debug!(path = file, "loaded asset module");
        let url = module_url(&code);
        ModuleRecord {
            specifier: file.to_string(),
            resolved_path: Some(file.to_string()),
            code,
            css: Vec::new(),
            kind,
            url,
            diagnostic: None,
        }
    }

    fn finish(&self, walk: &mut Walk, graph: &mut ModuleGraph) {
        for (file, diagnostic) in std::mem::take(&mut walk.failed) {
            let code = error_module(&diagnostic, &walk.names(&file));
            if let Some(existing) = graph.get(&file) {
                let mut record = existing.clone();
                record.url = module_url(&code);
                record.code = code;
                graph.add(record);
            }
        }

        for (specifier, importer) in std::mem::take(&mut walk.unresolved) {
            let code = placeholder_module(&specifier, &walk.names(&specifier));
            graph.warn(
                GraphWarningKind::Unresolved,
                &importer,
                format!("cannot resolve {specifier}; rendering a placeholder"),
            );
            graph.stats_mut().placeholders += 1;
            graph.add(ModuleRecord {
                url: module_url(&code),
                specifier,
                resolved_path: None,
                code,
                css: Vec::new(),
                kind: ModuleKind::Unresolved,
                diagnostic: None,
            });
        }

        let mut bare = std::mem::take(&mut walk.bare);
        bare.extend(RUNTIME_SPECIFIERS.iter().map(|s| (*s).to_string()));
        for specifier in bare {
            graph.add(ModuleRecord {
                url: self.cdn.map(&specifier),
                specifier,
                resolved_path: None,
                code: String::new(),
                css: Vec::new(),
                kind: ModuleKind::Bare,
                diagnostic: None,
            });
        }

        // CDN builds of other packages import these by bare specifier.
        for package in SHARED_PACKAGES {
            graph.map_specifier(format!("{package}/"), self.cdn.map_prefix(package));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PreviewConfig;

    fn build(tree: &FileTree, entry: &str) -> Result<ModuleGraph, GraphError> {
        let config = PreviewConfig::default();
        let engine = TranspileEngine::new(&config);
        let cdn = config.cdn().unwrap();
        ModuleGraphBuilder::new(&engine, &cdn).build_graph(tree, entry)
    }

    #[test]
    fn test_missing_entry() {
        let tree = FileTree::new();
        let err = build(&tree, "/App.jsx").unwrap_err();
        assert_eq!(err.code(), "GRAPH_ENTRY_NOT_FOUND");
    }

    #[test]
    fn test_entry_must_be_script() {
        let mut tree = FileTree::new();
        tree.create("/styles.css", "a {}").unwrap();
        let err = build(&tree, "/styles.css").unwrap_err();
        assert!(matches!(err, GraphError::EntryNotScript { .. }));
    }

    #[test]
    fn test_runtime_packages_always_mapped() {
        let mut tree = FileTree::new();
        tree.create("/App.jsx", "export default () => <div />;").unwrap();
        let graph = build(&tree, "App.jsx").unwrap();

        assert_eq!(graph.entry(), "/App.jsx");
        let map = graph.import_map();
        assert_eq!(map.get("react"), Some("https://esm.sh/react@19"));
        assert_eq!(map.get("react-dom/client"), Some("https://esm.sh/react-dom@19/client"));
        assert_eq!(map.get("react/"), Some("https://esm.sh/react@19/"));
        assert!(map.get("react/jsx-runtime").is_some());
    }

    #[test]
    fn test_json_and_text_assets() {
        let mut tree = FileTree::new();
        tree.create(
            "/App.jsx",
            "import data from './data.json';\nimport notes from './notes.txt';\nexport default () => <p>{data.n}{notes}</p>;",
        )
        .unwrap();
        tree.create("/data.json", "{\"n\": 1}").unwrap();
        tree.create("/notes.txt", "hi").unwrap();

        let graph = build(&tree, "/App.jsx").unwrap();
        assert_eq!(graph.get("/data.json").unwrap().code, "export default {\"n\":1};\n");
        assert_eq!(graph.get("/notes.txt").unwrap().code, "export default \"hi\";\n");
    }

    #[test]
    fn test_invalid_json_warns() {
        let mut tree = FileTree::new();
        tree.create("/App.jsx", "import d from './d.json';\nexport default () => d;").unwrap();
        tree.create("/d.json", "{").unwrap();

        let graph = build(&tree, "/App.jsx").unwrap();
        assert!(graph.warnings().iter().any(|w| w.kind == GraphWarningKind::Asset));
        assert_eq!(graph.get("/d.json").unwrap().code, "export default \"{\";\n");
    }

    #[test]
    fn test_alias_kind() {
        let mut tree = FileTree::new();
        tree.create("/App.jsx", "import B from '@/components/B';\nexport default () => <B />;")
            .unwrap();
        tree.create("/components/B.jsx", "export default () => null;").unwrap();

        let graph = build(&tree, "/App.jsx").unwrap();
        assert_eq!(graph.get("/components/B.jsx").unwrap().kind, ModuleKind::Alias);
        assert_eq!(graph.get("/App.jsx").unwrap().kind, ModuleKind::Local);
    }
}
