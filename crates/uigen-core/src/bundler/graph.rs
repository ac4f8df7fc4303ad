//! Module graph of one preview generation.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;

use crate::compiler::Diagnostic;

/// How a module entered the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// A file reached through a relative or absolute specifier (or the entry).
    Local,
    /// A file reached through the alias prefix.
    Alias,
    /// A third-party package served by the CDN.
    Bare,
    /// A placeholder for a local specifier that matched no file.
    Unresolved,
}

impl ModuleKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Alias => "alias",
            Self::Bare => "bare",
            Self::Unresolved => "unresolved",
        }
    }
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One module of the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRecord {
    /// Import map key: canonical path for local modules, the package
    /// specifier for bare ones.
    pub specifier: String,
    pub resolved_path: Option<String>,
    /// Loadable code. Empty for bare modules.
    pub code: String,
    /// Stylesheets this module pulled in, in import order.
    pub css: Vec<String>,
    pub kind: ModuleKind,
    /// URL the import map points the specifier at.
    pub url: String,
    /// Set when the file failed to compile and `code` renders the error.
    pub diagnostic: Option<Diagnostic>,
}

/// Specifier to URL mapping in the browser import map format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportMap {
    pub imports: BTreeMap<String, String>,
}

impl ImportMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, specifier: impl Into<String>, url: impl Into<String>) {
        self.imports.insert(specifier.into(), url.into());
    }

    #[must_use]
    pub fn get(&self, specifier: &str) -> Option<&str> {
        self.imports.get(specifier).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.imports.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }

    /// JSON text for a `<script type="importmap">` element. Keys are
    /// sorted, so equal maps give equal text.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{\"imports\":{}}".to_string())
    }
}

/// Kind of a non-fatal problem met while building the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphWarningKind {
    /// A local import matched no file; a placeholder was used.
    Unresolved,
    /// A file failed to compile; an error module was used.
    SyntaxError,
    /// A stylesheet was missing or could not be processed.
    Stylesheet,
    /// A data file could not be loaded as a module.
    Asset,
}

impl GraphWarningKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unresolved => "unresolved",
            Self::SyntaxError => "syntax-error",
            Self::Stylesheet => "stylesheet",
            Self::Asset => "asset",
        }
    }
}

/// A non-fatal problem met while building the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphWarning {
    pub kind: GraphWarningKind,
    /// The file the warning is about.
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for GraphWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.kind.as_str(), self.path, self.message)
    }
}

/// Counters for one build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    /// Files compiled in this build.
    pub transpiled: usize,
    /// Files served from the transpile cache.
    pub cached: usize,
    /// Placeholder modules synthesized.
    pub placeholders: usize,
    /// Files replaced by an error module.
    pub errors: usize,
}

/// Result of one graph build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleGraph {
    entry: String,
    modules: Vec<ModuleRecord>,
    index: BTreeMap<String, usize>,
    import_map: ImportMap,
    css: Vec<String>,
    warnings: Vec<GraphWarning>,
    stats: GraphStats,
}

impl ModuleGraph {
    pub(crate) fn new(entry: String) -> Self {
        Self {
            entry,
            modules: Vec::new(),
            index: BTreeMap::new(),
            import_map: ImportMap::new(),
            css: Vec::new(),
            warnings: Vec::new(),
            stats: GraphStats::default(),
        }
    }

    /// Add a module and map its specifier to its URL. A later module with
    /// the same specifier replaces the earlier one.
    pub(crate) fn add(&mut self, module: ModuleRecord) {
        self.import_map.insert(module.specifier.clone(), module.url.clone());
        if let Some(&i) = self.index.get(&module.specifier) {
            self.modules[i] = module;
        } else {
            self.index.insert(module.specifier.clone(), self.modules.len());
            self.modules.push(module);
        }
    }

    pub(crate) fn map_specifier(&mut self, specifier: impl Into<String>, url: impl Into<String>) {
        self.import_map.insert(specifier, url);
    }

    pub(crate) fn push_css(&mut self, css: String) {
        self.css.push(css);
    }

    pub(crate) fn warn(&mut self, kind: GraphWarningKind, path: &str, message: impl Into<String>) {
        let warning = GraphWarning {
            kind,
            path: path.to_string(),
            message: message.into(),
        };
        tracing::warn!(kind = kind.as_str(), path, message = %warning.message, "graph warning");
        self.warnings.push(warning);
    }

    pub(crate) fn stats_mut(&mut self) -> &mut GraphStats {
        &mut self.stats
    }

    /// Canonical path of the entry module.
    #[must_use]
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Modules in discovery order; placeholders and bare modules follow
    /// the walked files.
    #[must_use]
    pub fn modules(&self) -> &[ModuleRecord] {
        &self.modules
    }

    #[must_use]
    pub fn get(&self, specifier: &str) -> Option<&ModuleRecord> {
        self.index.get(specifier).map(|&i| &self.modules[i])
    }

    #[must_use]
    pub fn import_map(&self) -> &ImportMap {
        &self.import_map
    }

    /// Stylesheets of every reachable file, de-duplicated, in first-seen
    /// order.
    #[must_use]
    pub fn css(&self) -> &[String] {
        &self.css
    }

    #[must_use]
    pub fn warnings(&self) -> &[GraphWarning] {
        &self.warnings
    }

    #[must_use]
    pub fn stats(&self) -> GraphStats {
        self.stats
    }

    /// Placeholder modules, in the order they were synthesized.
    pub fn placeholders(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.modules
            .iter()
            .filter(|m| m.kind == ModuleKind::Unresolved)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// `data:` URL carrying `code` as a JavaScript module.
#[must_use]
pub fn module_url(code: &str) -> String {
    format!("data:text/javascript;base64,{}", STANDARD.encode(code))
}
