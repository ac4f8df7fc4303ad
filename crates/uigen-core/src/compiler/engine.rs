//! Per-file transpilation against the virtual tree.

use std::collections::BTreeMap;

use super::{
    CompilerBackend, Diagnostic, EsTarget, ImportSite, ImportSiteKind, JsxRuntime, RewriteAction,
    SpecifierRewriter, SwcBackend, TranspileSpec,
};
use crate::config::PreviewConfig;
use crate::css;
use crate::resolver::{PathResolver, ResolveResult};
use crate::vfs::{FileTree, VfsError};
use uigen_util::{hash, path};

/// One import found while transpiling a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    /// The specifier as written.
    pub specifier: String,
    pub kind: ImportSiteKind,
    pub resolution: ResolveResult,
    /// The specifier now present in the emitted code; `None` if the
    /// statement was removed.
    pub rewritten: Option<String>,
    /// Names the importer expects the target to export.
    pub names: Vec<String>,
}

impl ImportRecord {
    /// Whether the emitted code still references a local module.
    #[must_use]
    pub fn is_local_module(&self) -> bool {
        self.resolution.kind.is_local() && self.rewritten.is_some()
    }
}

/// A stylesheet pulled out of the code stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylesheetRecord {
    /// Virtual path of the stylesheet.
    pub source_path: String,
    /// BLAKE3 of the stylesheet and of every Sass partial it read, keyed
    /// by path, for cache revalidation.
    pub sources: BTreeMap<String, String>,
    /// Processed CSS.
    pub code: String,
    /// CSS Modules class map (empty for plain stylesheets).
    pub exports: BTreeMap<String, String>,
}

/// Result of transpiling one file.
///
/// A syntax error does not fail the call: `diagnostic` is set and `code`
/// is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranspiledModule {
    pub path: String,
    pub code: String,
    pub imports: Vec<ImportRecord>,
    pub css: Vec<StylesheetRecord>,
    pub diagnostic: Option<Diagnostic>,
    /// Non-fatal problems (missing stylesheets, CSS that failed to parse).
    pub warnings: Vec<String>,
}

impl TranspiledModule {
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.diagnostic.is_some()
    }
}

/// Converts virtual JSX/TSX files into browser-loadable modules.
pub struct TranspileEngine {
    backend: Box<dyn CompilerBackend>,
    resolver: PathResolver,
    jsx_runtime: JsxRuntime,
    target: EsTarget,
}

impl std::fmt::Debug for TranspileEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranspileEngine")
            .field("backend", &self.backend.name())
            .field("resolver", &self.resolver)
            .field("jsx_runtime", &self.jsx_runtime)
            .field("target", &self.target)
            .finish()
    }
}

impl Default for TranspileEngine {
    fn default() -> Self {
        Self::new(&PreviewConfig::default())
    }
}

impl TranspileEngine {
    /// Create an engine backed by SWC.
    #[must_use]
    pub fn new(config: &PreviewConfig) -> Self {
        Self {
            backend: Box::new(SwcBackend::new()),
            resolver: PathResolver::new(config.resolver()),
            jsx_runtime: config.jsx_runtime,
            target: config.target,
        }
    }

    /// Swap the compiler backend.
    #[must_use]
    pub fn with_backend(mut self, backend: Box<dyn CompilerBackend>) -> Self {
        self.backend = backend;
        self
    }

    #[must_use]
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Whether the backend handles this file's extension.
    #[must_use]
    pub fn is_script(&self, file: &str) -> bool {
        path::extension(file).is_some_and(|ext| self.backend.supports_extension(ext))
    }

    /// The spec used for `file`.
    #[must_use]
    pub fn spec_for(&self, file: &str) -> TranspileSpec {
        TranspileSpec::new(file)
            .with_jsx_runtime(self.jsx_runtime)
            .with_target(self.target)
    }

    /// Read `file` from the tree and transpile it.
    ///
    /// # Errors
    /// `NotFound` or `WrongType` when `file` is not a readable file.
    pub fn transpile_file(&self, tree: &FileTree, file: &str) -> Result<TranspiledModule, VfsError> {
        let file = path::normalize(file).map_err(|e| VfsError::InvalidPath {
            path: file.to_string(),
            reason: e.to_string(),
        })?;
        let source = tree.view(&file, None)?;
        Ok(self.transpile_source(tree, &file, &source))
    }

    /// Transpile `source` as if it lived at `file`, resolving imports
    /// against `tree`.
    #[must_use]
    pub fn transpile_source(&self, tree: &FileTree, file: &str, source: &str) -> TranspiledModule {
        let spec = self.spec_for(file);
        let mut rewriter = TreeRewriter {
            tree,
            resolver: &self.resolver,
            from: file,
            imports: Vec::new(),
            css: Vec::new(),
            warnings: Vec::new(),
        };

        match self.backend.transpile(&spec, source, &mut rewriter) {
            Ok(output) => {
                tracing::debug!(
                    path = file,
                    imports = rewriter.imports.len(),
                    stylesheets = rewriter.css.len(),
                    "transpiled"
                );
                TranspiledModule {
                    path: file.to_string(),
                    code: output.code,
                    imports: rewriter.imports,
                    css: rewriter.css,
                    diagnostic: None,
                    warnings: rewriter.warnings,
                }
            }
            Err(err) => {
                let diagnostic = err.primary_diagnostic();
                tracing::warn!(path = file, error = %diagnostic, "syntax error");
                TranspiledModule {
                    path: file.to_string(),
                    code: String::new(),
                    imports: Vec::new(),
                    css: Vec::new(),
                    diagnostic: Some(diagnostic),
                    warnings: Vec::new(),
                }
            }
        }
    }

    /// Whether a previously transpiled module is still valid for `tree`:
    /// every import resolves to the same target and every inlined
    /// stylesheet is unchanged.
    #[must_use]
    pub fn is_fresh(&self, tree: &FileTree, module: &TranspiledModule) -> bool {
        let imports_fresh = module.imports.iter().all(|import| {
            let now = self.resolver.resolve(tree, &import.specifier, &module.path);
            now.status == import.resolution.status && now.target() == import.resolution.target()
        });

        imports_fresh
            && module.css.iter().all(|sheet| {
                sheet.sources.iter().all(|(file, digest)| {
                    tree.read(file)
                        .is_some_and(|text| hash::blake3_bytes(text.as_bytes()) == *digest)
                })
            })
    }
}

/// Resolves specifiers against the tree while the backend walks the AST.
struct TreeRewriter<'a> {
    tree: &'a FileTree,
    resolver: &'a PathResolver,
    from: &'a str,
    imports: Vec<ImportRecord>,
    css: Vec<StylesheetRecord>,
    warnings: Vec<String>,
}

impl TreeRewriter<'_> {
    fn record(&mut self, site: &ImportSite<'_>, resolution: ResolveResult, rewritten: Option<String>) {
        self.imports.push(ImportRecord {
            specifier: site.specifier.to_string(),
            kind: site.kind,
            resolution,
            rewritten,
            names: site.names.clone(),
        });
    }

    fn collect_stylesheet(&mut self, specifier: &str, resolution: &ResolveResult) {
        let Some(sheet_path) = resolution.resolved.as_deref() else {
            self.warnings
                .push(format!("stylesheet {specifier} imported by {} not found", self.from));
            return;
        };
        if self.css.iter().any(|s| s.source_path == sheet_path) {
            return;
        }
        let source = self.tree.read(sheet_path).unwrap_or_default();
        let mut sources = BTreeMap::new();
        sources.insert(sheet_path.to_string(), hash::blake3_bytes(source.as_bytes()));

        let (code, exports) = match css::load_stylesheet(self.tree, sheet_path, source) {
            Ok(result) => {
                for file in result.imports {
                    if let Some(text) = self.tree.read(&file) {
                        sources.insert(file, hash::blake3_bytes(text.as_bytes()));
                    }
                }
                (result.code, result.exports)
            }
            Err(e) => {
                self.warnings
                    .push(format!("{sheet_path}: {e}; using the stylesheet as written"));
                (source.to_string(), BTreeMap::new())
            }
        };

        self.css.push(StylesheetRecord {
            source_path: sheet_path.to_string(),
            sources,
            code,
            exports,
        });
    }
}

impl SpecifierRewriter for TreeRewriter<'_> {
    fn rewrite(&mut self, site: &ImportSite<'_>) -> RewriteAction {
        let resolution = self.resolver.resolve(self.tree, site.specifier, self.from);

        if !resolution.kind.is_local() {
            self.record(site, resolution, Some(site.specifier.to_string()));
            return RewriteAction::Keep;
        }

        let Some(target) = resolution.target().map(str::to_string) else {
            self.record(site, resolution, Some(site.specifier.to_string()));
            return RewriteAction::Keep;
        };

        if css::is_stylesheet(&target) {
            self.collect_stylesheet(site.specifier, &resolution);
            if site.kind == ImportSiteKind::SideEffect {
                self.record(site, resolution, None);
                return RewriteAction::Remove;
            }
        }

        self.record(site, resolution, Some(target.clone()));
        RewriteAction::Replace(target)
    }
}
