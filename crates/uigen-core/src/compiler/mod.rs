//! Compiler backend abstraction for transpilation.
//!
//! The rest of the crate never calls SWC directly: it goes through
//! [`CompilerBackend`], and import specifiers are rewritten through a
//! [`SpecifierRewriter`] callback so the backend stays ignorant of the
//! virtual tree.
//!
//! ```ignore
//! use uigen_core::compiler::{CompilerBackend, KeepSpecifiers, SwcBackend, TranspileSpec};
//!
//! let backend = SwcBackend::new();
//! let spec = TranspileSpec::new("/App.tsx");
//! let output = backend.transpile(&spec, source, &mut KeepSpecifiers)?;
//! ```

mod engine;
pub mod spec;
pub mod swc;

pub use engine::{ImportRecord, StylesheetRecord, TranspileEngine, TranspiledModule};
pub use spec::{Diagnostic, EsTarget, JsxRuntime, TranspileOutput, TranspileSpec};
pub use swc::SwcBackend;

use std::fmt;

/// Syntactic position of an import specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportSiteKind {
    /// `import x from "..."` or `import { x } from "..."`.
    Static,
    /// `import "..."` with no bindings.
    SideEffect,
    /// `export { x } from "..."` or `export * from "..."`.
    ReExport,
    /// `import("...")` with a string literal argument.
    Dynamic,
}

impl ImportSiteKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::SideEffect => "side-effect",
            Self::ReExport => "re-export",
            Self::Dynamic => "dynamic",
        }
    }
}

/// One import specifier found in a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSite<'a> {
    /// The specifier as written.
    pub specifier: &'a str,
    /// Where it appeared.
    pub kind: ImportSiteKind,
    /// Names the importer expects the target to export (`default` for
    /// default imports). Namespace imports contribute nothing.
    pub names: Vec<String>,
}

/// What to do with an import specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteAction {
    /// Leave it as written.
    Keep,
    /// Replace the specifier text.
    Replace(String),
    /// Drop the whole statement. Ignored for dynamic imports.
    Remove,
}

/// Decides how each import specifier is emitted.
pub trait SpecifierRewriter {
    fn rewrite(&mut self, site: &ImportSite<'_>) -> RewriteAction;
}

impl<F> SpecifierRewriter for F
where
    F: FnMut(&ImportSite<'_>) -> RewriteAction,
{
    fn rewrite(&mut self, site: &ImportSite<'_>) -> RewriteAction {
        self(site)
    }
}

/// Rewriter that leaves every specifier untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepSpecifiers;

impl SpecifierRewriter for KeepSpecifiers {
    fn rewrite(&mut self, _site: &ImportSite<'_>) -> RewriteAction {
        RewriteAction::Keep
    }
}

/// Error during compilation.
#[derive(Debug, Clone)]
pub struct CompilerError {
    /// Error code.
    pub code: &'static str,
    /// Human-readable error message.
    pub message: String,
    /// Compiler diagnostics (if available).
    pub diagnostics: Vec<Diagnostic>,
}

impl CompilerError {
    /// Create a new compiler error.
    #[must_use]
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            diagnostics: Vec::new(),
        }
    }

    /// Create an error with diagnostics.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Create a parse error.
    #[must_use]
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new("COMPILER_PARSE_ERROR", message)
    }

    /// Create a transform error.
    #[must_use]
    pub fn transform_error(message: impl Into<String>) -> Self {
        Self::new("COMPILER_TRANSFORM_ERROR", message)
    }

    /// The first diagnostic, or one built from the message.
    #[must_use]
    pub fn primary_diagnostic(&self) -> Diagnostic {
        self.diagnostics
            .first()
            .cloned()
            .unwrap_or_else(|| Diagnostic::error(self.message.clone()))
    }
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        for diag in &self.diagnostics {
            write!(f, "\n  - {diag}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompilerError {}

/// Compiler backend trait for transpilation.
///
/// ## Implementations
///
/// - `SwcBackend` - TypeScript strip and JSX transform with SWC
pub trait CompilerBackend: Send + Sync {
    /// Get the backend name (e.g., "swc").
    fn name(&self) -> &'static str;

    /// Transpile one file, passing every import specifier to `rewriter`.
    ///
    /// # Errors
    ///
    /// Returns a `CompilerError` if the source has syntax errors or the
    /// transformation fails.
    fn transpile(
        &self,
        spec: &TranspileSpec,
        source: &str,
        rewriter: &mut dyn SpecifierRewriter,
    ) -> Result<TranspileOutput, CompilerError>;

    /// Check if this backend supports the given file extension.
    fn supports_extension(&self, ext: &str) -> bool {
        matches!(
            ext.to_lowercase().as_str(),
            "js" | "jsx" | "ts" | "tsx" | "mjs" | "mts"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiler_error_display() {
        let diag = Diagnostic::error("Missing semicolon").with_location("/src/App.tsx", 10, 5);
        let error = CompilerError::parse_error("Parse failed").with_diagnostics(vec![diag]);

        let display = error.to_string();
        assert!(display.contains("COMPILER_PARSE_ERROR"));
        assert!(display.contains("/src/App.tsx:10:5"));
        assert!(display.contains("Missing semicolon"));
    }

    #[test]
    fn test_primary_diagnostic_falls_back_to_message() {
        let error = CompilerError::transform_error("boom");
        assert_eq!(error.primary_diagnostic().message, "boom");
    }

    #[test]
    fn test_closure_rewriter() {
        let mut seen = Vec::new();
        let mut rewriter = |site: &ImportSite<'_>| {
            seen.push(site.specifier.to_string());
            RewriteAction::Replace(format!("/{}", site.specifier))
        };
        let site = ImportSite {
            specifier: "x",
            kind: ImportSiteKind::Static,
            names: vec!["default".to_string()],
        };
        assert_eq!(rewriter.rewrite(&site), RewriteAction::Replace("/x".to_string()));
        assert_eq!(seen, vec!["x"]);
    }

    #[test]
    fn test_default_extension_support() {
        let backend = SwcBackend::new();
        assert!(backend.supports_extension("jsx"));
        assert!(backend.supports_extension("TSX"));
        assert!(!backend.supports_extension("css"));
        assert!(!backend.supports_extension("json"));
    }
}
