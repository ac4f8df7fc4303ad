//! Import specifier resolution over the virtual tree.
//!
//! Supports:
//! - Relative specifiers: `./`, `../`
//! - Absolute virtual paths: `/src/util`
//! - Alias specifiers: `@/components/Button` (prefix mapped to `/`)
//! - Extension probing and `index.*` directory resolution
//!
//! Bare package names and URLs are classified but never looked up; the graph
//! maps them onto the CDN or leaves them to the browser.

use crate::vfs::FileTree;
use uigen_util::path;

/// Default extensions for probing, in priority order.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".mjs", ".json"];

/// Maximum number of tried paths to record.
const MAX_TRIED_PATHS: usize = 20;

/// Resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Specifier prefix mapped to the virtual root.
    pub alias_prefix: String,
    /// Extensions to try (in order).
    pub extensions: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            alias_prefix: "@/".to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
        }
    }
}

/// Syntactic class of a specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecifierKind {
    /// `./x` or `../x`.
    Relative,
    /// `/x`.
    Absolute,
    /// `<alias prefix>x`.
    Alias,
    /// `scheme://...` or `data:`; left to the browser.
    Url,
    /// A package name.
    Bare,
}

impl SpecifierKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relative => "relative",
            Self::Absolute => "absolute",
            Self::Alias => "alias",
            Self::Url => "url",
            Self::Bare => "bare",
        }
    }

    /// Whether the specifier names a file in the virtual tree.
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Relative | Self::Absolute | Self::Alias)
    }
}

impl std::fmt::Display for SpecifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStatus {
    Resolved,
    Unresolved,
    /// Bare or URL specifier, handled outside the tree.
    External,
}

/// Reason codes for unresolved imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveReasonCode {
    SpecifierInvalid,
    OutsideRoot,
    NotFound,
}

impl ResolveReasonCode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SpecifierInvalid => "SPECIFIER_INVALID",
            Self::OutsideRoot => "OUTSIDE_ROOT",
            Self::NotFound => "NOT_FOUND",
        }
    }
}

impl std::fmt::Display for ResolveReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolution result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveResult {
    /// Syntactic class of the specifier.
    pub kind: SpecifierKind,
    /// Status.
    pub status: ResolveStatus,
    /// Resolved file path (if successful).
    pub resolved: Option<String>,
    /// Normalized path the specifier points at, before probing.
    pub candidate: Option<String>,
    /// Reason code if unresolved.
    pub reason: Option<ResolveReasonCode>,
    /// Candidate paths tried (capped).
    pub tried: Vec<String>,
}

impl ResolveResult {
    fn resolved(kind: SpecifierKind, path: String, candidate: String, tried: Vec<String>) -> Self {
        Self {
            kind,
            status: ResolveStatus::Resolved,
            resolved: Some(path),
            candidate: Some(candidate),
            reason: None,
            tried,
        }
    }

    fn unresolved(
        kind: SpecifierKind,
        reason: ResolveReasonCode,
        candidate: Option<String>,
        tried: Vec<String>,
    ) -> Self {
        Self {
            kind,
            status: ResolveStatus::Unresolved,
            resolved: None,
            candidate,
            reason: Some(reason),
            tried,
        }
    }

    fn external(kind: SpecifierKind) -> Self {
        Self {
            kind,
            status: ResolveStatus::External,
            resolved: None,
            candidate: None,
            reason: None,
            tried: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.status == ResolveStatus::Resolved
    }

    /// The path this specifier should be rewritten to: the resolved file,
    /// or the normalized candidate when unresolved.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.resolved.as_deref().or(self.candidate.as_deref())
    }
}

/// Resolves specifiers against a [`FileTree`].
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    config: ResolverConfig,
}

impl PathResolver {
    #[must_use]
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Classify a specifier without touching the tree.
    #[must_use]
    pub fn classify(&self, spec: &str) -> SpecifierKind {
        if spec.contains("://") || spec.starts_with("data:") || spec.starts_with("blob:") {
            SpecifierKind::Url
        } else if spec == "." || spec == ".." || spec.starts_with("./") || spec.starts_with("../") {
            SpecifierKind::Relative
        } else if spec.starts_with('/') {
            SpecifierKind::Absolute
        } else if spec.starts_with(self.config.alias_prefix.as_str()) {
            SpecifierKind::Alias
        } else {
            SpecifierKind::Bare
        }
    }

    /// Resolve `spec` as imported from the file at `from_path`.
    ///
    /// Never fails: problems are reported through the result's status and
    /// reason code.
    #[must_use]
    pub fn resolve(&self, tree: &FileTree, spec: &str, from_path: &str) -> ResolveResult {
        let kind = self.classify(spec);

        if spec.trim().is_empty() {
            return ResolveResult::unresolved(
                SpecifierKind::Relative,
                ResolveReasonCode::SpecifierInvalid,
                None,
                Vec::new(),
            );
        }

        let joined = match kind {
            SpecifierKind::Url | SpecifierKind::Bare => return ResolveResult::external(kind),
            SpecifierKind::Relative => {
                let from_dir = path::parent(from_path).unwrap_or(path::ROOT);
                path::join(from_dir, spec)
            }
            SpecifierKind::Absolute => path::normalize(spec),
            SpecifierKind::Alias => {
                let rest = &spec[self.config.alias_prefix.len()..];
                path::normalize(&format!("/{rest}"))
            }
        };

        let Ok(base) = joined else {
            return ResolveResult::unresolved(kind, ResolveReasonCode::OutsideRoot, None, Vec::new());
        };

        let result = self.resolve_path(tree, kind, base);
        tracing::trace!(
            specifier = spec,
            from = from_path,
            status = ?result.status,
            resolved = ?result.resolved,
            "resolve"
        );
        result
    }

    /// Exact file, then extension probing, then `index.*`.
    fn resolve_path(&self, tree: &FileTree, kind: SpecifierKind, base: String) -> ResolveResult {
        let mut tried = Vec::new();

        add_tried(&mut tried, &base);
        if tree.is_file(&base) {
            return ResolveResult::resolved(kind, base.clone(), base, tried);
        }

        if base != path::ROOT {
            for ext in &self.config.extensions {
                let with_ext = format!("{base}{ext}");
                add_tried(&mut tried, &with_ext);
                if tree.is_file(&with_ext) {
                    return ResolveResult::resolved(kind, with_ext, base, tried);
                }
            }
        }

        for ext in &self.config.extensions {
            let index = path::child(&base, &format!("index{ext}"));
            add_tried(&mut tried, &index);
            if tree.is_file(&index) {
                return ResolveResult::resolved(kind, index, base, tried);
            }
        }

        ResolveResult::unresolved(kind, ResolveReasonCode::NotFound, Some(base), tried)
    }
}

fn add_tried(tried: &mut Vec<String>, path: &str) {
    if tried.len() < MAX_TRIED_PATHS {
        tried.push(path.to_string());
    }
}
