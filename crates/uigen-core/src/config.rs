use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::bundler::CdnMapper;
use crate::compiler::{EsTarget, JsxRuntime};
use crate::resolver::{ResolverConfig, DEFAULT_EXTENSIONS};
use crate::{Error, Result};

/// Default CDN serving ES module builds of npm packages.
pub const DEFAULT_CDN_BASE: &str = "https://esm.sh";

/// Default alias prefix mapped to the virtual root.
pub const DEFAULT_ALIAS_PREFIX: &str = "@/";

/// Entry files tried in order when the caller names none.
pub const DEFAULT_ENTRY_CANDIDATES: &[&str] = &[
    "/App.jsx",
    "/App.tsx",
    "/index.jsx",
    "/index.tsx",
    "/src/App.jsx",
    "/src/App.tsx",
];

/// Configuration for preview generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Specifier prefix that maps to `/`.
    pub alias_prefix: String,

    /// Extensions the resolver tries, in order.
    pub extensions: Vec<String>,

    /// JSX transform mode.
    pub jsx_runtime: JsxRuntime,

    /// ECMAScript syntax level of emitted code.
    pub target: EsTarget,

    /// Base URL bare specifiers are mapped onto.
    pub cdn_base: String,

    /// Pinned package versions, e.g. `react -> 19`.
    pub pinned_versions: BTreeMap<String, String>,

    /// Whether the document loads the Tailwind CDN script.
    pub tailwind: bool,

    /// Entry files tried in order by auto-detection.
    pub entry_candidates: Vec<String>,

    /// Document title.
    pub title: String,

    /// Whether to emit JSON logs.
    pub json_logs: bool,

    /// Verbosity level (0 = INFO, 1 = DEBUG, 2+ = TRACE).
    pub verbosity: u8,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        let pinned_versions = [("react", "19"), ("react-dom", "19")]
            .into_iter()
            .map(|(name, version)| (name.to_string(), version.to_string()))
            .collect();

        Self {
            alias_prefix: DEFAULT_ALIAS_PREFIX.to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
            jsx_runtime: JsxRuntime::Automatic,
            target: EsTarget::default(),
            cdn_base: DEFAULT_CDN_BASE.to_string(),
            pinned_versions,
            tailwind: true,
            entry_candidates: DEFAULT_ENTRY_CANDIDATES
                .iter()
                .map(|e| (*e).to_string())
                .collect(),
            title: "Preview".to_string(),
            json_logs: false,
            verbosity: 0,
        }
    }
}

impl PreviewConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a config file.
    ///
    /// Missing keys take their default values.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a config from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot check.
    pub fn validate(&self) -> Result<()> {
        CdnMapper::parse_base(&self.cdn_base).map_err(|reason| Error::InvalidConfig {
            field: "cdn_base",
            reason,
        })?;

        if self.alias_prefix.is_empty()
            || self.alias_prefix.starts_with('.')
            || self.alias_prefix.starts_with('/')
        {
            return Err(Error::InvalidConfig {
                field: "alias_prefix",
                reason: format!("{:?} would shadow local specifiers", self.alias_prefix),
            });
        }

        if let Some(ext) = self.extensions.iter().find(|e| !e.starts_with('.') || e.len() < 2) {
            return Err(Error::InvalidConfig {
                field: "extensions",
                reason: format!("{ext:?} must start with a dot"),
            });
        }

        Ok(())
    }

    /// Resolver settings derived from this config.
    #[must_use]
    pub fn resolver(&self) -> ResolverConfig {
        ResolverConfig {
            alias_prefix: self.alias_prefix.clone(),
            extensions: self.extensions.clone(),
        }
    }

    /// CDN mapping derived from this config.
    pub fn cdn(&self) -> Result<CdnMapper> {
        CdnMapper::new(&self.cdn_base, self.pinned_versions.clone()).map_err(|reason| {
            Error::InvalidConfig {
                field: "cdn_base",
                reason,
            }
        })
    }

    /// Set the alias prefix.
    #[must_use]
    pub fn with_alias_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.alias_prefix = prefix.into();
        self
    }

    /// Set the extensions the resolver tries.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the JSX runtime.
    #[must_use]
    pub fn with_jsx_runtime(mut self, runtime: JsxRuntime) -> Self {
        self.jsx_runtime = runtime;
        self
    }

    /// Set the ECMAScript target.
    #[must_use]
    pub fn with_target(mut self, target: EsTarget) -> Self {
        self.target = target;
        self
    }

    /// Set the CDN base URL.
    #[must_use]
    pub fn with_cdn_base(mut self, base: impl Into<String>) -> Self {
        self.cdn_base = base.into();
        self
    }

    /// Pin a package to a version.
    #[must_use]
    pub fn with_pinned_version(mut self, package: impl Into<String>, version: impl Into<String>) -> Self {
        self.pinned_versions.insert(package.into(), version.into());
        self
    }

    /// Enable or disable the Tailwind script.
    #[must_use]
    pub fn with_tailwind(mut self, tailwind: bool) -> Self {
        self.tailwind = tailwind;
        self
    }

    /// Set the entry candidates.
    #[must_use]
    pub fn with_entry_candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entry_candidates = candidates.into_iter().map(Into::into).collect();
        self
    }

    /// Set the document title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set JSON log output.
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }

    /// Set verbosity level.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PreviewConfig::default();
        assert_eq!(config.alias_prefix, "@/");
        assert_eq!(config.extensions[0], ".ts");
        assert_eq!(config.pinned_versions.get("react").map(String::as_str), Some("19"));
        assert!(config.tailwind);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PreviewConfig::from_json_str(r#"{"tailwind": false, "title": "Demo"}"#).unwrap();
        assert!(!config.tailwind);
        assert_eq!(config.title, "Demo");
        assert_eq!(config.cdn_base, DEFAULT_CDN_BASE);
    }

    #[test]
    fn test_invalid_cdn_base() {
        let err = PreviewConfig::from_json_str(r#"{"cdn_base": "not a url"}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { field: "cdn_base", .. }));

        let err = PreviewConfig::from_json_str(r#"{"cdn_base": "ftp://cdn.example"}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { field: "cdn_base", .. }));
    }

    #[test]
    fn test_invalid_alias_and_extensions() {
        assert!(PreviewConfig::new().with_alias_prefix("./").validate().is_err());
        assert!(PreviewConfig::new().with_extensions(["ts"]).validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"alias_prefix": "~/", "verbosity": 2}}"#).unwrap();

        let config = PreviewConfig::load(file.path()).unwrap();
        assert_eq!(config.alias_prefix, "~/");
        assert_eq!(config.verbosity, 2);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            PreviewConfig::load(&missing),
            Err(Error::ConfigRead { .. })
        ));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ nope").unwrap();
        assert!(matches!(
            PreviewConfig::load(&bad),
            Err(Error::ConfigParse { .. })
        ));
    }
}
