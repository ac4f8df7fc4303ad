//! Bare specifier to CDN URL mapping.
//!
//! Mapping depends only on the specifier and the mapper's settings.
//! Nothing is fetched.

use std::collections::BTreeMap;
use url::Url;

/// Packages that must exist once per document. Other packages are served
/// with these marked external so they share the page's copy.
pub const SHARED_PACKAGES: &[&str] = &["react", "react-dom"];

/// Maps bare specifiers onto `<base>/<package>[@version]<subpath>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnMapper {
    base: String,
    pins: BTreeMap<String, String>,
}

impl CdnMapper {
    /// Create a mapper.
    ///
    /// # Errors
    /// Returns a reason string if `base` is not an http(s) URL.
    pub fn new(base: &str, pins: BTreeMap<String, String>) -> Result<Self, String> {
        let url = Self::parse_base(base)?;
        Ok(Self {
            base: url.as_str().trim_end_matches('/').to_string(),
            pins,
        })
    }

    /// Parse and check a CDN base URL.
    ///
    /// # Errors
    /// Returns a reason string for unparsable or non-http(s) URLs.
    pub fn parse_base(base: &str) -> Result<Url, String> {
        let url = Url::parse(base).map_err(|e| format!("{base:?} is not a URL: {e}"))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(format!("unsupported scheme {other:?}, expected http or https")),
        }
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Pinned version for `package`, if any.
    #[must_use]
    pub fn pinned(&self, package: &str) -> Option<&str> {
        self.pins.get(package).map(String::as_str)
    }

    /// URL for a bare specifier.
    ///
    /// `react-dom/client` with `react-dom` pinned to 19 maps to
    /// `https://esm.sh/react-dom@19/client`.
    #[must_use]
    pub fn map(&self, specifier: &str) -> String {
        let (package, subpath) = split_package(specifier);
        let mut url = format!("{}/{}{}", self.base, self.versioned(package), subpath);
        if !SHARED_PACKAGES.contains(&package) {
            url.push_str("?external=");
            url.push_str(&SHARED_PACKAGES.join(","));
        }
        url
    }

    /// URL prefix for every subpath of `package`, ending with `/`.
    #[must_use]
    pub fn map_prefix(&self, package: &str) -> String {
        format!("{}/{}/", self.base, self.versioned(package))
    }

    fn versioned(&self, package: &str) -> String {
        match self.pinned(package) {
            Some(version) => format!("{package}@{version}"),
            None => package.to_string(),
        }
    }
}

/// Split a bare specifier into package name and subpath (`""` or `/...`).
///
/// Scoped packages keep their scope: `@tanstack/react-query/devtools`
/// splits into `@tanstack/react-query` and `/devtools`.
#[must_use]
pub fn split_package(specifier: &str) -> (&str, &str) {
    let name_segments = if specifier.starts_with('@') { 2 } else { 1 };
    let end = specifier
        .match_indices('/')
        .nth(name_segments - 1)
        .map_or(specifier.len(), |(i, _)| i);
    specifier.split_at(end)
}
