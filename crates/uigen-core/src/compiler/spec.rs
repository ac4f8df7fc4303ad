//! Transpilation specification types.
//!
//! A `TranspileSpec` captures every option that affects output, so its
//! canonical encoding can key the transpile cache.

use serde::{Deserialize, Serialize};

/// JSX runtime mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JsxRuntime {
    /// Classic JSX transform (React.createElement).
    Classic,
    /// Automatic JSX transform (React 17+ / jsx-runtime).
    #[default]
    Automatic,
}

impl JsxRuntime {
    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Automatic => "automatic",
        }
    }
}

impl std::fmt::Display for JsxRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// ECMAScript target version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EsTarget {
    #[serde(rename = "es2018")]
    ES2018,
    #[serde(rename = "es2019")]
    ES2019,
    #[serde(rename = "es2020")]
    ES2020,
    #[serde(rename = "es2021")]
    ES2021,
    #[default]
    #[serde(rename = "es2022")]
    ES2022,
    /// Latest ECMAScript features.
    #[serde(rename = "esnext")]
    ESNext,
}

impl EsTarget {
    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ES2018 => "es2018",
            Self::ES2019 => "es2019",
            Self::ES2020 => "es2020",
            Self::ES2021 => "es2021",
            Self::ES2022 => "es2022",
            Self::ESNext => "esnext",
        }
    }
}

impl std::fmt::Display for EsTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A compiler error message with an optional source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Human-readable message.
    pub message: String,
    /// Virtual path of the source file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Line number (1-indexed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Column number (1-indexed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file: None,
            line: None,
            column: None,
        }
    }

    /// Set the source location.
    #[must_use]
    pub fn with_location(mut self, file: impl Into<String>, line: u32, column: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let (Some(file), Some(line), Some(col)) = (&self.file, self.line, self.column) {
            write!(f, " ({file}:{line}:{col})")?;
        }
        Ok(())
    }
}

/// Transpilation specification for one virtual file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct TranspileSpec {
    /// Virtual path of the input file; its extension selects the syntax.
    pub input_path: String,
    /// JSX runtime mode.
    #[serde(default)]
    pub jsx_runtime: JsxRuntime,
    /// ECMAScript target version.
    #[serde(default)]
    pub target: EsTarget,
}

impl TranspileSpec {
    /// Create a new transpile spec with default options.
    #[must_use]
    pub fn new(input_path: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            ..Self::default()
        }
    }

    /// Set the JSX runtime mode.
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

    /// Get a deterministic canonical encoding for hashing.
    #[must_use]
    pub fn canonical_encoding(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        buf.extend_from_slice(b"input:");
        buf.extend_from_slice(self.input_path.as_bytes());
        buf.push(0);

        buf.extend_from_slice(b"jsx:");
        buf.extend_from_slice(self.jsx_runtime.as_str().as_bytes());
        buf.push(0);

        buf.extend_from_slice(b"target:");
        buf.extend_from_slice(self.target.as_str().as_bytes());
        buf.push(0);

        buf
    }
}

/// Output from a successful transpilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranspileOutput {
    /// Transpiled JavaScript code.
    pub code: String,
}

impl TranspileOutput {
    /// Create a new transpile output.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jsx_runtime_serialization() {
        assert_eq!(serde_json::to_string(&JsxRuntime::Classic).unwrap(), "\"classic\"");
        assert_eq!(
            serde_json::to_string(&JsxRuntime::Automatic).unwrap(),
            "\"automatic\""
        );
    }

    #[test]
    fn test_es_target_serialization() {
        assert_eq!(serde_json::to_string(&EsTarget::ES2022).unwrap(), "\"es2022\"");
        let next: EsTarget = serde_json::from_str("\"esnext\"").unwrap();
        assert_eq!(next, EsTarget::ESNext);
    }

    #[test]
    fn test_canonical_encoding_changes_with_options() {
        let a = TranspileSpec::new("/App.jsx");
        let b = a.clone().with_jsx_runtime(JsxRuntime::Classic);
        let c = a.clone().with_target(EsTarget::ES2018);

        assert_eq!(a.canonical_encoding(), TranspileSpec::new("/App.jsx").canonical_encoding());
        assert_ne!(a.canonical_encoding(), b.canonical_encoding());
        assert_ne!(a.canonical_encoding(), c.canonical_encoding());
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::error("Unexpected token").with_location("/App.jsx", 3, 7);
        assert_eq!(diag.to_string(), "Unexpected token (/App.jsx:3:7)");
        assert_eq!(Diagnostic::error("bare").to_string(), "bare");
    }
}
