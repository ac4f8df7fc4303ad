//! Stylesheet processing for imported CSS.
//!
//! Stylesheets never reach the module loader as code. Their text is
//! normalized with lightningcss (nesting flattened, vendor prefixes added)
//! and concatenated into the preview document. CSS Modules additionally
//! yield a class-name map served to importers as a default export.

pub mod sass;

use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use std::collections::{BTreeMap, BTreeSet};

use crate::vfs::FileTree;
use uigen_util::path;

/// CSS processing options.
#[derive(Debug, Clone, Default)]
pub struct CssOptions {
    /// Enable CSS Modules (returns class name mappings).
    pub css_modules: bool,
    /// Add vendor prefixes and flatten nesting for the default targets.
    pub autoprefixer: bool,
    /// Source path, used in messages and CSS Modules hashes.
    pub filename: Option<String>,
}

/// A processed stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssResult {
    /// The transformed CSS code.
    pub code: String,
    /// CSS Modules exports (original name to scoped name), sorted.
    pub exports: BTreeMap<String, String>,
    /// Other virtual files read through Sass imports.
    pub imports: BTreeSet<String>,
}

/// Process CSS with lightningcss.
pub fn process_css(source: &str, options: &CssOptions) -> Result<CssResult, CssError> {
    let filename = options.filename.as_deref().unwrap_or("input.css");

    let mut parser_options = ParserOptions {
        filename: filename.to_string(),
        ..ParserOptions::default()
    };

    if options.css_modules {
        parser_options.css_modules = Some(lightningcss::css_modules::Config {
            pattern: lightningcss::css_modules::Pattern::parse("[hash]_[local]")
                .map_err(|e| CssError::Parse(format!("CSS Modules pattern error: {e}")))?,
            dashed_idents: false,
            animation: Default::default(),
            grid: Default::default(),
            container: Default::default(),
            custom_idents: Default::default(),
            pure: false,
        });
    }

    let mut stylesheet = StyleSheet::parse(source, parser_options)
        .map_err(|e| CssError::Parse(format!("{filename}: {e}")))?;

    let targets = if options.autoprefixer {
        default_browser_targets()
    } else {
        Browsers::default()
    };

    if options.autoprefixer {
        stylesheet
            .minify(MinifyOptions {
                targets: Targets::from(targets),
                ..Default::default()
            })
            .map_err(|e| CssError::Transform(format!("{filename}: {e}")))?;
    }

    let output = stylesheet
        .to_css(PrinterOptions {
            minify: false,
            targets: Targets::from(targets),
            ..Default::default()
        })
        .map_err(|e| CssError::Print(format!("{filename}: {e}")))?;

    let exports = output
        .exports
        .map(|exp| {
            exp.iter()
                .map(|(k, v)| (k.to_string(), v.name.to_string()))
                .collect()
        })
        .unwrap_or_default();

    Ok(CssResult {
        code: output.code,
        exports,
        imports: BTreeSet::new(),
    })
}

/// Whether a path names a stylesheet (`.css`, `.scss`, `.sass`).
#[must_use]
pub fn is_stylesheet(file: &str) -> bool {
    matches!(path::extension(file), Some("css" | "scss" | "sass"))
}

/// Whether a path names a CSS Module (`x.module.css`, `x.module.scss`).
#[must_use]
pub fn is_css_module(file: &str) -> bool {
    let name = path::file_name(file);
    name.ends_with(".module.css") || name.ends_with(".module.scss")
}

/// Compile (if Sass) and normalize the stylesheet `file` whose text is
/// `source`. Sass imports resolve against `tree`.
///
/// CSS Modules are detected by file name.
pub fn load_stylesheet(tree: &FileTree, file: &str, source: &str) -> Result<CssResult, CssError> {
    let (css, imports) = if sass::is_sass_file(file) {
        let options = sass::SassOptions {
            filename: Some(file.to_string()),
        };
        let output = sass::compile_sass_in(tree, source, &options)
            .map_err(|e| CssError::Sass(e.to_string()))?;
        (output.css, output.imports)
    } else {
        (source.to_string(), BTreeSet::new())
    };

    let mut result = process_css(
        &css,
        &CssOptions {
            css_modules: is_css_module(file),
            autoprefixer: true,
            filename: Some(file.to_string()),
        },
    )?;
    result.imports = imports;
    Ok(result)
}

/// JavaScript module exposing a CSS Module's class map.
///
/// The stylesheet itself is carried by the document, so the module only
/// exports names.
#[must_use]
pub fn css_module_js(exports: &BTreeMap<String, String>) -> String {
    let map = serde_json::to_string(exports).unwrap_or_else(|_| "{}".to_string());
    format!("const classes = {map};\nexport default classes;\n")
}

/// Default browser targets for prefixing.
///
/// Chrome 80+, Firefox 75+, Safari 13+, Edge 80+.
fn default_browser_targets() -> Browsers {
    Browsers {
        chrome: Some(80 << 16),
        firefox: Some(75 << 16),
        safari: Some(13 << 16),
        edge: Some(80 << 16),
        ..Default::default()
    }
}

/// CSS processing error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssError {
    /// Parse error.
    Parse(String),
    /// Transform error.
    Transform(String),
    /// Print error.
    Print(String),
    /// Sass compilation error.
    Sass(String),
}

impl CssError {
    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "CSS_PARSE_ERROR",
            Self::Transform(_) => "CSS_TRANSFORM_ERROR",
            Self::Print(_) => "CSS_PRINT_ERROR",
            Self::Sass(_) => "CSS_SASS_ERROR",
        }
    }
}

impl std::fmt::Display for CssError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "CSS parse error: {msg}"),
            Self::Transform(msg) => write!(f, "CSS transform error: {msg}"),
            Self::Print(msg) => write!(f, "CSS print error: {msg}"),
            Self::Sass(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CssError {}
