//! Source for modules the graph synthesizes instead of transpiling.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::compiler::Diagnostic;

const PLACEHOLDER_LOCAL: &str = "__uigen_placeholder";
const ERROR_LOCAL: &str = "__uigen_compile_error";

/// Inert stand-in for an unresolved import.
///
/// Default-exports a component rendering nothing and re-exports it under
/// every name an importer asked for.
#[must_use]
pub fn placeholder_module(specifier: &str, names: &BTreeSet<String>) -> String {
    let mut code = format!(
        "// unresolved import {}\nconst {PLACEHOLDER_LOCAL} = () => null;\nexport default {PLACEHOLDER_LOCAL};\n",
        js_string(specifier)
    );
    push_named_exports(&mut code, PLACEHOLDER_LOCAL, names);
    code
}

/// Module standing in for a file that failed to compile.
///
/// Every export renders the diagnostic, so whatever the importer mounts
/// shows the error in place.
#[must_use]
pub fn error_module(diagnostic: &Diagnostic, names: &BTreeSet<String>) -> String {
    let mut code = format!(
        "import React from \"react\";\n\
         const message = {};\n\
         const {ERROR_LOCAL} = () => React.createElement(\"pre\", {{ \"data-uigen-error\": \"\", style: {{ color: \"#b91c1c\", background: \"#fef2f2\", padding: \"12px\", whiteSpace: \"pre-wrap\", fontFamily: \"monospace\" }} }}, message);\n\
         export default {ERROR_LOCAL};\n",
        js_string(&diagnostic.to_string())
    );
    push_named_exports(&mut code, ERROR_LOCAL, names);
    code
}

/// `export default <value>` for a JSON file.
///
/// # Errors
/// Returns the parse error if `text` is not JSON.
pub fn json_module(text: &str) -> Result<String, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    Ok(format!("export default {value};\n"))
}

/// `export default "<text>"` for any other file.
#[must_use]
pub fn text_module(text: &str) -> String {
    format!("export default {};\n", js_string(text))
}

/// JavaScript string literal for `text`.
#[must_use]
pub fn js_string(text: &str) -> String {
    // JSON strings are valid JS string literals except for these two.
    serde_json::to_string(text)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

fn push_named_exports(code: &mut String, local: &str, names: &BTreeSet<String>) {
    let names: Vec<_> = names
        .iter()
        .filter(|name| name.as_str() != "default" && is_identifier(name))
        .collect();
    if names.is_empty() {
        return;
    }
    code.push_str("export {");
    for (i, name) in names.iter().enumerate() {
        let sep = if i == 0 { " " } else { ", " };
        let _ = write!(code, "{sep}{local} as {name}");
    }
    code.push_str(" };\n");
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
