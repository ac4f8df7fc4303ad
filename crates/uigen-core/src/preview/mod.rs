//! Preview document assembly.
//!
//! [`render`] is a pure function: the same graph, stylesheets, and options
//! always produce byte-identical HTML.

use crate::bundler::{js_string, ModuleGraph};
use crate::config::PreviewConfig;

/// Tailwind Play CDN script.
pub const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

/// Options for [`render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Document title.
    pub title: String,
    /// Load the Tailwind CDN script.
    pub tailwind: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: "Preview".to_string(),
            tailwind: true,
        }
    }
}

impl RenderOptions {
    #[must_use]
    pub fn from_config(config: &PreviewConfig) -> Self {
        Self {
            title: config.title.clone(),
            tailwind: config.tailwind,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_tailwind(mut self, tailwind: bool) -> Self {
        self.tailwind = tailwind;
        self
    }
}

/// Mounts the entry's default export under an error boundary. Expects
/// `entry` and `warnings` to be declared before it.
const BOOTSTRAP: &str = r##"import React from "react";
import { createRoot } from "react-dom/client";

const root = document.getElementById("root");
const panelStyle = "margin:0;padding:16px;color:#b91c1c;background:#fef2f2;font:13px/1.5 ui-monospace,monospace;white-space:pre-wrap;";

function describe(error) {
  if (error && (error.stack || error.message)) return String(error.stack || error.message);
  return String(error);
}

function showError(title, error) {
  const panel = document.createElement("pre");
  panel.setAttribute("data-uigen-error", "");
  panel.setAttribute("style", panelStyle);
  panel.textContent = title + "\n\n" + describe(error);
  root.replaceChildren(panel);
}

class ErrorBoundary extends React.Component {
  constructor(props) {
    super(props);
    this.state = { error: null };
  }

  static getDerivedStateFromError(error) {
    return { error };
  }

  render() {
    if (this.state.error) {
      return React.createElement(
        "pre",
        { "data-uigen-error": "", style: { margin: 0, padding: 16, color: "#b91c1c", background: "#fef2f2", whiteSpace: "pre-wrap", fontFamily: "ui-monospace, monospace" } },
        "Render error\n\n" + describe(this.state.error)
      );
    }
    return this.props.children;
  }
}

window.addEventListener("error", (event) => showError("Runtime error", event.error || event.message));
window.addEventListener("unhandledrejection", (event) => showError("Unhandled promise rejection", event.reason));

for (const warning of warnings) console.warn("[preview]", warning);

try {
  const module = await import(entry);
  const App = module.default;
  if (App === undefined || App === null) {
    throw new Error(entry + " has no default export");
  }
  createRoot(root).render(React.createElement(ErrorBoundary, null, React.createElement(App)));
} catch (error) {
  showError("Failed to load " + entry, error);
}
"##;

/// Render the preview document for `graph`.
#[must_use]
pub fn render(graph: &ModuleGraph, css: &[String], options: &RenderOptions) -> String {
    let warnings: Vec<String> = graph.warnings().iter().map(ToString::to_string).collect();
    let warnings = serde_json::to_string(&warnings).unwrap_or_else(|_| "[]".to_string());

    let bootstrap = format!(
        "const entry = {};\nconst warnings = {};\n{BOOTSTRAP}",
        escape_json(&js_string(graph.entry())),
        escape_json(&warnings)
    );

    let tailwind = if options.tailwind {
        format!("\n  <script src=\"{TAILWIND_CDN}\"></script>")
    } else {
        String::new()
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
  <script type="importmap">
{import_map}
  </script>
  <style>
{css}
  </style>{tailwind}
</head>
<body>
  <div id="root"></div>
  <script type="module">
{bootstrap}
  </script>
</body>
</html>
"#,
        title = escape_html(&options.title),
        import_map = escape_json(&graph.import_map().to_json()),
        css = escape_style(&css.join("\n")),
    )
}

/// Document shown in place of a preview, e.g. when there is no entry file.
#[must_use]
pub fn render_message(title: &str, detail: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <style>
    body {{ margin: 0; font-family: system-ui, sans-serif; }}
    .message {{ display: flex; flex-direction: column; align-items: center; justify-content: center; height: 100vh; color: #4b5563; text-align: center; }}
    .message h1 {{ font-size: 1.25rem; margin: 0 0 0.5rem; }}
  </style>
</head>
<body>
  <div class="message">
    <h1>{title}</h1>
    <p>{detail}</p>
  </div>
</body>
</html>
"#,
        title = escape_html(title),
        detail = escape_html(detail),
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape `<` in JSON text or JS string literals embedded in a script
/// element. `<` only occurs inside string values there, where `\u003c` is
/// a valid escape in both languages.
fn escape_json(text: &str) -> String {
    text.replace('<', "\\u003c")
}

/// Keep stylesheet text from closing its `<style>` element.
fn escape_style(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(i) = rest.find("</") {
        let after = &rest[i + 2..];
        let closes = after
            .get(..5)
            .is_some_and(|tag| tag.eq_ignore_ascii_case("style"));
        out.push_str(&rest[..i]);
        out.push_str(if closes { "<\\/" } else { "</" });
        rest = after;
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_json_stays_valid_json() {
        let raw = vec!["</script>".to_string(), "<!-- x".to_string()];
        let json = serde_json::to_string(&raw).unwrap();
        let escaped = escape_json(&json);
        assert!(!escaped.contains('<'));
        assert!(escaped.contains("\\u003c!-- x"));
        let parsed: Vec<String> = serde_json::from_str(&escaped).unwrap();
        assert_eq!(parsed, raw);
    }

    #[test]
    fn test_bootstrap_is_safe_inside_script() {
        assert!(!BOOTSTRAP.contains('<'));
        assert!(BOOTSTRAP.contains("color: \"#b91c1c\""));
        assert!(BOOTSTRAP.trim_end().ends_with('}'));
    }

    #[test]
    fn test_escape_style() {
        assert_eq!(escape_style("a{}</STYLE><b>"), "a{}<\\/STYLE><b>");
        assert_eq!(escape_style("</div>"), "</div>");
        assert_eq!(escape_style("x</"), "x</");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a & \"b\">"), "&lt;a &amp; &quot;b&quot;&gt;");
    }

    #[test]
    fn test_render_message_is_escaped() {
        let html = render_message("No preview", "Create <App.jsx>");
        assert!(html.contains("<h1>No preview</h1>"));
        assert!(html.contains("Create &lt;App.jsx&gt;"));
        assert_eq!(html, render_message("No preview", "Create <App.jsx>"));
    }

    #[test]
    fn test_options_from_config() {
        let config = PreviewConfig::default().with_tailwind(false).with_title("Demo");
        let options = RenderOptions::from_config(&config);
        assert_eq!(options, RenderOptions::default().with_tailwind(false).with_title("Demo"));
    }
}
