//! Rendering of preview documents.

use uigen_core::bundler::ModuleGraphBuilder;
use uigen_core::{render, FileTree, ModuleGraph, PreviewConfig, RenderOptions, TranspileEngine};

fn graph_for(tree: &FileTree) -> ModuleGraph {
    let config = PreviewConfig::default();
    let engine = TranspileEngine::new(&config);
    let cdn = config.cdn().unwrap();
    ModuleGraphBuilder::new(&engine, &cdn)
        .build_graph(tree, "/App.jsx")
        .unwrap()
}

fn sample_tree() -> FileTree {
    let mut tree = FileTree::new();
    tree.create(
        "/App.jsx",
        "import './app.css';\nimport Missing from './Missing';\nexport default () => <main><Missing /></main>;",
    )
    .unwrap();
    tree.create("/app.css", "main { display: grid; }").unwrap();
    tree
}

#[test]
fn rendering_is_deterministic() {
    let tree = sample_tree();
    let graph = graph_for(&tree);
    let options = RenderOptions::default();

    let first = render(&graph, graph.css(), &options);
    let second = render(&graph, graph.css(), &options);
    assert_eq!(first, second);

    let rebuilt = graph_for(&tree);
    assert_eq!(first, render(&rebuilt, rebuilt.css(), &options));
}

#[test]
fn document_has_every_part() {
    let tree = sample_tree();
    let graph = graph_for(&tree);
    let html = render(&graph, graph.css(), &RenderOptions::default().with_title("Demo"));

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Demo</title>"));
    assert!(html.contains("<script type=\"importmap\">"));
    assert!(html.contains("\"/App.jsx\": \"data:text/javascript;base64,"));
    assert!(html.contains("display: grid") || html.contains("display:grid"));
    assert!(html.contains("https://cdn.tailwindcss.com"));
    assert!(html.contains("<div id=\"root\"></div>"));
    assert!(html.contains("const entry = \"/App.jsx\";"));
    assert!(html.contains("class ErrorBoundary extends React.Component"));
    assert!(html.contains("addEventListener(\"unhandledrejection\""));
    assert!(html.contains("console.warn"));
    assert!(html.contains("cannot resolve /Missing"));
}

#[test]
fn tailwind_can_be_disabled() {
    let tree = sample_tree();
    let graph = graph_for(&tree);
    let html = render(&graph, graph.css(), &RenderOptions::default().with_tailwind(false));
    assert!(!html.contains("cdn.tailwindcss.com"));
}

#[test]
fn embedded_text_cannot_close_its_element() {
    let mut tree = FileTree::new();
    tree.create("/App.jsx", "export default () => <p>ok</p>;").unwrap();
    let graph = graph_for(&tree);

    let css = vec!["p::after { content: \"</style><script>alert(1)</script>\"; }".to_string()];
    let html = render(&graph, &css, &RenderOptions::default().with_title("</title>"));

    assert_eq!(html.matches("</style>").count(), 1);
    assert!(html.contains("<title>&lt;/title&gt;</title>"));
}

#[test]
fn import_map_stays_valid_json_with_markup_in_keys() {
    let mut tree = FileTree::new();
    tree.create(
        "/App.jsx",
        "import X from './</script><!--x';\nexport default () => <X />;",
    )
    .unwrap();
    let graph = graph_for(&tree);
    let html = render(&graph, graph.css(), &RenderOptions::default());

    let start = html.find("<script type=\"importmap\">").unwrap() + "<script type=\"importmap\">".len();
    let end = start + html[start..].find("</script>").unwrap();
    let map: serde_json::Value = serde_json::from_str(&html[start..end]).unwrap();

    assert!(map["imports"]["/</script><!--x"].is_string());
    assert!(!html.contains("<!--"));
    assert_eq!(html.matches("</script>").count(), 3);
}
