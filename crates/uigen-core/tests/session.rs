//! Sessions driven by command streams.

use uigen_core::{Command, CommandOutput, FileTree, PreviewConfig, Session};

fn commands(json: &str) -> Vec<Command> {
    serde_json::from_str(json).unwrap()
}

#[test]
fn json_command_stream_builds_a_project() {
    let mut session = Session::new(PreviewConfig::default()).unwrap();
    for command in commands(
        r#"[
            {"command": "create", "path": "/App.jsx", "file_text": "import Button from '@/components/Button';\nexport default () => <Button />;\n"},
            {"command": "create", "path": "/components/Button.jsx", "file_text": "export default () => <button>Go</button>;\n"},
            {"command": "str_replace", "path": "/components/Button.jsx", "old_str": "Go", "new_str": "Stop"},
            {"command": "insert", "path": "/App.jsx", "insert_line": 0, "new_str": "// entry"}
        ]"#,
    ) {
        session.enqueue(command);
    }

    let results = session.drain();
    assert!(results.iter().all(Result::is_ok));
    assert_eq!(session.revision(), 4);

    let out = session
        .apply(&Command::View {
            path: "/App.jsx".into(),
            view_range: Some([1, 1]),
        })
        .unwrap();
    assert_eq!(out, CommandOutput::Content("// entry\n".into()));

    let html = session.render_preview(None).to_string();
    assert!(html.contains("\"/components/Button.jsx\""));
    let graph = session.generation().unwrap().graph().unwrap();
    assert!(graph.get("/components/Button.jsx").unwrap().code.contains("Stop"));
}

#[test]
fn many_edits_keep_one_generation_and_a_bounded_cache() {
    let mut session = Session::new(PreviewConfig::default()).unwrap();
    session
        .apply(&Command::Create {
            path: "/App.jsx".into(),
            content: "import Counter from './Counter';\nexport default () => <Counter />;".into(),
        })
        .unwrap();
    session
        .apply(&Command::Create {
            path: "/Counter.jsx".into(),
            content: "export default () => <span>0</span>;".into(),
        })
        .unwrap();

    for i in 1..=25 {
        session
            .apply(&Command::Update {
                path: "/Counter.jsx".into(),
                content: format!("export default () => <span>{i}</span>;"),
            })
            .unwrap();
        session.render_preview(None);

        let generation = session.generation().unwrap();
        assert_eq!(generation.revision(), session.revision());
        assert_eq!(session.cache().len(), 2);
    }

    let graph = session.generation().unwrap().graph().unwrap();
    assert!(graph.get("/Counter.jsx").unwrap().code.contains("25"));
}

#[test]
fn deleting_the_entry_falls_back_to_message() {
    let mut session = Session::new(PreviewConfig::default()).unwrap();
    session
        .apply(&Command::Create {
            path: "/App.jsx".into(),
            content: "export default () => null;".into(),
        })
        .unwrap();
    assert!(session.render_preview(None).contains("importmap"));

    session.apply(&Command::Delete { path: "/App.jsx".into() }).unwrap();
    let html = session.render_preview(None).to_string();
    assert!(html.contains("No preview available"));
    assert!(session.cache().is_empty());
}

#[test]
fn sessions_restore_from_serialized_trees() {
    let mut tree = FileTree::new();
    tree.create("/src/App.tsx", "export default function App() { return <p>hi</p>; }")
        .unwrap();

    let session = Session::from_serialized(&tree.serialize(), PreviewConfig::default()).unwrap();
    assert_eq!(session.tree(), &tree);
    assert_eq!(session.detect_entry().as_deref(), Some("/src/App.tsx"));
    assert_eq!(session.list_directory("/src").unwrap().len(), 1);
}
