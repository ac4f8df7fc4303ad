//! Sass/SCSS preprocessing using grass.
//!
//! `@use` and `@import` resolve inside the virtual tree, never on the host
//! disk.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::io;
use std::path::Path;

use crate::vfs::FileTree;
use uigen_util::path;

/// Sass compilation options.
#[derive(Debug, Clone, Default)]
pub struct SassOptions {
    /// Virtual path of the stylesheet. Relative imports resolve from its
    /// directory; `.sass` selects the indented syntax.
    pub filename: Option<String>,
}

/// Compiled CSS with the virtual files it pulled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SassOutput {
    pub css: String,
    /// Files read through `@use`/`@import`, sorted.
    pub imports: BTreeSet<String>,
}

/// Compile a self-contained stylesheet. Any import fails to resolve.
pub fn compile_sass(source: &str, options: &SassOptions) -> Result<String, SassError> {
    compile_sass_in(&FileTree::new(), source, options).map(|output| output.css)
}

/// Compile Sass/SCSS, resolving imports against `tree`.
pub fn compile_sass_in(
    tree: &FileTree,
    source: &str,
    options: &SassOptions,
) -> Result<SassOutput, SassError> {
    let filename = options.filename.as_deref().unwrap_or("/input.scss");
    let fs = TreeFs::new(tree);

    let css = {
        let mut grass_options = grass::Options::default()
            .style(grass::OutputStyle::Expanded)
            .fs(&fs)
            .load_path(path::parent(filename).unwrap_or(path::ROOT));

        if path::extension(filename).is_some_and(|ext| ext.eq_ignore_ascii_case("sass")) {
            grass_options = grass_options.input_syntax(grass::InputSyntax::Sass);
        }

        grass::from_string(source.to_string(), &grass_options)
            .map_err(|e| SassError::Compile(format!("{filename}: {e}")))?
    };

    Ok(SassOutput {
        css,
        imports: fs.loaded.into_inner(),
    })
}

/// Check if a file is a Sass/SCSS file.
#[must_use]
pub fn is_sass_file(file: &str) -> bool {
    matches!(path::extension(file), Some("scss" | "sass"))
}

/// grass file access backed by the virtual tree.
#[derive(Debug)]
struct TreeFs<'a> {
    tree: &'a FileTree,
    loaded: RefCell<BTreeSet<String>>,
}

impl<'a> TreeFs<'a> {
    fn new(tree: &'a FileTree) -> Self {
        Self {
            tree,
            loaded: RefCell::new(BTreeSet::new()),
        }
    }

    /// Only absolute paths name virtual files; grass tries relative
    /// candidates before the load path.
    fn virtual_path(path: &Path) -> Option<String> {
        let text = path.to_str()?;
        if !text.starts_with('/') {
            return None;
        }
        path::normalize(text).ok()
    }
}

impl grass::Fs for TreeFs<'_> {
    fn is_dir(&self, path: &Path) -> bool {
        Self::virtual_path(path).is_some_and(|p| self.tree.is_dir(&p))
    }

    fn is_file(&self, path: &Path) -> bool {
        Self::virtual_path(path).is_some_and(|p| self.tree.is_file(&p))
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let text = Self::virtual_path(path)
            .and_then(|p| self.tree.read(&p).map(|text| (p, text)));
        let Some((file, text)) = text else {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            ));
        };
        self.loaded.borrow_mut().insert(file);
        Ok(text.as_bytes().to_vec())
    }
}

/// Sass compilation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SassError {
    /// Compilation error.
    Compile(String),
}

impl std::fmt::Display for SassError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SassError::Compile(msg) => write!(f, "Sass compile error: {msg}"),
        }
    }
}

impl std::error::Error for SassError {}
