#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

//! Live-preview core for uigen.
//!
//! An in-memory project tree ([`vfs::FileTree`]) is turned into a
//! self-contained HTML document: files are transpiled with SWC, imports are
//! resolved against the tree, and the reachable modules are served through
//! an import map of `data:` URLs. [`Session`] ties it together.

pub mod bundler;
pub mod compiler;
pub mod config;
pub mod css;
pub mod error;
pub mod logging;
pub mod preview;
pub mod resolver;
pub mod session;
pub mod vfs;

pub use bundler::{GraphError, ModuleGraph, ModuleGraphBuilder, TranspileCache};
pub use compiler::{TranspileEngine, TranspiledModule};
pub use config::PreviewConfig;
pub use error::{Error, Result};
pub use preview::{render, render_message, RenderOptions};
pub use resolver::{PathResolver, ResolveReasonCode, ResolveResult, ResolveStatus};
pub use session::{Command, CommandOutput, Generation, Session};
pub use vfs::{FileTree, Node, NodeKind, VfsError};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
