//! SWC compiler backend implementation.
//!
//! Pipeline: parse, resolver, TypeScript strip, React JSX transform, import
//! specifier rewriting, hygiene, fixer, emit.

#![allow(clippy::default_trait_access)]

use super::spec::{Diagnostic, EsTarget, JsxRuntime};
use super::{
    CompilerBackend, CompilerError, ImportSite, ImportSiteKind, RewriteAction, SpecifierRewriter,
    TranspileOutput, TranspileSpec,
};
use swc_common::{
    comments::SingleThreadedComments, sync::Lrc, FileName, Globals, Mark, SourceMap, Spanned,
    GLOBALS,
};
use swc_ecma_ast::{
    CallExpr, Callee, EsVersion, ExportSpecifier, Expr, ImportSpecifier, Lit, Module, ModuleDecl,
    ModuleExportName, ModuleItem, Program, Str,
};
use swc_ecma_codegen::{text_writer::JsWriter, Emitter};
use swc_ecma_parser::{lexer::Lexer, EsSyntax, Parser, StringInput, Syntax, TsSyntax};
use swc_ecma_transforms_base::{fixer::fixer, hygiene::hygiene, resolver};
use swc_ecma_transforms_react::{react, Options as ReactOptions, Runtime};
use swc_ecma_transforms_typescript::strip;
use swc_ecma_visit::{FoldWith, VisitMut, VisitMutWith};
use uigen_util::path;

/// SWC-based compiler backend.
///
/// `SwcBackend` is `Send + Sync`; each call to `transpile` builds its own
/// source map and globals.
#[derive(Debug, Clone, Default)]
pub struct SwcBackend {
    _private: (),
}

impl SwcBackend {
    /// Create a new SWC backend with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn is_typescript(file: &str) -> bool {
        path::extension(file)
            .is_some_and(|ext| matches!(ext.to_lowercase().as_str(), "ts" | "tsx" | "mts"))
    }

    /// `.ts` cannot contain JSX; every other script extension may.
    fn is_jsx(file: &str) -> bool {
        path::extension(file).is_some_and(|ext| {
            matches!(ext.to_lowercase().as_str(), "jsx" | "tsx" | "js" | "mjs")
        })
    }
}

impl CompilerBackend for SwcBackend {
    fn name(&self) -> &'static str {
        "swc"
    }

    fn transpile(
        &self,
        spec: &TranspileSpec,
        source: &str,
        rewriter: &mut dyn SpecifierRewriter,
    ) -> Result<TranspileOutput, CompilerError> {
        if source.trim().is_empty() {
            return Ok(TranspileOutput::new(""));
        }

        let is_ts = Self::is_typescript(&spec.input_path);
        let is_jsx = Self::is_jsx(&spec.input_path);

        compile_with_swc(spec, source, is_ts, is_jsx, rewriter)
    }
}

fn es_version(target: EsTarget) -> EsVersion {
    match target {
        EsTarget::ES2018 => EsVersion::Es2018,
        EsTarget::ES2019 => EsVersion::Es2019,
        EsTarget::ES2020 => EsVersion::Es2020,
        EsTarget::ES2021 => EsVersion::Es2021,
        EsTarget::ES2022 => EsVersion::Es2022,
        EsTarget::ESNext => EsVersion::EsNext,
    }
}

fn compile_with_swc(
    spec: &TranspileSpec,
    source: &str,
    is_ts: bool,
    is_jsx: bool,
    rewriter: &mut dyn SpecifierRewriter,
) -> Result<TranspileOutput, CompilerError> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(
        Lrc::new(FileName::Custom(spec.input_path.clone())),
        source.to_string(),
    );

    let syntax = if is_ts {
        Syntax::Typescript(TsSyntax {
            tsx: is_jsx,
            decorators: true,
            ..Default::default()
        })
    } else {
        Syntax::Es(EsSyntax {
            jsx: is_jsx,
            decorators: true,
            ..Default::default()
        })
    };

    let target = es_version(spec.target);
    let comments = SingleThreadedComments::default();

    let lexer = Lexer::new(syntax, target, StringInput::from(&*fm), Some(&comments));
    let mut parser = Parser::new_from(lexer);

    let module = parser.parse_module().map_err(|e| {
        let diag = parse_diagnostic(&cm, &spec.input_path, &e);
        CompilerError::parse_error(diag.message.clone()).with_diagnostics(vec![diag])
    })?;

    let recovered: Vec<Diagnostic> = parser
        .take_errors()
        .iter()
        .map(|e| parse_diagnostic(&cm, &spec.input_path, e))
        .collect();
    if let Some(first) = recovered.first() {
        return Err(CompilerError::parse_error(first.message.clone()).with_diagnostics(recovered));
    }

    let output = GLOBALS.set(&Globals::default(), || {
        let unresolved_mark = Mark::new();
        let top_level_mark = Mark::new();

        let mut program = Program::Module(module);
        program = program.fold_with(&mut resolver(unresolved_mark, top_level_mark, is_ts));

        if is_ts {
            program = program.fold_with(&mut strip(unresolved_mark, top_level_mark));
        }

        let mut module = match program {
            Program::Module(m) => m,
            Program::Script(s) => Module {
                span: s.span,
                body: s.body.into_iter().map(ModuleItem::Stmt).collect(),
                shebang: s.shebang,
            },
        };

        if is_jsx {
            let runtime = match spec.jsx_runtime {
                JsxRuntime::Automatic => Runtime::Automatic,
                JsxRuntime::Classic => Runtime::Classic,
            };
            let react_options = ReactOptions {
                runtime: Some(runtime),
                ..Default::default()
            };

            module = module.fold_with(&mut react(
                cm.clone(),
                Some(&comments),
                react_options,
                top_level_mark,
                unresolved_mark,
            ));
        }

        // After the JSX transform so the jsx-runtime import is visible too.
        rewrite_imports(&mut module, rewriter);

        module = module.fold_with(&mut hygiene());
        module.fold_with(&mut fixer(Some(&comments)))
    });

    let mut buf = Vec::new();
    {
        let writer = JsWriter::new(cm.clone(), "\n", &mut buf, None);

        let mut emitter = Emitter {
            cfg: swc_ecma_codegen::Config::default().with_target(target),
            cm: cm.clone(),
            comments: Some(&comments),
            wr: writer,
        };

        emitter
            .emit_module(&output)
            .map_err(|e| CompilerError::transform_error(format!("Failed to emit: {e}")))?;
    }

    let code = String::from_utf8(buf)
        .map_err(|e| CompilerError::transform_error(format!("Invalid UTF-8 output: {e}")))?;

    Ok(TranspileOutput::new(code))
}

fn parse_diagnostic(
    cm: &Lrc<SourceMap>,
    file: &str,
    error: &swc_ecma_parser::error::Error,
) -> Diagnostic {
    let loc = cm.lookup_char_pos(error.span().lo);
    Diagnostic::error(error.kind().msg().to_string()).with_location(
        file,
        u32::try_from(loc.line).unwrap_or(u32::MAX),
        u32::try_from(loc.col_display + 1).unwrap_or(u32::MAX),
    )
}

fn export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::Ident(ident) => ident.sym.to_string(),
        ModuleExportName::Str(s) => s.value.to_string(),
    }
}

fn import_names(specifiers: &[ImportSpecifier]) -> Vec<String> {
    specifiers
        .iter()
        .filter_map(|s| match s {
            ImportSpecifier::Default(_) => Some("default".to_string()),
            ImportSpecifier::Named(named) if !named.is_type_only => Some(
                named
                    .imported
                    .as_ref()
                    .map_or_else(|| named.local.sym.to_string(), export_name),
            ),
            ImportSpecifier::Named(_) | ImportSpecifier::Namespace(_) => None,
        })
        .collect()
}

fn reexport_names(specifiers: &[ExportSpecifier]) -> Vec<String> {
    specifiers
        .iter()
        .filter_map(|s| match s {
            ExportSpecifier::Named(named) if !named.is_type_only => Some(export_name(&named.orig)),
            ExportSpecifier::Default(_) => Some("default".to_string()),
            ExportSpecifier::Named(_) | ExportSpecifier::Namespace(_) => None,
        })
        .collect()
}

fn set_specifier(src: &mut Str, specifier: String) {
    src.value = specifier.into();
    src.raw = None;
}

fn source_mut(item: &mut ModuleItem) -> Option<&mut Str> {
    match item {
        ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => Some(&mut *import.src),
        ModuleItem::ModuleDecl(ModuleDecl::ExportAll(export)) => Some(&mut *export.src),
        ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(named)) => named.src.as_deref_mut(),
        _ => None,
    }
}

/// Offer every static and dynamic specifier to `rewriter`.
fn rewrite_imports(module: &mut Module, rewriter: &mut dyn SpecifierRewriter) {
    let body = std::mem::take(&mut module.body);

    for mut item in body {
        let action = match &item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) if !import.type_only => {
                let kind = if import.specifiers.is_empty() {
                    ImportSiteKind::SideEffect
                } else {
                    ImportSiteKind::Static
                };
                Some(rewriter.rewrite(&ImportSite {
                    specifier: &import.src.value,
                    kind,
                    names: import_names(&import.specifiers),
                }))
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportAll(export)) if !export.type_only => {
                Some(rewriter.rewrite(&ImportSite {
                    specifier: &export.src.value,
                    kind: ImportSiteKind::ReExport,
                    names: Vec::new(),
                }))
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(named)) if !named.type_only => {
                named.src.as_ref().map(|src| {
                    rewriter.rewrite(&ImportSite {
                        specifier: &src.value,
                        kind: ImportSiteKind::ReExport,
                        names: reexport_names(&named.specifiers),
                    })
                })
            }
            _ => None,
        };

        match action {
            Some(RewriteAction::Remove) => continue,
            Some(RewriteAction::Replace(specifier)) => {
                if let Some(src) = source_mut(&mut item) {
                    set_specifier(src, specifier);
                }
            }
            Some(RewriteAction::Keep) | None => {}
        }
        module.body.push(item);
    }

    module.visit_mut_with(&mut DynamicImports { rewriter });
}

/// Rewrites `import("literal")` calls anywhere in the module.
struct DynamicImports<'a> {
    rewriter: &'a mut dyn SpecifierRewriter,
}

impl VisitMut for DynamicImports<'_> {
    fn visit_mut_call_expr(&mut self, call: &mut CallExpr) {
        call.visit_mut_children_with(self);

        if !matches!(call.callee, Callee::Import(_)) {
            return;
        }
        let Some(arg) = call.args.first_mut() else {
            return;
        };
        let Expr::Lit(Lit::Str(src)) = &mut *arg.expr else {
            return;
        };

        let action = self.rewriter.rewrite(&ImportSite {
            specifier: &src.value,
            kind: ImportSiteKind::Dynamic,
            names: vec!["default".to_string()],
        });
        if let RewriteAction::Replace(specifier) = action {
            set_specifier(src, specifier);
        }
    }
}
