//! Module loading and import resolution.
//!
//! Given an entry file, the loader reads it, parses it, resolves each `use`
//! declaration to an absolute file path, and recursively loads dependencies.
//! Modules land in [`Loader::modules`] in dependency order (dependencies
//! before importers), which is the order the rest of the pipeline consumes.
//!
//! # Path resolution
//!
//! In order:
//!
//! 1. `std:name` — `$HOME/.yar/stdlib/name.yar` (overridable via the
//!    `YAR_STDLIB` environment variable)
//! 2. `./x` / `../x` — literal join with the importer's directory
//! 3. bare names — the importer's directory, then upward toward the project
//!    root (the directory holding `yar.toml`), then the stdlib directory
//!
//! # Failure policy
//!
//! The loader fails fast: the first unresolved path, cycle, I/O failure, or
//! parse error aborts the load, because everything downstream depends on the
//! missing module. Cycles are caught by a "currently loading" set; a cache
//! keyed by absolute path makes shared dependencies load once.
//!
//! # Exports
//!
//! A top-level function is exported iff its name starts with an uppercase
//! letter. [`Loader::check_project`] checks every module and then validates
//! qualified calls (`module.Symbol(...)`) against the target module's
//! exports.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use yar_base::{Interner, Span, Symbol};
use yar_syntax::ast::{self, Decl, Expr, Stmt};
use yar_syntax::{ParseError, Parser};

use crate::analysis::{CheckError, Checker};
use crate::manifest::MANIFEST_FILE;

/// The last path segment of an import, without the stdlib prefix or the
/// `.yar` extension. This is the namespace a bare import binds.
pub fn import_stem(path: &str) -> &str {
    let path = path.strip_prefix("std:").unwrap_or(path);
    let path = path.rsplit('/').next().unwrap_or(path);
    path.strip_suffix(".yar").unwrap_or(path)
}

/// One resolved import.
#[derive(Debug, Clone)]
pub struct ImportRef {
    /// The path as written in source.
    pub path_text: String,
    pub alias: Option<Symbol>,
    pub resolved: PathBuf,
    /// Index of the loaded module in [`Loader::modules`].
    pub module: usize,
}

/// One loaded module.
#[derive(Debug)]
pub struct Module {
    pub path: PathBuf,
    /// Logical name: the `module` header if present, else the file stem.
    pub name: String,
    pub ast: ast::Module,
    pub imports: Vec<ImportRef>,
    /// Hash of the source text, for the build cache kept by the CLI.
    pub hash: u64,
    /// Where emitted IR for this module was written, once it has been.
    pub ir_path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum LoadError {
    Io {
        path: PathBuf,
        message: String,
    },
    NotFound {
        import: String,
        from: PathBuf,
    },
    Cycle {
        path: PathBuf,
    },
    Parse {
        path: PathBuf,
        errors: Vec<ParseError>,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, message } => {
                write!(f, "cannot read {}: {}", path.display(), message)
            }
            LoadError::NotFound { import, from } => {
                write!(
                    f,
                    "module '{}' not found (imported from {})",
                    import,
                    from.display()
                )
            }
            LoadError::Cycle { path } => {
                write!(f, "import cycle involving {}", path.display())
            }
            LoadError::Parse { path, errors } => {
                writeln!(f, "parse errors in {}:", path.display())?;
                for err in errors {
                    writeln!(f, "  {}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// Loads and caches modules for one compile.
pub struct Loader {
    pub interner: Interner,
    stdlib_dir: PathBuf,
    modules: Vec<Module>,
    cache: HashMap<PathBuf, usize>,
    loading: HashSet<PathBuf>,
}

impl Loader {
    pub fn new() -> Self {
        let stdlib_dir = match std::env::var_os("YAR_STDLIB") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".yar")
                .join("stdlib"),
        };
        Self::with_stdlib_dir(stdlib_dir)
    }

    pub fn with_stdlib_dir(stdlib_dir: PathBuf) -> Self {
        Self {
            interner: Interner::new(),
            stdlib_dir,
            modules: Vec::new(),
            cache: HashMap::new(),
            loading: HashSet::new(),
        }
    }

    /// All loaded modules, dependencies before importers.
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module(&self, idx: usize) -> &Module {
        &self.modules[idx]
    }

    /// Loads the entry file and, recursively, everything it imports.
    /// Returns the entry module's index.
    pub fn load_entry(&mut self, path: &Path) -> Result<usize, LoadError> {
        let abs = std::fs::canonicalize(path).map_err(|e| LoadError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        self.load_module(abs)
    }

    fn load_module(&mut self, path: PathBuf) -> Result<usize, LoadError> {
        if let Some(&idx) = self.cache.get(&path) {
            return Ok(idx);
        }
        if self.loading.contains(&path) {
            return Err(LoadError::Cycle { path });
        }
        self.loading.insert(path.clone());

        let source = std::fs::read_to_string(&path).map_err(|e| LoadError::Io {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let hash = content_hash(&source);

        let mut parser = Parser::new(&source, &mut self.interner);
        let parsed = parser.parse_module();
        let errors = std::mem::take(&mut parser.errors);
        drop(parser);
        if !errors.is_empty() {
            return Err(LoadError::Parse { path, errors });
        }

        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let use_decls: Vec<ast::UseDecl> = parsed.imports().cloned().collect();
        let mut imports = Vec::new();
        for decl in use_decls {
            let resolved = self.resolve_import(&decl.path, &dir, &path)?;
            let module = self.load_module(resolved.clone())?;
            imports.push(ImportRef {
                path_text: decl.path,
                alias: decl.alias,
                resolved,
                module,
            });
        }

        self.loading.remove(&path);

        let name = match parsed.name {
            Some(sym) => self.interner.resolve(sym).to_string(),
            None => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        let idx = self.modules.len();
        self.modules.push(Module {
            path: path.clone(),
            name,
            ast: parsed,
            imports,
            hash,
            ir_path: None,
        });
        self.cache.insert(path, idx);
        Ok(idx)
    }

    /// Resolves an import path against the stdlib prefix, the importer's
    /// directory, or the surrounding project.
    fn resolve_import(
        &self,
        spec: &str,
        importer_dir: &Path,
        importer: &Path,
    ) -> Result<PathBuf, LoadError> {
        let not_found = || LoadError::NotFound {
            import: spec.to_string(),
            from: importer.to_path_buf(),
        };

        if let Some(name) = spec.strip_prefix("std:") {
            let candidate = self.stdlib_dir.join(with_yar_ext(name));
            return std::fs::canonicalize(&candidate).map_err(|_| not_found());
        }

        if spec.starts_with("./") || spec.starts_with("../") {
            let candidate = importer_dir.join(with_yar_ext(spec));
            return std::fs::canonicalize(&candidate).map_err(|_| not_found());
        }

        // Bare name: importer's directory, then upward to the project root,
        // then the stdlib directory.
        let file = with_yar_ext(spec);
        let mut dir = Some(importer_dir.to_path_buf());
        while let Some(d) = dir {
            let candidate = d.join(&file);
            if candidate.is_file() {
                return std::fs::canonicalize(&candidate).map_err(|_| not_found());
            }
            if d.join(MANIFEST_FILE).is_file() {
                break;
            }
            dir = d.parent().map(Path::to_path_buf);
        }
        let candidate = self.stdlib_dir.join(&file);
        std::fs::canonicalize(&candidate).map_err(|_| not_found())
    }

    /// Names of the functions a module exports: top-level functions whose
    /// name begins with an uppercase letter.
    pub fn exports_of(&self, idx: usize) -> HashSet<Symbol> {
        self.modules[idx]
            .ast
            .functions()
            .filter(|f| {
                self.interner
                    .resolve(f.name)
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_uppercase())
            })
            .map(|f| f.name)
            .collect()
    }

    /// Checks every loaded module, then validates qualified calls against
    /// the export sets of the imported modules.
    pub fn check_project(&mut self) -> Result<(), Vec<CheckError>> {
        let mut all_errors = Vec::new();

        for idx in 0..self.modules.len() {
            let mut checker = Checker::new(&mut self.interner);
            if let Err(errors) = checker.check_module(&self.modules[idx].ast) {
                all_errors.extend(errors);
            }
        }

        // Cross-module pass: module.Symbol(...) must name a known import
        // namespace and an exported function of the target module.
        for idx in 0..self.modules.len() {
            let mut namespaces: HashMap<Symbol, usize> = HashMap::new();
            let import_refs: Vec<(Option<Symbol>, String, usize)> = self.modules[idx]
                .imports
                .iter()
                .map(|i| (i.alias, i.path_text.clone(), i.module))
                .collect();
            for (alias, path_text, target) in import_refs {
                let ns = match alias {
                    Some(sym) => sym,
                    None => self.interner.intern(import_stem(&path_text)),
                };
                namespaces.insert(ns, target);
            }

            let calls = collect_qualified_calls(&self.modules[idx].ast);
            for (ns, symbol, span) in calls {
                let Some(&target) = namespaces.get(&ns) else {
                    continue;
                };
                let exports = self.exports_of(target);
                if !exports.contains(&symbol) {
                    let symbol_text = self.interner.resolve(symbol).to_string();
                    let target_name = self.modules[target].name.clone();
                    all_errors.push(CheckError {
                        message: format!(
                            "function '{}' is not exported by module '{}'",
                            symbol_text, target_name
                        ),
                        span,
                    });
                }
            }
        }

        if all_errors.is_empty() {
            Ok(())
        } else {
            Err(all_errors)
        }
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

fn with_yar_ext(name: &str) -> String {
    if name.ends_with(".yar") {
        name.to_string()
    } else {
        format!("{}.yar", name)
    }
}

fn content_hash(source: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    source.hash(&mut hasher);
    hasher.finish()
}

/// Collects `(namespace, symbol, span)` from every `ns.Symbol(...)` call in
/// the module.
fn collect_qualified_calls(module: &ast::Module) -> Vec<(Symbol, Symbol, Span)> {
    let mut calls = Vec::new();
    for decl in &module.decls {
        match decl {
            Decl::Fn(f) => walk_stmts(&f.body.stmts, &mut calls),
            Decl::Impl(imp) => {
                for method in &imp.methods {
                    walk_stmts(&method.body.stmts, &mut calls);
                }
            }
            Decl::Const(c) => walk_expr(&c.value, &mut calls),
            _ => {}
        }
    }
    calls
}

fn walk_stmts(stmts: &[Stmt], out: &mut Vec<(Symbol, Symbol, Span)>) {
    for stmt in stmts {
        walk_stmt(stmt, out);
    }
}

fn walk_stmt(stmt: &Stmt, out: &mut Vec<(Symbol, Symbol, Span)>) {
    match stmt {
        Stmt::Let { init, .. } | Stmt::ShortDecl { init, .. } => walk_expr(init, out),
        Stmt::Assign { target, value, .. } => {
            walk_expr(target, out);
            walk_expr(value, out);
        }
        Stmt::Return { value, .. } => {
            if let Some(v) = value {
                walk_expr(v, out);
            }
        }
        Stmt::If {
            cond,
            then_block,
            else_branch,
            ..
        } => {
            walk_expr(cond, out);
            walk_stmts(&then_block.stmts, out);
            if let Some(else_stmt) = else_branch {
                walk_stmt(else_stmt, out);
            }
        }
        Stmt::While { cond, body, .. } => {
            walk_expr(cond, out);
            walk_stmts(&body.stmts, out);
        }
        Stmt::For {
            init,
            cond,
            post,
            body,
            ..
        } => {
            walk_stmt(init, out);
            walk_expr(cond, out);
            walk_stmt(post, out);
            walk_stmts(&body.stmts, out);
        }
        Stmt::ForIn { iter, body, .. } => {
            walk_expr(iter, out);
            walk_stmts(&body.stmts, out);
        }
        Stmt::Defer { call, .. } => walk_expr(call, out),
        Stmt::Unsafe { block, .. } | Stmt::BlockStmt { block, .. } => {
            walk_stmts(&block.stmts, out)
        }
        Stmt::ExprStmt { expr, .. } => walk_expr(expr, out),
        Stmt::Break { .. } | Stmt::Continue { .. } => {}
    }
}

fn walk_expr(expr: &Expr, out: &mut Vec<(Symbol, Symbol, Span)>) {
    match expr {
        Expr::Call { callee, args, span } => {
            if let Expr::Field { base, field, .. } = &**callee {
                if let Expr::Ident { name: ns, .. } = &**base {
                    out.push((*ns, *field, *span));
                }
            }
            walk_expr(callee, out);
            for arg in args {
                walk_expr(arg, out);
            }
        }
        Expr::Binary { left, right, .. } => {
            walk_expr(left, out);
            walk_expr(right, out);
        }
        Expr::Unary { operand, .. } => walk_expr(operand, out),
        Expr::Index { base, index, .. } => {
            walk_expr(base, out);
            walk_expr(index, out);
        }
        Expr::Field { base, .. } => walk_expr(base, out),
        Expr::StructLit { fields, .. } => {
            for (_, value) in fields {
                walk_expr(value, out);
            }
        }
        Expr::ArrayLit { elems, .. } | Expr::TupleLit { elems, .. } => {
            for elem in elems {
                walk_expr(elem, out);
            }
        }
        Expr::Try { inner, .. } => walk_expr(inner, out),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_stem_strips_prefix_dirs_and_extension() {
        assert_eq!(import_stem("math"), "math");
        assert_eq!(import_stem("./util.yar"), "util");
        assert_eq!(import_stem("../shared/strings.yar"), "strings");
        assert_eq!(import_stem("std:fmt"), "fmt");
    }

    #[test]
    fn exported_names_start_uppercase() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.yar");
        std::fs::write(&path, "fn Visible() { }\nfn hidden() { }\n").unwrap();
        let mut loader = Loader::with_stdlib_dir(dir.path().join("stdlib"));
        let idx = loader.load_entry(&path).unwrap();
        let exports = loader.exports_of(idx);
        let visible = loader.interner.get("Visible").unwrap();
        let hidden = loader.interner.get("hidden").unwrap();
        assert!(exports.contains(&visible));
        assert!(!exports.contains(&hidden));
    }

    #[test]
    fn loading_twice_returns_the_cached_module() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.yar");
        std::fs::write(&path, "fn main() { }\n").unwrap();
        let mut loader = Loader::with_stdlib_dir(dir.path().join("stdlib"));
        let first = loader.load_entry(&path).unwrap();
        let second = loader.load_entry(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(loader.modules().len(), 1);
    }

    #[test]
    fn dependencies_load_before_importers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("util.yar"), "fn Helper() { }\n").unwrap();
        std::fs::write(
            dir.path().join("main.yar"),
            "use \"./util.yar\"\nfn main() { util.Helper() }\n",
        )
        .unwrap();
        let mut loader = Loader::with_stdlib_dir(dir.path().join("stdlib"));
        let entry = loader.load_entry(&dir.path().join("main.yar")).unwrap();
        assert_eq!(loader.modules().len(), 2);
        assert_eq!(loader.modules()[0].name, "util");
        assert_eq!(loader.module(entry).name, "main");
        assert!(loader.check_project().is_ok());
    }

    #[test]
    fn unexported_symbol_is_rejected_cross_module() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("util.yar"), "fn helper() { }\n").unwrap();
        std::fs::write(
            dir.path().join("main.yar"),
            "use \"./util.yar\"\nfn main() { util.helper() }\n",
        )
        .unwrap();
        let mut loader = Loader::with_stdlib_dir(dir.path().join("stdlib"));
        loader.load_entry(&dir.path().join("main.yar")).unwrap();
        let errors = loader.check_project().unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.message.contains("not exported by module 'util'")));
    }

    #[test]
    fn import_cycle_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.yar"), "use \"./b.yar\"\nfn main() { }\n").unwrap();
        std::fs::write(dir.path().join("b.yar"), "use \"./a.yar\"\nfn F() { }\n").unwrap();
        let mut loader = Loader::with_stdlib_dir(dir.path().join("stdlib"));
        let err = loader.load_entry(&dir.path().join("a.yar")).unwrap_err();
        assert!(matches!(err, LoadError::Cycle { .. }));
    }

    #[test]
    fn missing_import_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("main.yar"),
            "use \"./gone.yar\"\nfn main() { }\n",
        )
        .unwrap();
        let mut loader = Loader::with_stdlib_dir(dir.path().join("stdlib"));
        let err = loader.load_entry(&dir.path().join("main.yar")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    #[test]
    fn stdlib_prefix_resolves_into_stdlib_dir() {
        let dir = tempfile::tempdir().unwrap();
        let stdlib = dir.path().join("stdlib");
        std::fs::create_dir_all(&stdlib).unwrap();
        std::fs::write(stdlib.join("fmt.yar"), "fn Print() { }\n").unwrap();
        std::fs::write(
            dir.path().join("main.yar"),
            "use \"std:fmt\"\nfn main() { fmt.Print() }\n",
        )
        .unwrap();
        let mut loader = Loader::with_stdlib_dir(stdlib);
        loader.load_entry(&dir.path().join("main.yar")).unwrap();
        assert_eq!(loader.modules().len(), 2);
        assert!(loader.check_project().is_ok());
    }

    #[test]
    fn bare_import_searches_upward_to_project_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(MANIFEST_FILE),
            "[package]\nname=\"p\"\nversion=\"0\"\nentry=\"src/main.yar\"\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("shared.yar"), "fn Log() { }\n").unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("main.yar"), "use shared\nfn main() { shared.Log() }\n").unwrap();
        let mut loader = Loader::with_stdlib_dir(dir.path().join("stdlib"));
        loader.load_entry(&src.join("main.yar")).unwrap();
        assert_eq!(loader.modules().len(), 2);
    }

    #[test]
    fn module_hash_tracks_content() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.yar");
        let b = dir.path().join("b.yar");
        std::fs::write(&a, "fn main() { }\n").unwrap();
        std::fs::write(&b, "fn main() { }\n").unwrap();
        let mut loader = Loader::with_stdlib_dir(dir.path().join("stdlib"));
        let ia = loader.load_entry(&a).unwrap();
        let ib = loader.load_entry(&b).unwrap();
        assert_eq!(loader.module(ia).hash, loader.module(ib).hash);
    }
}
