//! The `load` command: resolve one module the way an import would.

use std::ffi::OsStr;
use std::io::Write;
use std::ops::Range;
use std::path::PathBuf;

use rustc_hash::FxHashSet;
use tern_diagnostic::emitter::{DiagnosticEmitter, TerminalEmitter};
use tern_ir::{AccessPath, ModuleId, Name, Span};
use tern_loader::{ModuleContext, ModuleKind, ModuleLoader, SearchPathOptions};
use tern_serialize::ModuleDecoder;

use super::{read_text, write_decl, CommandError};

/// Parsed arguments of `ternc load`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Module to resolve, possibly dotted.
    pub module: String,
    /// `-I` directories, in command-line order.
    pub import_paths: Vec<PathBuf>,
    /// Source file the import is written in.
    pub from: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    #[error("missing module name")]
    MissingModule,
    #[error("option '{0}' needs a value")]
    MissingValue(&'static str),
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),
}

/// Parse the arguments following `load`.
///
/// Accepts `-I <dir>`, `-I<dir>` and `--from <file>` in any position around
/// the module name.
pub fn parse_load_args(args: &[String]) -> Result<LoadOptions, UsageError> {
    let mut options = LoadOptions::default();
    let mut module = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "-I" {
            let dir = iter.next().ok_or(UsageError::MissingValue("-I"))?;
            options.import_paths.push(PathBuf::from(dir));
        } else if let Some(dir) = arg.strip_prefix("-I") {
            options.import_paths.push(PathBuf::from(dir));
        } else if arg == "--from" {
            let file = iter.next().ok_or(UsageError::MissingValue("--from"))?;
            options.from = Some(PathBuf::from(file));
        } else if arg.starts_with('-') {
            return Err(UsageError::UnknownOption(arg.clone()));
        } else if module.is_none() {
            module = Some(arg.clone());
        } else {
            return Err(UsageError::UnexpectedArgument(arg.clone()));
        }
    }
    options.module = module.ok_or(UsageError::MissingModule)?;
    Ok(options)
}

/// Directories listed in a `TERN_MODULE_PATH`-style value.
pub fn search_paths_from_env(value: Option<&OsStr>) -> Vec<PathBuf> {
    value.map_or_else(Vec::new, |paths| {
        std::env::split_paths(paths)
            .filter(|dir| !dir.as_os_str().is_empty())
            .collect()
    })
}

/// Resolve `options.module` and describe what was loaded.
///
/// Diagnostics go to `err`. Returns the number of errors reported; a module
/// that no search location provides and that produced no diagnostics is a
/// [`CommandError::NotFound`].
pub fn load_module(
    options: &LoadOptions,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<usize, CommandError> {
    let search = SearchPathOptions::new().with_import_paths(options.import_paths.iter().cloned());
    let mut ctx = ModuleContext::new(search);

    let import_loc = match &options.from {
        Some(file) => {
            let text = read_text(file)?;
            let site = import_site(&text, &options.module);
            let buffer = ctx.sources.add_buffer(file.clone(), text);
            Some(ctx.sources.span_in(buffer, site))
        }
        None => None,
    };

    let path = options
        .module
        .split('.')
        .fold(AccessPath::new(), |path, segment| {
            path.with(ctx.intern(segment), import_loc)
        });

    let mut loader = ModuleLoader::new();
    let mut visiting = FxHashSet::default();
    let resolved =
        resolve_dependencies_first(&mut loader, &mut ctx, &path, import_loc, &mut visiting);
    if let Some(module) = resolved {
        describe_module(&loader, &ctx, module, out)?;
    }

    let diagnostics = ctx.diagnostics.flush();
    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    if !diagnostics.is_empty() {
        TerminalEmitter::new(err).emit_all(&diagnostics, &ctx.sources)?;
    }

    match resolved {
        None if errors == 0 => Err(CommandError::NotFound(options.module.clone())),
        _ => Ok(errors),
    }
}

/// Resolve `path` after every module it depends on, depth first.
///
/// A module whose dependencies are not yet registered is cached as
/// incomplete, so they have to be resolved before it. The module file is
/// read once to list its dependencies and then handed to the loader as a
/// registered buffer. A dependency cycle is broken at the module already
/// being visited.
fn resolve_dependencies_first(
    loader: &mut ModuleLoader,
    ctx: &mut ModuleContext,
    path: &AccessPath,
    import_loc: Option<Span>,
    visiting: &mut FxHashSet<Name>,
) -> Option<ModuleId> {
    let name = path.first()?.name;
    if !path.is_top_level() || ctx.registry().contains(name) {
        return loader.resolve(ctx, path, import_loc);
    }
    if !visiting.insert(name) {
        tracing::debug!(module = ctx.interner.lookup(name), "dependency cycle");
        return None;
    }

    // Locate failures are reported by `resolve` itself.
    let Ok(buffer) = loader.locator_mut().locate(ctx, path, import_loc) else {
        return loader.resolve(ctx, path, import_loc);
    };
    let dependencies: Vec<Name> = loader
        .decoder()
        .decode(buffer.bytes(), &ctx.interner)
        .map(|file| file.dependencies().iter().map(|dep| dep.module_name()).collect())
        .unwrap_or_default();
    for dependency in dependencies {
        let dep_path = AccessPath::single(dependency, None);
        resolve_dependencies_first(loader, ctx, &dep_path, import_loc, visiting);
    }

    loader.register_buffer(path.join(&*ctx.interner, "."), buffer);
    loader.resolve(ctx, path, import_loc)
}

/// Byte range of the module name in the first `import <module>` of `text`;
/// the start of the file when there is none.
fn import_site(text: &str, module: &str) -> Range<usize> {
    let needle = format!("import {module}");
    text.match_indices(needle.as_str())
        .map(|(at, _)| at + "import ".len())
        .find(|&start| {
            let end = start + module.len();
            !text[end..].starts_with(|c: char| c.is_alphanumeric() || c == '_')
        })
        .map_or(0..0, |start| start..start + module.len())
}

fn describe_module(
    loader: &ModuleLoader,
    ctx: &ModuleContext,
    module: ModuleId,
    out: &mut dyn Write,
) -> Result<(), CommandError> {
    let loaded = ctx.module(module);
    let name = ctx.interner.lookup(loaded.name());
    match loaded.kind() {
        ModuleKind::Builtin => writeln!(out, "module {name} (builtin)")?,
        ModuleKind::Serialized(serialized) => writeln!(
            out,
            "module {name} from {} [{}]",
            serialized.debug_path,
            serialized.file.status()
        )?,
    }

    let decls = loader.display_decls(ctx, module);
    if !decls.is_empty() {
        writeln!(out, "declarations:")?;
        for decl in &decls {
            write_decl(out, decl, &ctx.interner)?;
        }
    }

    let exported = loader.imported_modules(ctx, module, false);
    let imports = loader.imported_modules(ctx, module, true);
    if !imports.is_empty() {
        writeln!(out, "imports:")?;
        for import in &imports {
            let target = ctx.interner.lookup(ctx.module(import.module).name());
            let rest = if import.access_path.is_empty() {
                String::new()
            } else {
                format!(".{}", import.access_path.join(&*ctx.interner, "."))
            };
            let marker = if exported.contains(import) { " (exported)" } else { "" };
            writeln!(out, "  {target}{rest}{marker}")?;
        }
    }

    let mut libraries = Vec::new();
    loader.link_libraries(ctx, module, |library| libraries.push(library.to_string()));
    if !libraries.is_empty() {
        writeln!(out, "link libraries:")?;
        for library in &libraries {
            writeln!(out, "  {library}")?;
        }
    }
    Ok(())
}
