//! The serialized module loader.
//!
//! `resolve` drives one import request through
//!
//! ```text
//! Start ── locate ──> Located ── decode ──> Valid ── associate ──> Associated
//!   │                    │                    └──────────────────> DependencyIncomplete
//!   │                    └──> FormatTooNew | Malformed ──────────> Rejected
//!   └──> NotFound ───────────────────────────────────────────────> Declined
//! ```
//!
//! Everything past `Located` is admitted to the registry, so a name is
//! located and decoded at most once per context. The generation is bumped
//! only for `Associated` modules.
//!
//! The query methods forward to the target module's descriptor and return
//! nothing for modules without one.

use tern_diagnostic::{malformed_module, module_too_new, opening_import, DiagnosticSink};
use tern_ir::{
    AccessPath, Decl, Fixity, Generation, KnownProtocolKind, LinkLibrary, LookupKind, ModuleId,
    Name, NominalTypeDecl, OperatorDecl, Span, ValueDecl,
};
use tern_serialize::{
    BinaryDecoder, DecodeError, ImportedModule, ModuleDecoder, ModuleFile, VisibleDeclConsumer,
};

use crate::context::ModuleContext;
use crate::dependency::{associate, missing_dependency_diagnostic, Association};
use crate::fs::{FileSystem, MemoryBuffer, RealFileSystem};
use crate::locator::{LocateError, ModuleLocator};
use crate::registry::{FileState, ModuleKind, SerializedModule, UnusableReason};

/// Loads `.ternmod` files and answers queries against them.
#[derive(Debug, Default)]
pub struct ModuleLoader<F = RealFileSystem, D = BinaryDecoder> {
    locator: ModuleLocator<F>,
    decoder: D,
}

impl ModuleLoader {
    /// A loader reading the host filesystem.
    pub fn new() -> Self {
        Self::with_parts(RealFileSystem, BinaryDecoder)
    }
}

impl<F: FileSystem, D: ModuleDecoder> ModuleLoader<F, D> {
    pub fn with_parts(fs: F, decoder: D) -> Self {
        ModuleLoader {
            locator: ModuleLocator::new(fs),
            decoder,
        }
    }

    pub fn locator(&self) -> &ModuleLocator<F> {
        &self.locator
    }

    pub fn locator_mut(&mut self) -> &mut ModuleLocator<F> {
        &mut self.locator
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Supply the bytes for the module named by the dotted `path`.
    ///
    /// The buffer is used by the next resolution of that path and then
    /// discarded; disk is not consulted for it.
    pub fn register_buffer(&mut self, path: impl Into<String>, buffer: MemoryBuffer) {
        let path = path.into();
        if self.locator.register_buffer(path.clone(), buffer).is_some() {
            tracing::debug!(module = %path, "replaced registered module buffer");
        }
    }

    /// Resolve an import of `path`.
    ///
    /// Returns `None` when `path` is not a single segment, when no module
    /// file exists, or when reading one failed. Every other outcome is
    /// cached: the returned handle may name a module whose file was
    /// rejected or whose dependencies are missing, in which case its
    /// queries answer nothing.
    #[tracing::instrument(level = "debug", skip_all, fields(
        path = %path.join(&*ctx.interner, "."),
    ))]
    pub fn resolve(
        &mut self,
        ctx: &mut ModuleContext,
        path: &AccessPath,
        import_loc: Option<Span>,
    ) -> Option<ModuleId> {
        if !path.is_top_level() {
            tracing::trace!(segments = path.len(), "declining qualified path");
            return None;
        }
        let elem = *path.first()?;
        let name = elem.name;
        let loc = elem.span.or(import_loc);

        if let Some(id) = ctx.registry().lookup(name) {
            tracing::trace!("module already loaded");
            return Some(id);
        }

        let buffer = match self.locator.locate(ctx, path, import_loc) {
            Ok(buffer) => buffer,
            Err(LocateError::NotFound { .. }) => {
                tracing::debug!("no module file; declining");
                return None;
            }
            Err(LocateError::Io { path, source }) => {
                tracing::debug!(file = %path.display(), error = %source, "cannot open module file");
                let module = ctx.interner.lookup(name);
                ctx.diagnostics
                    .emit(opening_import(loc, module, &source.to_string()));
                return None;
            }
        };

        let debug_path = buffer.identifier().to_owned();
        let decoded = self.decoder.decode(buffer.bytes(), &ctx.interner);
        drop(buffer);

        let file = admit_decoded(ctx, name, loc, decoded);
        let id = ctx
            .registry_mut()
            .admit(name, ModuleKind::Serialized(SerializedModule { debug_path, file }));
        Some(id)
    }

    /// Top-level values named `name`.
    ///
    /// A one-element `path` (`import A.x`) restricts the import to that
    /// declaration: other names find nothing.
    pub fn lookup_value(
        &self,
        ctx: &ModuleContext,
        module: ModuleId,
        path: &AccessPath,
        name: Name,
        kind: LookupKind,
    ) -> Vec<ValueDecl> {
        if path.first().is_some_and(|elem| elem.name != name) {
            return Vec::new();
        }
        tracing::trace!(?name, ?kind, "value lookup");
        ctx.module(module).file().map_or_else(Vec::new, |file| file.lookup_value(name).to_vec())
    }

    pub fn lookup_operator(
        &self,
        ctx: &ModuleContext,
        module: ModuleId,
        name: Name,
        fixity: Fixity,
    ) -> Option<OperatorDecl> {
        ctx.module(module).file()?.lookup_operator(name, fixity)
    }

    pub fn lookup_visible_decls(
        &self,
        ctx: &ModuleContext,
        module: ModuleId,
        path: &AccessPath,
        consumer: &mut dyn VisibleDeclConsumer,
        kind: LookupKind,
    ) {
        tracing::trace!(?kind, "visible decl lookup");
        if let Some(file) = ctx.module(module).file() {
            file.lookup_visible_decls(path, consumer);
        }
    }

    pub fn lookup_class_members(
        &self,
        ctx: &ModuleContext,
        module: ModuleId,
        path: &AccessPath,
        consumer: &mut dyn VisibleDeclConsumer,
    ) {
        if let Some(file) = ctx.module(module).file() {
            file.lookup_class_members(path, consumer);
        }
    }

    pub fn lookup_class_member(
        &self,
        ctx: &ModuleContext,
        module: ModuleId,
        path: &AccessPath,
        name: Name,
    ) -> Vec<ValueDecl> {
        ctx.module(module).file()
            .map_or_else(Vec::new, |file| file.lookup_class_member(path, name))
    }

    /// Modules imported by `module`; private imports only when
    /// `include_private`.
    pub fn imported_modules(
        &self,
        ctx: &ModuleContext,
        module: ModuleId,
        include_private: bool,
    ) -> Vec<ImportedModule> {
        ctx.module(module).file()
            .map_or_else(Vec::new, |file| file.imported_modules(include_private))
    }

    pub fn link_libraries(
        &self,
        ctx: &ModuleContext,
        module: ModuleId,
        mut callback: impl FnMut(&LinkLibrary),
    ) {
        if let Some(file) = ctx.module(module).file() {
            file.link_libraries().iter().for_each(&mut callback);
        }
    }

    pub fn display_decls(&self, ctx: &ModuleContext, module: ModuleId) -> Vec<Decl> {
        ctx.module(module).file().map_or_else(Vec::new, |file| file.display_decls().to_vec())
    }

    /// Append extensions of `nominal` from every module admitted after
    /// `since`.
    pub fn load_extensions(
        &self,
        ctx: &ModuleContext,
        nominal: &mut NominalTypeDecl,
        since: Generation,
    ) {
        for (_, file) in ctx.registry().files_since(since) {
            file.load_extensions(nominal);
        }
    }

    /// Declarations conforming to `kind` from every module admitted after
    /// `since`.
    pub fn load_decls_conforming_to(
        &self,
        ctx: &ModuleContext,
        kind: KnownProtocolKind,
        since: Generation,
    ) -> Vec<Decl> {
        ctx.registry()
            .files_since(since)
            .flat_map(|(_, file)| file.decls_conforming_to(kind).cloned())
            .collect()
    }
}

/// Diagnose a decode outcome and, for valid files, run association.
fn admit_decoded(
    ctx: &mut ModuleContext,
    name: Name,
    loc: Option<Span>,
    decoded: Result<ModuleFile, DecodeError>,
) -> FileState {
    let module = ctx.interner.lookup(name);
    let mut file = match decoded {
        Ok(file) => file,
        Err(DecodeError::FormatTooNew { found, supported }) => {
            tracing::debug!(found, supported, "module format too new");
            ctx.diagnostics
                .emit(module_too_new(loc, module, found, supported));
            return FileState::Unusable(UnusableReason::FormatTooNew { found, supported });
        }
        Err(DecodeError::Malformed(reason)) => {
            tracing::debug!(%reason, "malformed module file");
            ctx.diagnostics.emit(malformed_module(loc, module, &reason));
            return FileState::Unusable(UnusableReason::Malformed(reason));
        }
    };

    match associate(&mut file, ctx.registry(), &ctx.interner) {
        Association::Complete => {
            let generation = ctx.registry_mut().bump_generation();
            tracing::debug!(%generation, "module loaded");
            FileState::Usable(file)
        }
        Association::Incomplete { missing } => {
            ctx.diagnostics
                .emit(missing_dependency_diagnostic(loc, &missing));
            FileState::Unusable(UnusableReason::MissingDependencies {
                file: Box::new(file),
                missing,
            })
        }
    }
}

#[cfg(test)]
mod tests;
