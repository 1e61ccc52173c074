//! Per-compilation loader state.
//!
//! Everything the loader mutates lives here and is passed explicitly to
//! every entry point: interned names, source buffers, search paths, the
//! diagnostic queue and the module registry.

use std::path::{Path, PathBuf};

use tern_diagnostic::{DiagnosticConfig, DiagnosticQueue};
use tern_ir::{Generation, ModuleId, Name, SharedInterner, SourceMap};

use crate::registry::{LoadedModule, ModuleKind, ModuleRegistry};

/// Where to look for module files.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchPathOptions {
    import_paths: Vec<PathBuf>,
    working_dir: Option<PathBuf>,
}

impl SearchPathOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a directory to the ordered search-path list.
    #[must_use]
    pub fn with_import_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.import_paths.push(dir.into());
        self
    }

    #[must_use]
    pub fn with_import_paths<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.import_paths.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Directory used for the working-directory candidate.
    ///
    /// Unset means the process's current directory.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn import_paths(&self) -> &[PathBuf] {
        &self.import_paths
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }
}

/// State shared by all resolutions in one compilation.
pub struct ModuleContext {
    pub interner: SharedInterner,
    pub sources: SourceMap,
    pub options: SearchPathOptions,
    pub diagnostics: DiagnosticQueue,
    registry: ModuleRegistry,
}

impl ModuleContext {
    pub fn new(options: SearchPathOptions) -> Self {
        Self::with_interner(SharedInterner::new(), options)
    }

    /// Create a context that shares an interner with other compiler phases.
    pub fn with_interner(interner: SharedInterner, options: SearchPathOptions) -> Self {
        ModuleContext {
            interner,
            sources: SourceMap::new(),
            options,
            diagnostics: DiagnosticQueue::with_config(Self::default_diagnostic_config()),
            registry: ModuleRegistry::new(),
        }
    }

    /// Default queue settings for a loader context.
    ///
    /// Deduplication is off: two modules missing the same dependency produce
    /// identical diagnostics, and each failing import must be reported.
    pub fn default_diagnostic_config() -> DiagnosticConfig {
        DiagnosticConfig {
            deduplicate: false,
            ..DiagnosticConfig::default()
        }
    }

    #[must_use]
    pub fn with_diagnostic_config(mut self, config: DiagnosticConfig) -> Self {
        self.diagnostics = DiagnosticQueue::with_config(config);
        self
    }

    pub fn intern(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut ModuleRegistry {
        &mut self.registry
    }

    /// Get a loaded module by handle.
    pub fn module(&self, id: ModuleId) -> &LoadedModule {
        self.registry.get(id)
    }

    /// Handle of the module registered under `name`, loaded or failed.
    pub fn lookup_module(&self, name: &str) -> Option<ModuleId> {
        self.registry.lookup(self.interner.intern(name))
    }

    pub fn current_generation(&self) -> Generation {
        self.registry.current_generation()
    }

    /// Register a module the compiler provides without a file.
    ///
    /// Builtins satisfy dependency checks and answer every query with
    /// nothing. They do not advance the generation.
    pub fn register_builtin_module(&mut self, name: &str) -> ModuleId {
        let name = self.interner.intern(name);
        self.registry.admit(name, ModuleKind::Builtin)
    }
}
