//! Loaded-module table and generation bookkeeping.
//!
//! Every resolution outcome that reached the decoder is admitted, failures
//! included, so a name is never searched for twice. Decoded files are also
//! recorded in admission order next to the generation they were admitted
//! at; extension and conformance scans walk that list lazily through
//! [`ModuleRegistry::files_since`].

use rustc_hash::FxHashMap;
use tern_ir::{Generation, ModuleId, Name};
use tern_serialize::{LoadStatus, ModuleFile};

/// Why a serialized module has no usable descriptor.
#[derive(Clone, Debug)]
pub enum UnusableReason {
    FormatTooNew { found: u16, supported: u16 },
    Malformed(String),
    /// The file decoded, but association found unloaded dependencies.
    ///
    /// The decoded file is retained; it is never consulted for lookups.
    MissingDependencies {
        file: Box<ModuleFile>,
        missing: Vec<String>,
    },
}

/// Descriptor state of a serialized module.
#[derive(Clone, Debug)]
pub enum FileState {
    Usable(ModuleFile),
    Unusable(UnusableReason),
}

impl FileState {
    /// The descriptor queries may use.
    pub fn usable(&self) -> Option<&ModuleFile> {
        match self {
            FileState::Usable(file) => Some(file),
            FileState::Unusable(_) => None,
        }
    }

    /// The decoded descriptor, usable or not.
    pub fn decoded(&self) -> Option<&ModuleFile> {
        match self {
            FileState::Usable(file) => Some(file),
            FileState::Unusable(UnusableReason::MissingDependencies { file, .. }) => Some(file),
            FileState::Unusable(_) => None,
        }
    }

    pub fn status(&self) -> LoadStatus {
        match self {
            FileState::Usable(_) => LoadStatus::Valid,
            FileState::Unusable(UnusableReason::FormatTooNew { .. }) => LoadStatus::FormatTooNew,
            FileState::Unusable(UnusableReason::Malformed(_)) => LoadStatus::Malformed,
            FileState::Unusable(UnusableReason::MissingDependencies { .. }) => {
                LoadStatus::MissingDependency
            }
        }
    }
}

/// A module loaded from a module file (or an attempt to).
#[derive(Clone, Debug)]
pub struct SerializedModule {
    /// Identifier of the buffer the module was read from.
    pub debug_path: String,
    pub file: FileState,
}

/// What kind of module a registry entry is. Fixed at admission.
#[derive(Clone, Debug)]
pub enum ModuleKind {
    Serialized(SerializedModule),
    /// Supplied by the compiler itself; has no file and answers every query
    /// with nothing.
    Builtin,
}

/// One registry entry.
#[derive(Clone, Debug)]
pub struct LoadedModule {
    name: Name,
    kind: ModuleKind,
    /// Generation current when the entry was admitted.
    generation: Generation,
}

impl LoadedModule {
    pub fn name(&self) -> Name {
        self.name
    }

    pub fn kind(&self) -> &ModuleKind {
        &self.kind
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// The descriptor lookups are forwarded to, if any.
    pub fn file(&self) -> Option<&ModuleFile> {
        match &self.kind {
            ModuleKind::Serialized(module) => module.file.usable(),
            ModuleKind::Builtin => None,
        }
    }

    pub fn debug_path(&self) -> Option<&str> {
        match &self.kind {
            ModuleKind::Serialized(module) => Some(&module.debug_path),
            ModuleKind::Builtin => None,
        }
    }

    /// Load status of a serialized module; `None` for builtins.
    pub fn status(&self) -> Option<LoadStatus> {
        match &self.kind {
            ModuleKind::Serialized(module) => Some(module.file.status()),
            ModuleKind::Builtin => None,
        }
    }
}

/// Per-context table of loaded modules.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: Vec<LoadedModule>,
    by_name: FxHashMap<Name, ModuleId>,
    /// Decoded files in admission order.
    decoded: Vec<(ModuleId, Generation)>,
    generation: Generation,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a module under `name` at the current generation.
    ///
    /// Names are admitted once: if `name` is already present the existing
    /// handle is returned and `kind` is dropped.
    ///
    /// # Panics
    /// Panics if the registry already holds `u32::MAX` modules.
    pub fn admit(&mut self, name: Name, kind: ModuleKind) -> ModuleId {
        if let Some(&existing) = self.by_name.get(&name) {
            tracing::debug!(?name, "module already admitted; keeping first entry");
            return existing;
        }

        let raw = u32::try_from(self.modules.len())
            .unwrap_or_else(|_| panic!("module registry overflow"));
        let id = ModuleId::new(raw);
        let has_decoded_file = match &kind {
            ModuleKind::Serialized(module) => module.file.decoded().is_some(),
            ModuleKind::Builtin => false,
        };
        self.modules.push(LoadedModule {
            name,
            kind,
            generation: self.generation,
        });
        self.by_name.insert(name, id);
        if has_decoded_file {
            self.decoded.push((id, self.generation));
        }
        id
    }

    /// Advance the generation by one and return the new value.
    pub fn bump_generation(&mut self) -> Generation {
        self.generation = self.generation.next();
        tracing::trace!(generation = %self.generation, "bumped module generation");
        self.generation
    }

    pub fn current_generation(&self) -> Generation {
        self.generation
    }

    pub fn lookup(&self, name: Name) -> Option<ModuleId> {
        self.by_name.get(&name).copied()
    }

    /// Whether any entry, failed ones included, is registered under `name`.
    pub fn contains(&self, name: Name) -> bool {
        self.by_name.contains_key(&name)
    }

    /// Get a module by handle.
    ///
    /// # Panics
    /// Panics if `id` came from another registry.
    pub fn get(&self, id: ModuleId) -> &LoadedModule {
        &self.modules[id.index()]
    }

    /// Usable descriptors admitted after `since`, in admission order.
    pub fn files_since(
        &self,
        since: Generation,
    ) -> impl Iterator<Item = (ModuleId, &ModuleFile)> + '_ {
        self.decoded
            .iter()
            .filter(move |&&(_, generation)| generation > since)
            .filter_map(|&(id, _)| self.get(id).file().map(|file| (id, file)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModuleId, &LoadedModule)> {
        self.modules
            .iter()
            .enumerate()
            .filter_map(|(i, module)| u32::try_from(i).ok().map(|raw| (ModuleId::new(raw), module)))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests;
