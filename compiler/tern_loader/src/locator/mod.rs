//! Finding the bytes of a module.
//!
//! Search order, first success wins:
//!
//! 1. the override registry, keyed by the dot-joined access path
//! 2. `<dir of importing buffer>/<name>.ternmod`
//! 3. `<working dir>/<name>.ternmod`
//! 4. `<search path>/<name>.ternmod` for each configured search path
//!
//! Override entries are consumed when taken. Disk reads go through a
//! [`FileSystem`] so tests can count them.

use std::io;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use tern_ir::{AccessPath, Span};
use tern_serialize::MODULE_EXTENSION;

use crate::context::ModuleContext;
use crate::fs::{FileSystem, MemoryBuffer};

/// Why no module bytes were produced.
#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    /// No candidate exists. Not an error for the caller: another loader
    /// may know the module.
    #[error("no module file found for '{module}'")]
    NotFound { module: String },
    /// The last candidate tried failed for a reason other than absence.
    #[error("cannot open '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Searches overrides and directories for module files.
#[derive(Debug, Default)]
pub struct ModuleLocator<F> {
    fs: F,
    overrides: FxHashMap<String, MemoryBuffer>,
}

impl<F: FileSystem> ModuleLocator<F> {
    pub fn new(fs: F) -> Self {
        ModuleLocator {
            fs,
            overrides: FxHashMap::default(),
        }
    }

    pub fn file_system(&self) -> &F {
        &self.fs
    }

    pub fn file_system_mut(&mut self) -> &mut F {
        &mut self.fs
    }

    /// Supply the bytes for `path` (`"A"` or `"A.B"`) without touching disk.
    ///
    /// Returns the buffer previously registered under the same path.
    pub fn register_buffer(
        &mut self,
        path: impl Into<String>,
        buffer: MemoryBuffer,
    ) -> Option<MemoryBuffer> {
        self.overrides.insert(path.into(), buffer)
    }

    /// Whether an unconsumed override exists for `path`.
    pub fn has_override(&self, path: &str) -> bool {
        self.overrides.contains_key(path)
    }

    /// Produce the bytes for the module named by `path`.
    ///
    /// Only the first element of `path` names the file on disk; the override
    /// registry is keyed by the whole path.
    pub fn locate(
        &mut self,
        ctx: &ModuleContext,
        path: &AccessPath,
        import_loc: Option<Span>,
    ) -> Result<MemoryBuffer, LocateError> {
        let key = path.join(&*ctx.interner, ".");
        if let Some(buffer) = self.overrides.remove(&key) {
            tracing::debug!(module = %key, "using registered module buffer");
            return Ok(buffer);
        }

        let module = match path.first() {
            Some(elem) => ctx.interner.lookup(elem.name),
            None => return Err(LocateError::NotFound { module: key }),
        };

        let mut last_error = None;
        for candidate in candidate_paths(ctx, module, import_loc) {
            match self.fs.read(&candidate) {
                Ok(buffer) => {
                    tracing::debug!(module, path = %candidate.display(), "found module file");
                    return Ok(buffer);
                }
                Err(e) => {
                    tracing::trace!(module, path = %candidate.display(), error = %e, "candidate unreadable");
                    last_error = Some((candidate, e));
                }
            }
        }

        match last_error {
            Some((path, source)) if source.kind() != io::ErrorKind::NotFound => {
                Err(LocateError::Io { path, source })
            }
            _ => Err(LocateError::NotFound {
                module: module.to_owned(),
            }),
        }
    }
}

/// Generate the disk locations for `module` in search order.
fn candidate_paths(ctx: &ModuleContext, module: &str, import_loc: Option<Span>) -> Vec<PathBuf> {
    let file_name = format!("{module}.{MODULE_EXTENSION}");
    let mut candidates = Vec::with_capacity(ctx.options.import_paths().len() + 2);

    let import_dir = import_loc
        .and_then(|loc| ctx.sources.path_containing(loc))
        .and_then(Path::parent)
        .filter(|dir| !dir.as_os_str().is_empty());
    if let Some(dir) = import_dir {
        candidates.push(dir.join(&file_name));
    }

    candidates.push(match ctx.options.working_dir() {
        Some(dir) => dir.join(&file_name),
        None => PathBuf::from(&file_name),
    });

    for dir in ctx.options.import_paths() {
        candidates.push(dir.join(&file_name));
    }
    candidates
}
