//! Serialized module loading.
//!
//! Given an import of a top-level module, the loader finds its `.ternmod`
//! file, decodes it, checks that the module's own dependencies are loaded,
//! and registers the outcome in the [`ModuleContext`]. Later queries (value,
//! operator and member lookup, extension and conformance scans, link
//! libraries) are forwarded to the decoded descriptor.
//!
//! # Example
//!
//! ```no_run
//! use tern_ir::AccessPath;
//! use tern_loader::{ModuleContext, ModuleLoader, SearchPathOptions};
//!
//! let mut ctx = ModuleContext::new(SearchPathOptions::new().with_import_path("/usr/lib/tern"));
//! let mut loader = ModuleLoader::new();
//! let path = AccessPath::single(ctx.intern("Core"), None);
//! if let Some(core) = loader.resolve(&mut ctx, &path, None) {
//!     println!("loaded {}", ctx.module(core).debug_path().unwrap_or("<builtin>"));
//! }
//! ```

pub mod context;
pub mod dependency;
pub mod fs;
pub mod loader;
pub mod locator;
pub mod registry;

pub use context::{ModuleContext, SearchPathOptions};
pub use fs::{FileSystem, MemoryBuffer, MemoryFileSystem, RealFileSystem};
pub use loader::ModuleLoader;
pub use locator::{LocateError, ModuleLocator};
pub use registry::{FileState, LoadedModule, ModuleKind, ModuleRegistry, SerializedModule, UnusableReason};
