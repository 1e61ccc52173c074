//! Serialized module files.
//!
//! A `.ternmod` file is a small fixed header followed by a bincode payload:
//!
//! ```text
//! "TMOD" | major: u16 LE | minor: u16 LE | payload
//! ```
//!
//! [`ModuleDecoder`] turns the bytes into a [`ModuleFile`] (the in-memory
//! descriptor the loader admits) or a [`DecodeError`]. [`encode_module`]
//! writes the same container from a [`ModulePayload`].

mod decoder;
pub mod format;
mod module_file;

pub use decoder::{BinaryDecoder, DecodeError, ModuleDecoder};
pub use format::{
    encode_module, EncodeError, FormatVersion, ModulePayload, RawDecl, RawDependency,
    RawExtension, RawMember, RawNominal, FORMAT_VERSION_MAJOR, FORMAT_VERSION_MINOR,
    MODULE_EXTENSION,
};
pub use module_file::{Dependency, ImportedModule, LoadStatus, ModuleFile, VisibleDeclConsumer};
