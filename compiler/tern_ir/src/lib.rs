//! tern IR - identifiers, locations and declaration value objects.
//!
//! This crate holds the data every other tern crate agrees on:
//! - `Name` for interned identifiers
//! - `Span` and `SourceMap` for import locations
//! - `AccessPath` for dotted import requests
//! - `ModuleId` / `Generation` handles used by the module registry
//! - Declaration value objects (`ValueDecl`, `OperatorDecl`, ...) that a
//!   module file hands back from lookups
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: identifiers are `Name(u32)`, compared in O(1)
//! - **Handles, not pointers**: modules are addressed by `ModuleId(u32)`
//! - **Opaque declarations**: the decl types carry only what the loader and
//!   its callers need to route lookups; they are not a full AST

mod access_path;
pub mod decl;
mod ids;
mod interner;
mod name;
mod source_map;
mod span;

pub use access_path::{AccessPath, PathElem};
pub use decl::{
    Decl, ExtensionDecl, Fixity, KnownProtocolKind, LibraryKind, LinkLibrary, LookupKind,
    NominalKind, NominalTypeDecl, OperatorDecl, ValueDecl, ValueKind,
};
pub use ids::{BufferId, Generation, ModuleId};
pub use interner::{InternError, SharedInterner, StringInterner, StringLookup};
pub use name::Name;
pub use source_map::{SourceBuffer, SourceMap};
pub use span::Span;
