//! Command handlers for the `ternc` CLI.
//!
//! Shared pieces (file reading, the command error type, declaration
//! printing) live here; each submodule implements one command.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tern_ir::{Decl, KnownProtocolKind, NominalKind, StringInterner, ValueDecl, ValueKind};
use tern_serialize::DecodeError;

mod dump;
mod explain;
mod load;
mod pack;

pub use dump::dump_module;
pub use explain::explain_error;
pub use load::{load_module, parse_load_args, search_paths_from_env, LoadOptions, UsageError};
pub use pack::{pack_manifest, read_manifest, ManifestError};

/// Environment variable holding extra module search directories.
pub const MODULE_PATH_VAR: &str = "TERN_MODULE_PATH";

/// Why a command could not run to completion.
///
/// Problems with the modules themselves are diagnostics, not command
/// errors; these are for the tool's own inputs and outputs.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{}", describe_read_failure(.path, .source))]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("'{}': {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("no module file found for '{0}'")]
    NotFound(String),
    #[error("unknown error code '{0}'")]
    UnknownCode(String),
    #[error(transparent)]
    Output(#[from] io::Error),
}

fn describe_read_failure(path: &Path, e: &io::Error) -> String {
    let path = path.display();
    match e.kind() {
        io::ErrorKind::NotFound => format!("cannot find file '{path}'"),
        io::ErrorKind::PermissionDenied => format!("permission denied reading '{path}'"),
        io::ErrorKind::InvalidData => format!("'{path}' contains invalid UTF-8 data"),
        _ => format!("error reading '{path}': {e}"),
    }
}

pub(crate) fn read_bytes(path: &Path) -> Result<Vec<u8>, CommandError> {
    std::fs::read(path).map_err(|source| CommandError::Read {
        path: path.to_owned(),
        source,
    })
}

pub(crate) fn read_text(path: &Path) -> Result<String, CommandError> {
    std::fs::read_to_string(path).map_err(|source| CommandError::Read {
        path: path.to_owned(),
        source,
    })
}

/// Print one declaration, members indented below it.
pub(crate) fn write_decl(
    out: &mut dyn Write,
    decl: &Decl,
    interner: &StringInterner,
) -> io::Result<()> {
    match decl {
        Decl::Value(value) => writeln!(out, "  {}", describe_value(value, interner)),
        Decl::Operator(op) => {
            writeln!(out, "  operator {} {}", op.fixity, interner.lookup(op.name))
        }
        Decl::Nominal(nominal) => {
            writeln!(
                out,
                "  {} {}{}",
                nominal_keyword(nominal.kind),
                interner.lookup(nominal.name),
                conformance_suffix(&nominal.conformances)
            )?;
            write_members(out, &nominal.members, interner)
        }
        Decl::Extension(ext) => {
            writeln!(
                out,
                "  extension {}{}",
                interner.lookup(ext.extended),
                conformance_suffix(&ext.conformances)
            )?;
            write_members(out, &ext.members, interner)
        }
    }
}

fn write_members(
    out: &mut dyn Write,
    members: &[ValueDecl],
    interner: &StringInterner,
) -> io::Result<()> {
    for member in members {
        writeln!(out, "    {}", describe_value(member, interner))?;
    }
    Ok(())
}

fn describe_value(value: &ValueDecl, interner: &StringInterner) -> String {
    let keyword = match value.kind {
        ValueKind::Function => "func",
        ValueKind::Variable => "var",
        ValueKind::Constant => "let",
        ValueKind::TypeAlias => "typealias",
        ValueKind::Nominal(kind) => nominal_keyword(kind),
    };
    format!("{keyword} {}", interner.lookup(value.name))
}

fn nominal_keyword(kind: NominalKind) -> &'static str {
    match kind {
        NominalKind::Struct => "struct",
        NominalKind::Enum => "enum",
        NominalKind::Class => "class",
        NominalKind::Protocol => "protocol",
    }
}

fn conformance_suffix(conformances: &[KnownProtocolKind]) -> String {
    if conformances.is_empty() {
        return String::new();
    }
    let names: Vec<String> = conformances.iter().map(|c| format!("{c:?}")).collect();
    format!(": {}", names.join(", "))
}
