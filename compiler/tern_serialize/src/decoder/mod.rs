//! Module file decoding.

use tern_ir::{
    Decl, ExtensionDecl, Name, NominalTypeDecl, OperatorDecl, StringInterner, ValueDecl, ValueKind,
};

use crate::format::{read_header, FormatVersion, ModulePayload, RawDecl, RawMember};
use crate::{LoadStatus, ModuleFile};

/// Why a module file could not be decoded.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Written by a newer compiler.
    #[error("module format version {found} is newer than the supported version {supported}")]
    FormatTooNew { found: u16, supported: u16 },
    /// Structurally corrupt.
    #[error("malformed module file: {0}")]
    Malformed(String),
}

impl DecodeError {
    pub fn status(&self) -> LoadStatus {
        match self {
            DecodeError::FormatTooNew { .. } => LoadStatus::FormatTooNew,
            DecodeError::Malformed(_) => LoadStatus::Malformed,
        }
    }
}

/// Turns module file bytes into a descriptor.
///
/// A decoder only reports format problems. Whether the module's
/// dependencies are loaded is decided later by association, so a successful
/// decode always has status `Valid`.
pub trait ModuleDecoder {
    fn decode(&self, bytes: &[u8], interner: &StringInterner) -> Result<ModuleFile, DecodeError>;
}

/// Decoder for the `.ternmod` container.
#[derive(Copy, Clone, Debug, Default)]
pub struct BinaryDecoder;

impl ModuleDecoder for BinaryDecoder {
    fn decode(&self, bytes: &[u8], interner: &StringInterner) -> Result<ModuleFile, DecodeError> {
        let (version, body) = read_header(bytes)?;
        let payload: ModulePayload = bincode::deserialize(body)
            .map_err(|e| DecodeError::Malformed(format!("payload: {e}")))?;
        let file = build(payload, version, interner)?;
        tracing::trace!(
            module = interner.lookup(file.name()),
            %version,
            decls = file.display_decls().len(),
            "decoded module file"
        );
        Ok(file)
    }
}

fn malformed(reason: impl Into<String>) -> DecodeError {
    DecodeError::Malformed(reason.into())
}

fn intern_nonempty(interner: &StringInterner, s: &str, what: &str) -> Result<Name, DecodeError> {
    if s.is_empty() {
        return Err(malformed(format!("{what} has an empty name")));
    }
    Ok(interner.intern(s))
}

fn members(
    interner: &StringInterner,
    raw: Vec<RawMember>,
    parent: Name,
) -> Result<Vec<ValueDecl>, DecodeError> {
    raw.into_iter()
        .map(|m| {
            let name = intern_nonempty(interner, &m.name, "member")?;
            Ok(ValueDecl::member(name, m.kind, parent))
        })
        .collect()
}

/// Validate `payload` and index it into a descriptor.
fn build(
    payload: ModulePayload,
    version: FormatVersion,
    interner: &StringInterner,
) -> Result<ModuleFile, DecodeError> {
    let name = intern_nonempty(interner, &payload.name, "module")?;
    let mut file = ModuleFile::new(name, version);

    for dep in payload.dependencies {
        let mut segments = Vec::new();
        for segment in dep.access_path.split('.') {
            if segment.is_empty() {
                return Err(malformed(format!(
                    "dependency '{}' has an empty path segment",
                    dep.access_path
                )));
            }
            segments.push(interner.intern(segment));
        }
        // `split` yields at least one segment, and empty ones were rejected.
        let Some((&module, rest)) = segments.split_first() else {
            return Err(malformed("dependency has an empty access path"));
        };
        let rest = rest.to_vec();
        file.add_dependency(dep.access_path, dep.exported, module, rest);
    }

    for raw in payload.decls {
        let decl = match raw {
            RawDecl::Value { name, kind } => {
                if matches!(kind, ValueKind::Nominal(_)) {
                    return Err(malformed(format!(
                        "value '{name}' has a nominal kind but no type declaration"
                    )));
                }
                Decl::Value(ValueDecl::top_level(
                    intern_nonempty(interner, &name, "value")?,
                    kind,
                ))
            }
            RawDecl::Operator { name, fixity } => Decl::Operator(OperatorDecl {
                name: intern_nonempty(interner, &name, "operator")?,
                fixity,
            }),
            RawDecl::Nominal(raw) => {
                let name = intern_nonempty(interner, &raw.name, "nominal type")?;
                let mut nominal = NominalTypeDecl::new(name, raw.kind);
                nominal.conformances = raw.conformances;
                nominal.members = members(interner, raw.members, name)?;
                Decl::Nominal(nominal)
            }
            RawDecl::Extension(raw) => {
                let extended = intern_nonempty(interner, &raw.extended, "extended type")?;
                Decl::Extension(ExtensionDecl {
                    extended,
                    conformances: raw.conformances,
                    members: members(interner, raw.members, extended)?,
                })
            }
        };
        file.add_decl(decl).map_err(|dup| {
            malformed(format!(
                "duplicate {} operator '{}'",
                dup.fixity,
                interner.lookup(dup.name)
            ))
        })?;
    }

    for library in payload.link_libraries {
        if library.name.is_empty() {
            return Err(malformed("link library has an empty name"));
        }
        file.add_link_library(library);
    }

    Ok(file)
}
