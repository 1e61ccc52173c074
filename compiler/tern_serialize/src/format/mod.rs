//! Container layout and the serializable payload.
//!
//! ```text
//! offset 0   magic   b"TMOD"
//! offset 4   major   u16 little endian
//! offset 6   minor   u16 little endian
//! offset 8   payload bincode(ModulePayload)
//! ```
//!
//! A reader accepts any minor version of the major it supports. Payload
//! fields are only ever appended within a major version.

use std::fmt;

use serde::{Deserialize, Serialize};
use tern_ir::{Fixity, KnownProtocolKind, LibraryKind, LinkLibrary, NominalKind, ValueKind};

use crate::DecodeError;

/// File extension of serialized modules (`Foo.ternmod`).
pub const MODULE_EXTENSION: &str = "ternmod";

/// Leading bytes of every module file.
pub const MAGIC: [u8; 4] = *b"TMOD";

/// Magic plus both version fields.
pub const HEADER_LEN: usize = 8;

pub const FORMAT_VERSION_MAJOR: u16 = 1;
pub const FORMAT_VERSION_MINOR: u16 = 0;

/// Container format version.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct FormatVersion {
    pub major: u16,
    pub minor: u16,
}

impl FormatVersion {
    /// The version this crate writes.
    pub const CURRENT: FormatVersion = FormatVersion {
        major: FORMAT_VERSION_MAJOR,
        minor: FORMAT_VERSION_MINOR,
    };

    pub const fn new(major: u16, minor: u16) -> Self {
        FormatVersion { major, minor }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Split a module file into its version and payload bytes.
///
/// Checks the magic and the major version; the payload is not touched.
pub fn read_header(bytes: &[u8]) -> Result<(FormatVersion, &[u8]), DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(DecodeError::Malformed(format!(
            "file is {} bytes, shorter than the {HEADER_LEN}-byte header",
            bytes.len()
        )));
    }
    let (header, payload) = bytes.split_at(HEADER_LEN);
    if header[..4] != MAGIC {
        return Err(DecodeError::Malformed(
            "not a module file (bad magic)".to_owned(),
        ));
    }
    let version = FormatVersion::new(
        u16::from_le_bytes([header[4], header[5]]),
        u16::from_le_bytes([header[6], header[7]]),
    );

    if version.major > FORMAT_VERSION_MAJOR {
        return Err(DecodeError::FormatTooNew {
            found: version.major,
            supported: FORMAT_VERSION_MAJOR,
        });
    }
    if version.major < FORMAT_VERSION_MAJOR {
        return Err(DecodeError::Malformed(format!(
            "format version {version} is no longer supported"
        )));
    }
    Ok((version, payload))
}

/// Error writing a module file.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("failed to encode module payload: {0}")]
    Payload(#[from] bincode::Error),
}

/// Write `payload` in the current container format.
pub fn encode_module(payload: &ModulePayload) -> Result<Vec<u8>, EncodeError> {
    encode_with_version(payload, FormatVersion::CURRENT)
}

/// Write `payload` under an explicit header version.
///
/// Readers only accept their own major version, so anything other than
/// [`FormatVersion::CURRENT`] is for exercising version skew.
pub fn encode_with_version(
    payload: &ModulePayload,
    version: FormatVersion,
) -> Result<Vec<u8>, EncodeError> {
    let body = bincode::serialize(payload)?;
    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&version.major.to_le_bytes());
    out.extend_from_slice(&version.minor.to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Everything a module file carries after its header.
///
/// Names are plain strings here; the decoder interns them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulePayload {
    /// Declared module name.
    pub name: String,
    #[serde(default)]
    pub dependencies: Vec<RawDependency>,
    #[serde(default)]
    pub decls: Vec<RawDecl>,
    #[serde(default)]
    pub link_libraries: Vec<LinkLibrary>,
}

impl ModulePayload {
    pub fn new(name: impl Into<String>) -> Self {
        ModulePayload {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a dependency on `access_path` (`"B"` or `"B.Sub"`).
    #[must_use]
    pub fn with_dependency(mut self, access_path: impl Into<String>, exported: bool) -> Self {
        self.dependencies.push(RawDependency {
            access_path: access_path.into(),
            exported,
        });
        self
    }

    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.decls.push(RawDecl::Value {
            name: name.into(),
            kind,
        });
        self
    }

    #[must_use]
    pub fn with_operator(mut self, name: impl Into<String>, fixity: Fixity) -> Self {
        self.decls.push(RawDecl::Operator {
            name: name.into(),
            fixity,
        });
        self
    }

    #[must_use]
    pub fn with_nominal(mut self, nominal: RawNominal) -> Self {
        self.decls.push(RawDecl::Nominal(nominal));
        self
    }

    #[must_use]
    pub fn with_extension(mut self, extension: RawExtension) -> Self {
        self.decls.push(RawDecl::Extension(extension));
        self
    }

    #[must_use]
    pub fn with_link_library(mut self, name: impl Into<String>, kind: LibraryKind) -> Self {
        self.link_libraries.push(LinkLibrary::new(name, kind));
        self
    }
}

/// A dependency as written by the compiler that produced the module.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDependency {
    /// Dotted access path; the first segment names the module.
    pub access_path: String,
    /// Re-exported to importers of this module.
    #[serde(default)]
    pub exported: bool,
}

/// A top-level declaration in payload form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawDecl {
    Value { name: String, kind: ValueKind },
    Operator { name: String, fixity: Fixity },
    Nominal(RawNominal),
    Extension(RawExtension),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNominal {
    pub name: String,
    pub kind: NominalKind,
    #[serde(default)]
    pub conformances: Vec<KnownProtocolKind>,
    #[serde(default)]
    pub members: Vec<RawMember>,
}

impl RawNominal {
    pub fn new(name: impl Into<String>, kind: NominalKind) -> Self {
        RawNominal {
            name: name.into(),
            kind,
            conformances: Vec::new(),
            members: Vec::new(),
        }
    }

    #[must_use]
    pub fn conforming_to(mut self, kind: KnownProtocolKind) -> Self {
        self.conformances.push(kind);
        self
    }

    #[must_use]
    pub fn with_member(mut self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.members.push(RawMember {
            name: name.into(),
            kind,
        });
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawExtension {
    /// Name of the extended nominal type; it may live in another module.
    pub extended: String,
    #[serde(default)]
    pub conformances: Vec<KnownProtocolKind>,
    #[serde(default)]
    pub members: Vec<RawMember>,
}

impl RawExtension {
    pub fn new(extended: impl Into<String>) -> Self {
        RawExtension {
            extended: extended.into(),
            conformances: Vec::new(),
            members: Vec::new(),
        }
    }

    #[must_use]
    pub fn conforming_to(mut self, kind: KnownProtocolKind) -> Self {
        self.conformances.push(kind);
        self
    }

    #[must_use]
    pub fn with_member(mut self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.members.push(RawMember {
            name: name.into(),
            kind,
        });
        self
    }
}

/// A member of a nominal type or extension.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMember {
    pub name: String,
    pub kind: ValueKind,
}
