//! Declaration value objects.
//!
//! These are what module-file lookups hand back to the rest of the compiler.
//! They are deliberately thin: a name, a kind, and the relationships the
//! loader needs to route extension and conformance queries.

use std::fmt;

use crate::Name;

/// Kind of a value declaration.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "cache", serde(rename_all = "snake_case"))]
pub enum ValueKind {
    Function,
    Variable,
    Constant,
    TypeAlias,
    /// A nominal type is also a value (it can be named in expressions).
    Nominal(NominalKind),
}

/// Kind of a nominal type declaration.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "cache", serde(rename_all = "snake_case"))]
pub enum NominalKind {
    Struct,
    Enum,
    Class,
    Protocol,
}

/// Operator fixity; operators of different fixity with the same spelling are
/// distinct declarations.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "cache", serde(rename_all = "snake_case"))]
pub enum Fixity {
    Prefix,
    Postfix,
    Infix,
}

impl fmt::Display for Fixity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fixity::Prefix => write!(f, "prefix"),
            Fixity::Postfix => write!(f, "postfix"),
            Fixity::Infix => write!(f, "infix"),
        }
    }
}

/// Protocols the compiler itself knows about and asks modules to enumerate
/// conformances for.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "cache", serde(rename_all = "snake_case"))]
pub enum KnownProtocolKind {
    Equatable,
    Hashable,
    Comparable,
    Sequence,
    RawRepresentable,
    ArrayLiteralConvertible,
    StringLiteralConvertible,
}

/// Name lookup flavor, passed through to the module file untouched.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum LookupKind {
    #[default]
    Unqualified,
    Qualified,
}

/// A value declaration: function, variable, type, or member of a type.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ValueDecl {
    pub name: Name,
    pub kind: ValueKind,
    /// Enclosing nominal type for members; `None` at top level.
    pub parent: Option<Name>,
}

impl ValueDecl {
    pub fn top_level(name: Name, kind: ValueKind) -> Self {
        ValueDecl {
            name,
            kind,
            parent: None,
        }
    }

    pub fn member(name: Name, kind: ValueKind, parent: Name) -> Self {
        ValueDecl {
            name,
            kind,
            parent: Some(parent),
        }
    }
}

/// An operator declaration.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct OperatorDecl {
    pub name: Name,
    pub fixity: Fixity,
}

/// An extension of a nominal type, possibly declared in another module.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ExtensionDecl {
    /// Name of the extended nominal type.
    pub extended: Name,
    pub conformances: Vec<KnownProtocolKind>,
    pub members: Vec<ValueDecl>,
}

impl ExtensionDecl {
    pub fn conforms_to(&self, kind: KnownProtocolKind) -> bool {
        self.conformances.contains(&kind)
    }
}

/// A struct, enum, class or protocol.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct NominalTypeDecl {
    pub name: Name,
    pub kind: NominalKind,
    pub conformances: Vec<KnownProtocolKind>,
    pub members: Vec<ValueDecl>,
    /// Extensions found so far; module loaders append to this.
    pub extensions: Vec<ExtensionDecl>,
}

impl NominalTypeDecl {
    /// A nominal type with no members, conformances or extensions.
    pub fn new(name: Name, kind: NominalKind) -> Self {
        NominalTypeDecl {
            name,
            kind,
            conformances: Vec::new(),
            members: Vec::new(),
            extensions: Vec::new(),
        }
    }

    pub fn conforms_to(&self, kind: KnownProtocolKind) -> bool {
        self.conformances.contains(&kind)
    }
}

/// Any top-level declaration.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Decl {
    Value(ValueDecl),
    Operator(OperatorDecl),
    Nominal(NominalTypeDecl),
    Extension(ExtensionDecl),
}

impl Decl {
    /// The declared name; for extensions, the extended type's name.
    pub fn name(&self) -> Name {
        match self {
            Decl::Value(v) => v.name,
            Decl::Operator(op) => op.name,
            Decl::Nominal(n) => n.name,
            Decl::Extension(ext) => ext.extended,
        }
    }
}

/// How a library should be linked.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "cache", serde(rename_all = "snake_case"))]
pub enum LibraryKind {
    Library,
    Framework,
}

/// A library the importer must link against when using a module.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkLibrary {
    pub name: String,
    pub kind: LibraryKind,
}

impl LinkLibrary {
    pub fn new(name: impl Into<String>, kind: LibraryKind) -> Self {
        LinkLibrary {
            name: name.into(),
            kind,
        }
    }
}

impl fmt::Display for LinkLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LibraryKind::Library => write!(f, "-l{}", self.name),
            LibraryKind::Framework => write!(f, "-framework {}", self.name),
        }
    }
}
