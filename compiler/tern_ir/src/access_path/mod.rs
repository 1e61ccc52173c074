//! Dotted access paths (`A.B.C`) as written in an import.

use smallvec::SmallVec;

use crate::{Name, Span, StringLookup};

/// One `(identifier, location)` segment of an access path.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct PathElem {
    pub name: Name,
    /// Location of the identifier; `None` for synthesized paths.
    pub span: Option<Span>,
}

impl PathElem {
    pub const fn new(name: Name, span: Option<Span>) -> Self {
        PathElem { name, span }
    }
}

/// Ordered identifier sequence naming a module or a member inside one.
///
/// Nearly every import names a top-level module, so one segment is stored
/// inline.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct AccessPath {
    elems: SmallVec<[PathElem; 1]>,
}

impl AccessPath {
    /// The empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// A single-segment path.
    pub fn single(name: Name, span: Option<Span>) -> Self {
        let mut elems = SmallVec::new();
        elems.push(PathElem::new(name, span));
        AccessPath { elems }
    }

    /// A path of synthesized segments with no locations.
    pub fn from_names(names: impl IntoIterator<Item = Name>) -> Self {
        AccessPath {
            elems: names.into_iter().map(|n| PathElem::new(n, None)).collect(),
        }
    }

    /// Append a segment.
    #[must_use]
    pub fn with(mut self, name: Name, span: Option<Span>) -> Self {
        self.elems.push(PathElem::new(name, span));
        self
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// Whether the path names a top-level module (exactly one segment).
    pub fn is_top_level(&self) -> bool {
        self.elems.len() == 1
    }

    pub fn first(&self) -> Option<&PathElem> {
        self.elems.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathElem> {
        self.elems.iter()
    }

    /// Join the segment texts with `sep` (`"A.B.C"` for `sep = "."`).
    pub fn join<L: StringLookup + ?Sized>(&self, lookup: &L, sep: &str) -> String {
        let mut out = String::new();
        for (i, elem) in self.elems.iter().enumerate() {
            if i > 0 {
                out.push_str(sep);
            }
            out.push_str(lookup.lookup(elem.name));
        }
        out
    }
}

impl FromIterator<PathElem> for AccessPath {
    fn from_iter<I: IntoIterator<Item = PathElem>>(iter: I) -> Self {
        AccessPath {
            elems: iter.into_iter().collect(),
        }
    }
}
