//! Association: binding a decoded file's dependencies to loaded modules.
//!
//! A dependency counts as loaded when its module segment names any registry
//! entry, including failed and builtin ones. Association never loads
//! anything itself.

use tern_diagnostic::{missing_dependencies, missing_single_dependency, Diagnostic};
use tern_ir::{Span, StringInterner};
use tern_serialize::ModuleFile;

use crate::registry::ModuleRegistry;

/// Result of associating a module file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Association {
    Complete,
    /// Raw access paths of the unloaded dependencies, in declaration order.
    Incomplete { missing: Vec<String> },
}

/// Bind every dependency of `file` against `registry`.
#[tracing::instrument(level = "debug", skip_all, fields(
    module = interner.lookup(file.name()),
    dependencies = file.dependencies().len(),
))]
pub fn associate(
    file: &mut ModuleFile,
    registry: &ModuleRegistry,
    interner: &StringInterner,
) -> Association {
    if file.associate(|name| registry.lookup(name)) {
        return Association::Complete;
    }
    let missing: Vec<String> = file
        .missing_dependencies()
        .map(|dep| dep.raw_access_path.clone())
        .collect();
    tracing::debug!(?missing, "module has unloaded dependencies");
    Association::Incomplete { missing }
}

/// The diagnostic for a module whose dependencies are not all loaded.
///
/// One missing dependency gets the single-dependency message; several are
/// listed together.
pub fn missing_dependency_diagnostic(loc: Option<Span>, missing: &[String]) -> Diagnostic {
    match missing {
        [single] => missing_single_dependency(loc, single),
        _ => missing_dependencies(loc, missing),
    }
}

#[cfg(test)]
mod tests;
