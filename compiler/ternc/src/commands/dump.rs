//! The `dump` command: print the contents of a `.ternmod` file.

use std::io::Write;
use std::path::Path;

use tern_ir::StringInterner;
use tern_serialize::{BinaryDecoder, ModuleDecoder};

use super::{read_bytes, write_decl, CommandError};

/// Decode the module file at `path` and describe it.
///
/// The file is checked on its own: dependencies are listed but not looked
/// for.
pub fn dump_module(path: &Path, out: &mut dyn Write) -> Result<(), CommandError> {
    let bytes = read_bytes(path)?;
    let interner = StringInterner::new();
    let file = BinaryDecoder
        .decode(&bytes, &interner)
        .map_err(|source| CommandError::Decode {
            path: path.to_owned(),
            source,
        })?;

    writeln!(
        out,
        "module {} (format {})",
        interner.lookup(file.name()),
        file.version()
    )?;

    if !file.dependencies().is_empty() {
        writeln!(out, "dependencies:")?;
        for dep in file.dependencies() {
            let marker = if dep.exported { " (exported)" } else { "" };
            writeln!(out, "  {}{marker}", dep.raw_access_path)?;
        }
    }

    if !file.display_decls().is_empty() {
        writeln!(out, "declarations:")?;
        for decl in file.display_decls() {
            write_decl(out, decl, &interner)?;
        }
    }

    if !file.link_libraries().is_empty() {
        writeln!(out, "link libraries:")?;
        for library in file.link_libraries() {
            writeln!(out, "  {library}")?;
        }
    }
    Ok(())
}
