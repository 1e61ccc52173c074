//! The `pack` command: build a `.ternmod` file from a JSON manifest.
//!
//! A manifest is a [`ModulePayload`] in JSON:
//!
//! ```json
//! {
//!   "name": "Geometry",
//!   "dependencies": [{ "access_path": "Core", "exported": true }],
//!   "decls": [
//!     { "value": { "name": "area", "kind": "function" } },
//!     { "nominal": { "name": "Point", "kind": "struct", "conformances": ["equatable"] } }
//!   ],
//!   "link_libraries": [{ "name": "m", "kind": "library" }]
//! }
//! ```

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tern_ir::StringInterner;
use tern_serialize::{
    encode_module, BinaryDecoder, DecodeError, EncodeError, ModuleDecoder, ModulePayload,
    MODULE_EXTENSION,
};

use super::CommandError;

/// Problems turning a manifest into module bytes.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("cannot read manifest '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid manifest '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// The manifest parsed but describes a module the loader would reject.
    #[error("manifest '{}' describes an unloadable module: {source}", path.display())]
    Rejected {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}

/// Parse the manifest at `path`.
pub fn read_manifest(path: &Path) -> Result<ModulePayload, ManifestError> {
    let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ManifestError::Parse {
        path: path.to_owned(),
        source,
    })
}

/// Encode the manifest at `manifest` and write it to `output`.
///
/// Without `output` the file is written next to the manifest as
/// `<module name>.ternmod`. The encoded bytes are decoded once before
/// writing so a manifest the loader would reject never reaches disk.
/// Returns the path written.
pub fn pack_manifest(
    manifest: &Path,
    output: Option<&Path>,
    out: &mut dyn Write,
) -> Result<PathBuf, CommandError> {
    let payload = read_manifest(manifest)?;
    let bytes = encode_module(&payload).map_err(ManifestError::from)?;

    BinaryDecoder
        .decode(&bytes, &StringInterner::new())
        .map_err(|source| ManifestError::Rejected {
            path: manifest.to_owned(),
            source,
        })?;

    let target = output.map_or_else(
        || manifest.with_file_name(format!("{}.{MODULE_EXTENSION}", payload.name)),
        Path::to_path_buf,
    );
    std::fs::write(&target, &bytes).map_err(|source| CommandError::Write {
        path: target.clone(),
        source,
    })?;
    tracing::debug!(module = %payload.name, path = %target.display(), bytes = bytes.len(), "packed module");

    writeln!(
        out,
        "wrote {} ({} bytes, {} declarations)",
        target.display(),
        bytes.len(),
        payload.decls.len()
    )?;
    Ok(target)
}
