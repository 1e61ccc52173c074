//! The `explain` command: describe a loader error code.

use std::io::Write;

use tern_diagnostic::ErrorCode;

use super::CommandError;

/// Print the one-line description of `code_str` (e.g. `E7004`).
pub fn explain_error(code_str: &str, out: &mut dyn Write) -> Result<(), CommandError> {
    let code = ErrorCode::from_code_str(code_str.trim())
        .ok_or_else(|| CommandError::UnknownCode(code_str.to_owned()))?;
    writeln!(out, "{code}: {}", code.description())?;
    Ok(())
}
