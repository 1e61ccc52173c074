//! Plain-text diagnostic rendering.
//!
//! ```text
//! error[E7004]: missing required module 'B'
//!   --> /src/app/main.tn:3:8
//!    | required by this import
//!    = note: ...
//! ```

use std::io::{self, Write};

use tern_ir::SourceMap;

use crate::Diagnostic;

/// Trait for diagnostic output backends.
pub trait DiagnosticEmitter {
    /// Emit a single diagnostic.
    fn emit(&mut self, diagnostic: &Diagnostic, sources: &SourceMap) -> io::Result<()>;

    /// Emit a summary line after all diagnostics.
    fn emit_summary(&mut self, error_count: usize) -> io::Result<()>;

    /// Emit every diagnostic followed by the summary.
    fn emit_all<'a>(
        &mut self,
        diagnostics: impl IntoIterator<Item = &'a Diagnostic>,
        sources: &SourceMap,
    ) -> io::Result<()>
    where
        Self: Sized,
    {
        let mut errors = 0;
        for diag in diagnostics {
            if diag.is_error() {
                errors += 1;
            }
            self.emit(diag, sources)?;
        }
        self.emit_summary(errors)
    }
}

/// Renders diagnostics as plain text to any writer.
pub struct TerminalEmitter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalEmitter<W> {
    pub fn new(writer: W) -> Self {
        TerminalEmitter { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DiagnosticEmitter for TerminalEmitter<W> {
    fn emit(&mut self, diagnostic: &Diagnostic, sources: &SourceMap) -> io::Result<()> {
        writeln!(
            self.writer,
            "{}[{}]: {}",
            diagnostic.severity, diagnostic.code, diagnostic.message
        )?;

        for label in &diagnostic.labels {
            match sources.line_col(label.span.start) {
                Some((buffer, line, col)) => writeln!(
                    self.writer,
                    "  --> {}:{line}:{col}",
                    sources.buffer(buffer).path().display()
                )?,
                None => writeln!(self.writer, "  --> <unknown location>")?,
            }
            if !label.message.is_empty() {
                writeln!(self.writer, "   | {}", label.message)?;
            }
        }

        for note in &diagnostic.notes {
            writeln!(self.writer, "   = note: {note}")?;
        }
        Ok(())
    }

    fn emit_summary(&mut self, error_count: usize) -> io::Result<()> {
        match error_count {
            0 => Ok(()),
            1 => writeln!(self.writer, "1 error"),
            n => writeln!(self.writer, "{n} errors"),
        }
    }
}
