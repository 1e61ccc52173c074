//! Source buffers addressed by global offsets.
//!
//! An import location is just a `Span`; to search next to the importing file
//! the loader asks the source map which buffer contains that span and what
//! path the buffer was read from.
//!
//! ```text
//!   offset 0      reserved (Span::DUMMY)
//!   [1, 1+len0]   buffer 0
//!   [2+len0, ..]  buffer 1
//! ```
//!
//! Each range includes the end-of-buffer position so a point span at EOF
//! still maps back to its buffer.

use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::{BufferId, Span};

/// One registered source buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceBuffer {
    /// Path the buffer was read from (its identifier in diagnostics).
    path: PathBuf,
    /// Buffer contents.
    text: String,
    /// Global offset of the first byte.
    base: u32,
}

impl SourceBuffer {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    /// Last global offset owned by this buffer (the EOF position).
    fn end(&self) -> u32 {
        self.base + text_len(&self.text)
    }
}

fn text_len(text: &str) -> u32 {
    u32::try_from(text.len())
        .unwrap_or_else(|_| panic!("source buffer of {} bytes exceeds u32::MAX", text.len()))
}

/// Registry of source buffers.
#[derive(Clone, Debug, Default)]
pub struct SourceMap {
    buffers: Vec<SourceBuffer>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a buffer and assign it the next global offset range.
    ///
    /// # Panics
    /// Panics if a buffer is larger than `u32::MAX` bytes or there are more
    /// than `u32::MAX` buffers.
    pub fn add_buffer(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> BufferId {
        let base = self.buffers.last().map_or(1, |last| last.end() + 1);
        let id = u32::try_from(self.buffers.len())
            .unwrap_or_else(|_| panic!("too many source buffers"));
        self.buffers.push(SourceBuffer {
            path: path.into(),
            text: text.into(),
            base,
        });
        BufferId::new(id)
    }

    /// Get a buffer by id.
    ///
    /// # Panics
    /// Panics if `id` came from another source map.
    pub fn buffer(&self, id: BufferId) -> &SourceBuffer {
        &self.buffers[id.index()]
    }

    /// Find the buffer whose range contains `offset`.
    pub fn find_buffer_containing(&self, offset: u32) -> Option<BufferId> {
        if offset == 0 {
            return None;
        }
        // Buffers are sorted by base; find the last one starting at or before `offset`.
        let idx = self.buffers.partition_point(|buf| buf.base <= offset);
        let candidate = idx.checked_sub(1)?;
        let buffer = &self.buffers[candidate];
        if offset <= buffer.end() {
            u32::try_from(candidate).ok().map(BufferId::new)
        } else {
            None
        }
    }

    /// Path of the buffer that contains `span`, if any.
    pub fn path_containing(&self, span: Span) -> Option<&Path> {
        self.find_buffer_containing(span.start)
            .map(|id| self.buffer(id).path())
    }

    /// Build a global span from a byte range local to `id`.
    pub fn span_in(&self, id: BufferId, range: Range<usize>) -> Span {
        let buffer = self.buffer(id);
        let start = buffer.base + text_len(&buffer.text[..range.start]);
        let end = buffer.base + text_len(&buffer.text[..range.end]);
        Span::new(start, end)
    }

    /// Map a global offset to `(buffer, line, column)`, both 1-based.
    pub fn line_col(&self, offset: u32) -> Option<(BufferId, u32, u32)> {
        let id = self.find_buffer_containing(offset)?;
        let buffer = self.buffer(id);
        let local = (offset - buffer.base) as usize;
        let before = &buffer.text[..local.min(buffer.text.len())];
        let line = 1 + before.bytes().filter(|&b| b == b'\n').count();
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = 1 + before[line_start..].chars().count();
        Some((
            id,
            u32::try_from(line).unwrap_or(u32::MAX),
            u32::try_from(column).unwrap_or(u32::MAX),
        ))
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}
