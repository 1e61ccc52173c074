//! Error codes for loader diagnostics.
//!
//! Format: E#### where the first digit is the subsystem:
//! - E7xxx: Module loading
//! - E9xxx: Diagnostic machinery itself

use std::fmt;

/// Error codes for all loader diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Module Loading (E7xxx)
    /// A module file exists but could not be opened
    E7001,
    /// Module file format is newer than this compiler understands
    E7002,
    /// Module file is structurally corrupt
    E7003,
    /// Module depends on one module that is not loaded
    E7004,
    /// Module depends on several modules that are not loaded
    E7005,

    // Diagnostic Machinery (E9xxx)
    /// Too many errors; further diagnostics dropped
    E9002,
}

impl ErrorCode {
    /// All codes, in numeric order.
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::E7001,
        ErrorCode::E7002,
        ErrorCode::E7003,
        ErrorCode::E7004,
        ErrorCode::E7005,
        ErrorCode::E9002,
    ];

    /// Get the error code as a string (e.g., "E7001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E7001 => "E7001",
            ErrorCode::E7002 => "E7002",
            ErrorCode::E7003 => "E7003",
            ErrorCode::E7004 => "E7004",
            ErrorCode::E7005 => "E7005",
            ErrorCode::E9002 => "E9002",
        }
    }

    /// One-line description for `--explain` style listings.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E7001 => "module file could not be opened",
            ErrorCode::E7002 => "module file format is too new",
            ErrorCode::E7003 => "module file is malformed",
            ErrorCode::E7004 => "module depends on a module that is not loaded",
            ErrorCode::E7005 => "module depends on modules that are not loaded",
            ErrorCode::E9002 => "too many errors",
        }
    }

    /// Check if this code belongs to module loading.
    pub fn is_module_loading_error(&self) -> bool {
        self.as_str().starts_with("E7")
    }

    /// Parse an error code string (e.g., "E7003").
    pub fn from_code_str(s: &str) -> Option<ErrorCode> {
        Self::ALL.iter().copied().find(|code| code.as_str() == s)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
