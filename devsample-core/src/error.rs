//! Crate-wide error types and the exit-code taxonomy.
//!
//! Per-component errors (`CollectError` in [`crate::collector::procfs`],
//! `RawLogError` in [`crate::rawlog`], `AccountingError` in [`crate::accounting`])
//! each implement [`std::error::Error`] and `From<std::io::Error>`. This module
//! only defines the taxonomy that a binary's `main()` uses to pick a process exit
//! code; no other layer calls `std::process::exit`.

use std::fmt;

/// Process exit codes, assigned at the one `main()` boundary of a binary.
///
/// No other layer in this crate calls `std::process::exit`; errors propagate as
/// `Result` up to `main`, which matches on the error kind and exits accordingly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Usage = 1,
    RawLogFormat = 7,
    RawLogWrite = 8,
    RawLogRead = 9,
    Fatal = 42,
    DirectoryMissing = 54,
    DirectoryUnwritable = 55,
    Allocation = 13,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Aggregated error type a binary's `main()` can match on to select an [`ExitCode`].
///
/// Each component keeps its own focused error enum; this type only exists at the
/// CLI boundary to unify them for exit-code selection, per the error handling
/// design's "Propagation" rule: the deviation engine and sampling loop never
/// propagate subsystem errors upward, they degrade to support-flag changes.
#[derive(Debug)]
pub enum CoreError {
    Usage(String),
    RawLogFormat(String),
    RawLogWrite(std::io::Error),
    RawLogRead(std::io::Error),
    Fatal(String),
    DirectoryMissing(String),
    DirectoryUnwritable(String),
    Allocation(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Usage(m) => write!(f, "usage error: {m}"),
            CoreError::RawLogFormat(m) => write!(f, "raw log format error: {m}"),
            CoreError::RawLogWrite(e) => write!(f, "raw log write error: {e}"),
            CoreError::RawLogRead(e) => write!(f, "raw log read error: {e}"),
            CoreError::Fatal(m) => write!(f, "fatal error: {m}"),
            CoreError::DirectoryMissing(m) => write!(f, "directory missing: {m}"),
            CoreError::DirectoryUnwritable(m) => write!(f, "directory unwritable: {m}"),
            CoreError::Allocation(m) => write!(f, "allocation failure: {m}"),
        }
    }
}

impl std::error::Error for CoreError {}

impl CoreError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CoreError::Usage(_) => ExitCode::Usage,
            CoreError::RawLogFormat(_) => ExitCode::RawLogFormat,
            CoreError::RawLogWrite(_) => ExitCode::RawLogWrite,
            CoreError::RawLogRead(_) => ExitCode::RawLogRead,
            CoreError::Fatal(_) => ExitCode::Fatal,
            CoreError::DirectoryMissing(_) => ExitCode::DirectoryMissing,
            CoreError::DirectoryUnwritable(_) => ExitCode::DirectoryUnwritable,
            CoreError::Allocation(_) => ExitCode::Allocation,
        }
    }
}

impl From<crate::rawlog::RawLogError> for CoreError {
    fn from(e: crate::rawlog::RawLogError) -> Self {
        use crate::rawlog::RawLogError as R;
        match e {
            R::BadMagic { .. } | R::VersionMismatch { .. } | R::StructSizeMismatch { .. } => {
                CoreError::RawLogFormat(e.to_string())
            }
            R::Write(io) => CoreError::RawLogWrite(io),
            R::Read(io) => CoreError::RawLogRead(io),
            R::Truncated => CoreError::RawLogRead(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "truncated record",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_taxonomy() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::Usage.code(), 1);
        assert_eq!(ExitCode::RawLogFormat.code(), 7);
        assert_eq!(ExitCode::RawLogWrite.code(), 8);
        assert_eq!(ExitCode::RawLogRead.code(), 9);
        assert_eq!(ExitCode::Fatal.code(), 42);
        assert_eq!(ExitCode::DirectoryMissing.code(), 54);
        assert_eq!(ExitCode::DirectoryUnwritable.code(), 55);
        assert_eq!(ExitCode::Allocation.code(), 13);
    }

    #[test]
    fn core_error_maps_to_expected_exit_code() {
        assert_eq!(
            CoreError::RawLogFormat("bad magic".into()).exit_code(),
            ExitCode::RawLogFormat
        );
        assert_eq!(
            CoreError::Fatal("oom".into()).exit_code(),
            ExitCode::Fatal
        );
    }
}
