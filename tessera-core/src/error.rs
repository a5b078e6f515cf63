//! Compositor error type
//!
//! A single flat error enum shared by every module. Configuration-level
//! failures (buffer too small, missing palette) are reported through the same
//! type and should be treated as unrecoverable by the caller.

use core::fmt;

use crate::config::toml::ParseError;

/// Compositor errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Operation was canceled (reserved)
    Canceled,
    /// An argument was out of range or inconsistent
    InvalidArgument,
    /// The requested operation is not supported
    NotSupported,
    /// Bus or transfer failure
    IoError,
    /// The device reported a failure
    DeviceError,
    /// A fixed-capacity buffer or collection is too small
    OutOfMemory,
    /// Data or pixel format mismatch
    InvalidFormat,
    /// An indexed pixel format was used without a palette
    NoPalette,
    /// The object is not in a state that allows the operation
    InvalidState,
    /// Unknown/generic error
    UnknownError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Error::Canceled => "operation canceled",
            Error::InvalidArgument => "invalid argument",
            Error::NotSupported => "operation not supported",
            Error::IoError => "I/O error",
            Error::DeviceError => "device error",
            Error::OutOfMemory => "out of memory",
            Error::InvalidFormat => "invalid format",
            Error::NoPalette => "indexed format requires a palette",
            Error::InvalidState => "invalid state",
            Error::UnknownError => "unknown error",
        };
        f.write_str(text)
    }
}

impl From<ParseError> for Error {
    fn from(_: ParseError) -> Self {
        Error::InvalidFormat
    }
}
