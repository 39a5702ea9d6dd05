//! Error taxonomy for the cryptographic core and the authenticated container.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Context describing where in a container operation an error occurred.
///
/// Carried by I/O variants so a caller can render an actionable message
/// without re-deriving which file or offset was involved.
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    /// Path of the file being read or written, if known.
    pub path: Option<PathBuf>,
    /// Byte offset within the container, if the error is offset-specific.
    pub offset: Option<u64>,
}

impl OpContext {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl std::fmt::Display for OpContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.path, self.offset) {
            (Some(p), Some(o)) => write!(f, "{} (offset {o})", p.display()),
            (Some(p), None) => write!(f, "{}", p.display()),
            (None, Some(o)) => write!(f, "offset {o}"),
            (None, None) => write!(f, "<unknown>"),
        }
    }
}

/// Every distinct failure the cipher core, KDF, and container can surface.
///
/// Errors are never retried internally; every exit path that produces one
/// has already released its file handles, deleted any scratch file, and
/// zeroized sensitive buffers before returning.
#[derive(Error, Debug)]
pub enum CryptoCoreError {
    /// A required context or buffer argument was absent where the API
    /// contract requires one (mirrors a null-pointer check in a C API).
    #[error("required context/buffer argument was absent")]
    NullContext,

    /// A cipher operation was attempted before `SetKey`/`HashInit` ran.
    #[error("operation attempted on an uninitialized context")]
    NotInitialized,

    /// An out-of-range or otherwise malformed parameter was supplied.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A pointer/length combination makes no sense (e.g. null data with nonzero length).
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// The destination buffer cannot hold the defined output.
    #[error("destination buffer too small: need {needed}, have {available}")]
    BufferTooSmall {
        /// Bytes required.
        needed: usize,
        /// Bytes actually available.
        available: usize,
    },

    /// The RNG collaborator or another cryptographic backend failed.
    #[error("internal cryptographic failure: {0}")]
    InternalFailure(&'static str),

    /// The container does not start with the `AESC` signature.
    #[error("invalid container signature at {context}")]
    InvalidSignature {
        /// Where the bad header was read from.
        context: OpContext,
    },

    /// The container's key-length code is not one of {0x01, 0x02, 0x03}.
    #[error("unsupported key length code {code:#04x} at {context}")]
    UnsupportedKeyLength {
        /// The offending byte.
        code: u8,
        /// Where the bad header was read from.
        context: OpContext,
    },

    /// The header is too short or otherwise structurally malformed.
    #[error("invalid container header at {context}: {reason}")]
    InvalidHeader {
        /// Human-readable reason.
        reason: &'static str,
        /// Where the bad header was read from.
        context: OpContext,
    },

    /// The recomputed MAC did not match the one stored in the container.
    #[error("MAC verification failed at {context} - wrong passphrase or tampered file")]
    IntegrityFailure {
        /// Where the mismatch was detected.
        context: OpContext,
    },

    /// Failed to open a file for reading or writing.
    #[error("failed to open {context}: {source}")]
    FileOpen {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
        /// Where the open was attempted.
        context: OpContext,
    },

    /// Failed to read from a file.
    #[error("failed to read {context}: {source}")]
    FileRead {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
        /// Where the read was attempted.
        context: OpContext,
    },

    /// Failed to write to a file.
    #[error("failed to write {context}: {source}")]
    FileWrite {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
        /// Where the write was attempted.
        context: OpContext,
    },

    /// The file's size could not be determined or is invalid (e.g. shorter than the header).
    #[error("invalid file size at {context}: {reason}")]
    FileSize {
        /// Human-readable reason.
        reason: &'static str,
        /// Where the size check failed.
        context: OpContext,
    },

    /// The scratch sink used during decryption could not be created.
    #[error("failed to create scratch file: {source}")]
    TempFileCreate {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A required buffer allocation failed.
    #[error("memory allocation failed: {0}")]
    MemoryAllocation(&'static str),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, CryptoCoreError>;
