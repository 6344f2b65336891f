//! Error types for archive parsing and the DEFLATE codec.
//!
//! The taxonomy separates three failure classes:
//!
//! - [`ZipError::Format`]: the archive structure itself is malformed
//!   (bad signature, missing EOCD, truncated record). The archive is
//!   unusable and the error is surfaced immediately.
//! - [`ZipError::UnsupportedCompression`]: the archive is valid but one
//!   entry uses a compression method other than STORED or DEFLATE. This
//!   is scoped to the entry; other entries remain extractable.
//! - [`ZipError::Codec`]: the DEFLATE layer failed. [`CodecError`]
//!   distinguishes corrupt input, allocation failure inside the
//!   compression library, a declared-size mismatch, and input that ends
//!   before the deflate stream does.
//!
//! All failures are deterministic functions of the input bytes, so
//! nothing in this crate retries.

use std::io;
use thiserror::Error;

/// Generic result type with [`ZipError`] as its error variant.
pub type Result<T> = std::result::Result<T, ZipError>;

/// Top-level error for archive operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ZipError {
    /// Malformed or unrecognized archive structure.
    #[error("invalid ZIP archive: {0}")]
    Format(String),

    /// Valid archive, but an entry uses a compression method this
    /// crate does not handle (anything but 0 = stored, 8 = deflate).
    #[error("unsupported compression method: {0}")]
    UnsupportedCompression(u16),

    /// Failure inside the DEFLATE codec.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The underlying byte source failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Errors from the DEFLATE compression/decompression layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// The compressed stream is not valid deflate data.
    #[error("corrupt deflate stream: {0}")]
    CorruptData(String),

    /// The compression library could not allocate its internal state.
    #[error("compression library out of memory")]
    OutOfMemory,

    /// The declared uncompressed size does not match the actual stream.
    #[error("output buffer too small: declared {declared} bytes, stream holds more")]
    BufferTooSmall {
        /// Size the caller declared and pre-allocated.
        declared: usize,
    },

    /// Input was exhausted before the deflate stream signaled its end.
    #[error("deflate stream ended prematurely")]
    IncompleteStream,
}

impl ZipError {
    /// Shorthand for a [`ZipError::Format`] with a message.
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        ZipError::Format(msg.into())
    }
}
