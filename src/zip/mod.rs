//! ZIP archive parsing and extraction.
//!
//! This module provides functionality for reading and extracting ZIP
//! archives from any seekable byte source.
//!
//! ## Architecture
//!
//! The module is organized into three main components:
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`parser`]: Low-level parsing of ZIP structures from raw bytes
//! - [`extractor`]: High-level extraction API for end users
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! This implementation reads the EOCD first (from the end of the file),
//! then the Central Directory, which allows listing files without
//! reading the entire archive.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - STORED (no compression) method
//! - DEFLATE compression method
//! - Archives with trailing comments, including comments containing
//!   spurious EOCD signature bytes
//! - Entries written by streaming writers (trailing data descriptors)
//!
//! ## Limitations
//!
//! - No ZIP64 support (archives over 4 GiB or 65535 entries)
//! - No encryption support
//! - No CRC-32 verification (checksums are stored, not checked)
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod extractor;
mod parser;
mod structures;

pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;
