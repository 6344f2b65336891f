//! # dezip
//!
//! ZIP archive reading and raw DEFLATE compression over seekable byte
//! sources.
//!
//! This library reads the container format only: it locates the End of
//! Central Directory record, walks the Central Directory into a catalog
//! of [`ArchiveEntry`] values, and extracts individual entries by
//! seeking to their Local File Header and inflating the payload. Raw
//! DEFLATE compression and decompression are also exposed directly for
//! standalone use.
//!
//! Everything is synchronous and single-threaded; the only shared
//! mutable state is the cursor of the byte source, which every
//! operation restores before returning.
//!
//! ## Example
//!
//! ```no_run
//! use dezip::{FileSource, ZipExtractor};
//!
//! fn main() -> dezip::Result<()> {
//!     let source = FileSource::open("archive.zip")?;
//!     let mut extractor = ZipExtractor::new(source)?;
//!
//!     for entry in extractor.read_directory()? {
//!         let data = extractor.extract_to_memory(&entry)?;
//!         println!("{}: {} bytes", entry.name, data.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod error;
pub mod io;
pub mod zip;

pub use codec::{compress, decompress, decompress_known_size};
pub use error::{CodecError, Result, ZipError};
pub use io::{ByteSource, FileSource, MemorySource};
pub use zip::{ArchiveEntry, CompressionMethod, ZipExtractor, ZipParser};
