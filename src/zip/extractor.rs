use crate::codec;
use crate::error::{Result, ZipError};
use crate::io::ByteSource;

use super::parser::ZipParser;
use super::structures::{ArchiveEntry, CompressionMethod, LocalFileHeader};

/// High-level entry extraction over a [`ZipParser`].
///
/// Extraction is a pure function of (entry, source): the source cursor
/// is saved on entry and restored on every exit path, so extractions
/// can be interleaved freely on the same handle and a failed entry
/// never affects its siblings or the catalog.
pub struct ZipExtractor<S: ByteSource> {
    parser: ZipParser<S>,
}

impl<S: ByteSource> ZipExtractor<S> {
    pub fn new(source: S) -> Result<Self> {
        Ok(Self {
            parser: ZipParser::new(source)?,
        })
    }

    /// Build the catalog of extractable entries.
    pub fn read_directory(&mut self) -> Result<Vec<ArchiveEntry>> {
        self.parser.read_directory()
    }

    /// Extract one entry's payload into memory.
    ///
    /// Seeks to the entry's Local File Header, reads the authoritative
    /// compression method and sizes from it, and decompresses the
    /// payload. When the header's streaming flag (bit 3) is set its
    /// size fields are placeholders, so the Central Directory sizes
    /// already carried by `entry` are used instead.
    ///
    /// # Errors
    ///
    /// [`ZipError::UnsupportedCompression`] for any method other than
    /// stored or deflate; [`ZipError::Format`]/[`ZipError::Codec`] for
    /// malformed headers or payload. All errors leave the source cursor
    /// where it was before the call.
    pub fn extract_to_memory(&mut self, entry: &ArchiveEntry) -> Result<Vec<u8>> {
        let saved = self.parser.tell()?;
        let result = self.extract_at_header(entry);
        self.parser.seek(saved)?;
        result
    }

    fn extract_at_header(&mut self, entry: &ArchiveEntry) -> Result<Vec<u8>> {
        let header = self.parser.read_local_header(entry)?;
        let (compressed_size, uncompressed_size) = payload_sizes(&header, entry);

        match header.method() {
            CompressionMethod::Stored => self.parser.read_payload(uncompressed_size as usize),
            CompressionMethod::Deflate => {
                let compressed = self.parser.read_payload(compressed_size as usize)?;
                codec::decompress_known_size(&compressed, uncompressed_size as usize)
                    .map_err(ZipError::from)
            }
            CompressionMethod::Unknown(method) => Err(ZipError::UnsupportedCompression(method)),
        }
    }

    /// Access the underlying parser.
    pub fn parser_mut(&mut self) -> &mut ZipParser<S> {
        &mut self.parser
    }

    /// Give the source back to the caller.
    pub fn into_inner(self) -> S {
        self.parser.into_inner()
    }
}

/// Pick the authoritative payload sizes for an entry.
///
/// Streamed archives (flag bit 3) write zeros into the Local File
/// Header and defer the real sizes to a data descriptor; the Central
/// Directory copy in `entry` is correct in that case.
fn payload_sizes(header: &LocalFileHeader, entry: &ArchiveEntry) -> (u32, u32) {
    if header.has_data_descriptor() {
        (entry.compressed_size, entry.uncompressed_size)
    } else {
        (header.compressed_size, header.uncompressed_size)
    }
}
