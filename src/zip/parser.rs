//! Low-level ZIP archive parser.
//!
//! This module handles the binary parsing of ZIP file structures,
//! reading from any source that implements the [`ByteSource`] trait.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. Read the Central Directory to get metadata for all files
//! 3. For extraction, read each file's Local File Header and data
//!
//! All multi-byte integers are little-endian. That is the archive
//! format's fixed external contract, independent of host byte order.

use std::io::Cursor;

use crate::error::{Result, ZipError};
use crate::io::ByteSource;

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// Low-level ZIP file parser.
///
/// Owns the byte source and drives all positioned reads against it.
/// Methods take `&mut self` because the source cursor is the one piece
/// of mutable state; this also statically rules out interleaved reads
/// from two threads on the same handle.
///
/// ## Usage
///
/// Typically used through [`ZipExtractor`](super::ZipExtractor)
/// rather than directly.
pub struct ZipParser<S: ByteSource> {
    /// The underlying data source
    source: S,
    /// Total size of the archive in bytes
    size: u64,
}

impl<S: ByteSource> ZipParser<S> {
    /// Create a new parser for the given source.
    ///
    /// The source size is captured once here; the archive is assumed
    /// not to change underneath the parser.
    pub fn new(mut source: S) -> Result<Self> {
        let size = source.size()?;
        Ok(Self { source, size })
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// The EOCD sits at the end of the archive but may be followed by a
    /// comment of up to 65535 bytes, so its position is not fixed. The
    /// trailing `min(65535 + 22, file_size)` bytes are read into a
    /// buffer and scanned backward from `file_size - 22`. A candidate
    /// position is accepted only when all three checks hold:
    ///
    /// 1. The 4-byte signature matches `PK\x05\x06`.
    /// 2. The `cd_offset` field at +16 points at a valid Central
    ///    Directory Header signature in the stream.
    /// 3. The candidate plus its declared comment ends exactly at
    ///    end-of-file.
    ///
    /// The triple check guards against `PK\x05\x06` occurring inside a
    /// comment or file name. Scanning returns on the first match, so
    /// the EOCD closest to end-of-file wins, which is the only valid
    /// reading for a well-formed archive.
    ///
    /// # Returns
    ///
    /// A tuple of (EOCD record, offset of EOCD in the archive).
    ///
    /// # Errors
    ///
    /// [`ZipError::Format`] if no position passes all three checks,
    /// meaning the source is not a valid ZIP archive.
    pub fn find_eocd(&mut self) -> Result<(EndOfCentralDirectory, u64)> {
        const EOCD_SIZE: usize = EndOfCentralDirectory::SIZE;

        if self.size < EOCD_SIZE as u64 {
            return Err(ZipError::format("end of central directory record not found"));
        }

        let tail_len = (MAX_COMMENT_SIZE + EOCD_SIZE as u64).min(self.size) as usize;
        let tail_start = self.size - tail_len as u64;

        let mut tail = vec![0u8; tail_len];
        self.source.seek(tail_start)?;
        self.source
            .read_exact(&mut tail)
            .map_err(|_| ZipError::format("truncated archive tail"))?;

        // Scan backwards for the EOCD signature (PK\x05\x06)
        for i in (0..=tail_len - EOCD_SIZE).rev() {
            if &tail[i..i + 4] != EndOfCentralDirectory::SIGNATURE {
                continue;
            }

            // Check 2: the cd_offset field must point at a Central
            // Directory Header in the live stream.
            let o = i + EndOfCentralDirectory::CD_OFFSET_FIELD;
            let cd_offset = u32::from_le_bytes([tail[o], tail[o + 1], tail[o + 2], tail[o + 3]]);
            if !self.probe_central_directory(cd_offset)? {
                continue;
            }

            // Check 3: the declared comment must reach exactly
            // end-of-file.
            let c = i + EndOfCentralDirectory::COMMENT_LEN_FIELD;
            let comment_len = u16::from_le_bytes([tail[c], tail[c + 1]]) as usize;
            if i + EOCD_SIZE + comment_len != tail_len {
                continue;
            }

            let eocd = EndOfCentralDirectory::from_bytes(&tail[i..])?;
            return Ok((eocd, tail_start + i as u64));
        }

        Err(ZipError::format("end of central directory record not found"))
    }

    /// Check whether `cd_offset` points at a Central Directory Header
    /// signature. An offset outside the archive is a failed probe, not
    /// an error: the candidate was a false signature.
    fn probe_central_directory(&mut self, cd_offset: u32) -> Result<bool> {
        if cd_offset as u64 + 4 > self.size {
            return Ok(false);
        }
        let mut sig = [0u8; 4];
        self.source.seek(cd_offset as u64)?;
        self.source.read_exact(&mut sig)?;
        Ok(sig == CentralDirectoryHeader::SIGNATURE)
    }

    /// Build the archive catalog from the Central Directory.
    ///
    /// Finds the EOCD, seeks to the Central Directory and parses
    /// exactly `total_entries` headers in order, validating the
    /// signature on every record. Entries with `uncompressed_size == 0`
    /// are skipped: directory markers and empty files carry no payload
    /// to extract.
    ///
    /// # Returns
    ///
    /// One [`ArchiveEntry`] per extractable file, preserving Central
    /// Directory order.
    ///
    /// # Errors
    ///
    /// [`ZipError::Format`] on a missing EOCD, a multi-disk archive or
    /// a malformed Central Directory. A corrupt record aborts the whole
    /// catalog, since offsets after it cannot be trusted.
    pub fn read_directory(&mut self) -> Result<Vec<ArchiveEntry>> {
        let (eocd, _) = self.find_eocd()?;

        if eocd.disk_number != 0 || eocd.disk_with_cd != 0 {
            return Err(ZipError::format("multi-disk archives are not supported"));
        }

        // Read the whole Central Directory in one pass, then decode
        // records out of the buffer.
        let mut cd_data = vec![0u8; eocd.cd_size as usize];
        self.source.seek(eocd.cd_offset as u64)?;
        self.source
            .read_exact(&mut cd_data)
            .map_err(|_| ZipError::format("truncated central directory"))?;

        let mut cursor = Cursor::new(cd_data.as_slice());
        let mut entries = Vec::with_capacity(eocd.total_entries as usize);

        for _ in 0..eocd.total_entries {
            let header = CentralDirectoryHeader::parse(&mut cursor)?;
            if header.uncompressed_size == 0 {
                continue;
            }
            entries.push(ArchiveEntry {
                name: header.file_name,
                offset: header.local_header_offset,
                compressed_size: header.compressed_size,
                uncompressed_size: header.uncompressed_size,
                crc32: header.crc32,
            });
        }

        Ok(entries)
    }

    /// Read an entry's Local File Header and position the cursor at the
    /// first payload byte.
    ///
    /// The LFH's name/extra lengths may legitimately differ from the
    /// Central Directory copy, so the payload offset can only be
    /// computed here, at extraction time.
    pub(crate) fn read_local_header(&mut self, entry: &ArchiveEntry) -> Result<LocalFileHeader> {
        let mut buf = [0u8; LocalFileHeader::SIZE];
        self.source.seek(entry.offset as u64)?;
        self.source
            .read_exact(&mut buf)
            .map_err(|_| ZipError::format("truncated local file header"))?;

        let header = LocalFileHeader::from_bytes(&buf)?;

        let data_offset = entry.offset as u64
            + LocalFileHeader::SIZE as u64
            + header.file_name_length as u64
            + header.extra_field_length as u64;
        self.source.seek(data_offset)?;

        Ok(header)
    }

    /// Read the data descriptor trailing an entry's payload.
    ///
    /// Only meaningful for entries written by streaming writers (flag
    /// bit 3); the cursor must sit just past the payload.
    pub fn read_data_descriptor(&mut self) -> Result<DataDescriptor> {
        // Descriptor is at most 16 bytes; over-reading past EOF is a
        // format error anyway.
        let mut buf = [0u8; 16];
        let pos = self.source.tell()?;
        let available = self.size.saturating_sub(pos).min(16) as usize;
        if available < 12 {
            return Err(ZipError::format("truncated data descriptor"));
        }
        self.source.read_exact(&mut buf[..available])?;
        let mut cursor = Cursor::new(&buf[..available]);
        DataDescriptor::parse(&mut cursor)
    }

    /// Read `len` payload bytes from the current cursor position.
    pub(crate) fn read_payload(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.source
            .read_exact(&mut buf)
            .map_err(|_| ZipError::format("truncated entry payload"))?;
        Ok(buf)
    }

    /// Current cursor position of the underlying source.
    pub fn tell(&mut self) -> Result<u64> {
        Ok(self.source.tell()?)
    }

    /// Reposition the underlying source.
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        Ok(self.source.seek(pos)?)
    }

    /// Give the source back to the caller.
    pub fn into_inner(self) -> S {
        self.source
    }
}
