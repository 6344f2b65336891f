use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use crate::error::{Result, ZipError};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// General purpose flag bit 3: sizes and CRC were unknown at write time
/// and live in a trailing data descriptor instead of the local header.
pub const FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;

/// Catalog record for one extractable file in the archive.
///
/// Carries exactly the fields extraction needs; everything else in the
/// Central Directory Header is transient. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// File name as stored in the Central Directory.
    pub name: String,
    /// Absolute offset of the entry's Local File Header.
    pub offset: u32,
    /// Payload size as stored in the archive.
    pub compressed_size: u32,
    /// Payload size after decompression.
    pub uncompressed_size: u32,
    /// CRC-32 of the uncompressed data (stored, not verified).
    pub crc32: u32,
}

/// End of Central Directory (EOCD) - 22 bytes plus optional comment
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
    /// Archive comment; as much of it as the input slice carried.
    pub comment: Vec<u8>,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;
    /// Byte offset of `cd_offset` within the record.
    pub const CD_OFFSET_FIELD: usize = 16;
    /// Byte offset of `comment_len` within the record.
    pub const COMMENT_LEN_FIELD: usize = 20;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(ZipError::format("invalid end of central directory record"));
        }

        let mut cursor = Cursor::new(&data[4..]);

        let disk_number = cursor.read_u16::<LittleEndian>()?;
        let disk_with_cd = cursor.read_u16::<LittleEndian>()?;
        let disk_entries = cursor.read_u16::<LittleEndian>()?;
        let total_entries = cursor.read_u16::<LittleEndian>()?;
        let cd_size = cursor.read_u32::<LittleEndian>()?;
        let cd_offset = cursor.read_u32::<LittleEndian>()?;
        let comment_len = cursor.read_u16::<LittleEndian>()?;

        let comment = data
            .get(Self::SIZE..Self::SIZE + comment_len as usize)
            .map(<[u8]>::to_vec)
            .unwrap_or_default();

        Ok(Self {
            disk_number,
            disk_with_cd,
            disk_entries,
            total_entries,
            cd_size,
            cd_offset,
            comment_len,
            comment,
        })
    }
}

/// Central Directory File Header - 46 fixed bytes plus name/extra/comment
pub struct CentralDirectoryHeader {
    pub version_made_by: u16,
    pub version_to_extract: u16,
    pub gen_purpose_flag: u16,
    pub compression_method: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub disk_start: u16,
    pub internal_attrs: u16,
    pub external_attrs: u32,
    pub local_header_offset: u32,
    pub file_name: String,
}

impl CentralDirectoryHeader {
    pub const SIGNATURE: &'static [u8] = b"PK\x01\x02";

    /// Decode one header from a reader positioned at its signature,
    /// consuming the fixed fields and then the variable-length name,
    /// extra field and comment exactly.
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let mut sig = [0u8; 4];
        read_record(reader, &mut sig, "central directory header")?;
        if sig != Self::SIGNATURE {
            return Err(ZipError::format("invalid central directory header"));
        }

        let mut fixed = [0u8; 42];
        read_record(reader, &mut fixed, "central directory header")?;
        let mut cursor = Cursor::new(&fixed[..]);

        let version_made_by = cursor.read_u16::<LittleEndian>()?;
        let version_to_extract = cursor.read_u16::<LittleEndian>()?;
        let gen_purpose_flag = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let crc32 = cursor.read_u32::<LittleEndian>()?;
        let compressed_size = cursor.read_u32::<LittleEndian>()?;
        let uncompressed_size = cursor.read_u32::<LittleEndian>()?;
        let file_name_length = cursor.read_u16::<LittleEndian>()?;
        let extra_field_length = cursor.read_u16::<LittleEndian>()?;
        let file_comment_length = cursor.read_u16::<LittleEndian>()?;
        let disk_start = cursor.read_u16::<LittleEndian>()?;
        let internal_attrs = cursor.read_u16::<LittleEndian>()?;
        let external_attrs = cursor.read_u32::<LittleEndian>()?;
        let local_header_offset = cursor.read_u32::<LittleEndian>()?;

        let mut file_name_bytes = vec![0u8; file_name_length as usize];
        read_record(reader, &mut file_name_bytes, "central directory header")?;
        // Lossy conversion keeps non-UTF8 names usable
        let file_name = String::from_utf8_lossy(&file_name_bytes).to_string();

        // Extra field and comment are decoded away: nothing downstream
        // needs them for extraction.
        let mut skipped = vec![0u8; extra_field_length as usize + file_comment_length as usize];
        read_record(reader, &mut skipped, "central directory header")?;

        Ok(Self {
            version_made_by,
            version_to_extract,
            gen_purpose_flag,
            compression_method,
            last_mod_time,
            last_mod_date,
            crc32,
            compressed_size,
            uncompressed_size,
            disk_start,
            internal_attrs,
            external_attrs,
            local_header_offset,
            file_name,
        })
    }

    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }
}

/// Local File Header - 30 fixed bytes plus name/extra
///
/// Decoded lazily at extraction time: its name/extra lengths may
/// legitimately differ from the Central Directory copy, so the data
/// offset can only be computed from this record.
pub struct LocalFileHeader {
    pub version_to_extract: u16,
    pub gen_purpose_flag: u16,
    pub compression_method: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
}

impl LocalFileHeader {
    pub const SIGNATURE: &'static [u8] = b"PK\x03\x04";
    pub const SIZE: usize = 30;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(ZipError::format("invalid local file header"));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            version_to_extract: cursor.read_u16::<LittleEndian>()?,
            gen_purpose_flag: cursor.read_u16::<LittleEndian>()?,
            compression_method: cursor.read_u16::<LittleEndian>()?,
            last_mod_time: cursor.read_u16::<LittleEndian>()?,
            last_mod_date: cursor.read_u16::<LittleEndian>()?,
            crc32: cursor.read_u32::<LittleEndian>()?,
            compressed_size: cursor.read_u32::<LittleEndian>()?,
            uncompressed_size: cursor.read_u32::<LittleEndian>()?,
            file_name_length: cursor.read_u16::<LittleEndian>()?,
            extra_field_length: cursor.read_u16::<LittleEndian>()?,
        })
    }

    /// True when the sizes above are placeholders and the real values
    /// live in a trailing data descriptor (streaming writers).
    pub fn has_data_descriptor(&self) -> bool {
        self.gen_purpose_flag & FLAG_DATA_DESCRIPTOR != 0
    }

    pub fn method(&self) -> CompressionMethod {
        CompressionMethod::from_u16(self.compression_method)
    }
}

/// Data Descriptor - trails the payload when the streaming flag is set.
///
/// The leading signature is optional per the format; when the first
/// u32 equals it, the descriptor carries the signature and the CRC
/// follows, otherwise that first u32 already is the CRC.
pub struct DataDescriptor {
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
}

impl DataDescriptor {
    pub const SIGNATURE: u32 = 0x08074b50;

    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let first = reader
            .read_u32::<LittleEndian>()
            .map_err(|_| ZipError::format("truncated data descriptor"))?;
        let crc32 = if first == Self::SIGNATURE {
            reader
                .read_u32::<LittleEndian>()
                .map_err(|_| ZipError::format("truncated data descriptor"))?
        } else {
            first
        };

        let mut rest = [0u8; 8];
        read_record(reader, &mut rest, "data descriptor")?;
        let mut cursor = Cursor::new(&rest[..]);

        Ok(Self {
            crc32,
            compressed_size: cursor.read_u32::<LittleEndian>()?,
            uncompressed_size: cursor.read_u32::<LittleEndian>()?,
        })
    }
}

/// Fill `buf` from `reader`, turning stream exhaustion into a
/// [`ZipError::Format`] naming the record being decoded.
fn read_record<R: Read>(reader: &mut R, buf: &mut [u8], record: &str) -> Result<()> {
    reader
        .read_exact(buf)
        .map_err(|_| ZipError::format(format!("truncated {record}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_eocd() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(EndOfCentralDirectory::SIGNATURE);
        data.extend_from_slice(&0u16.to_le_bytes()); // disk_number
        data.extend_from_slice(&0u16.to_le_bytes()); // disk_with_cd
        data.extend_from_slice(&3u16.to_le_bytes()); // disk_entries
        data.extend_from_slice(&3u16.to_le_bytes()); // total_entries
        data.extend_from_slice(&146u32.to_le_bytes()); // cd_size
        data.extend_from_slice(&1024u32.to_le_bytes()); // cd_offset
        data.extend_from_slice(&0u16.to_le_bytes()); // comment_len
        data
    }

    #[test]
    fn eocd_from_bytes() {
        let eocd = EndOfCentralDirectory::from_bytes(&sample_eocd()).unwrap();
        assert_eq!(eocd.total_entries, 3);
        assert_eq!(eocd.cd_size, 146);
        assert_eq!(eocd.cd_offset, 1024);
        assert_eq!(eocd.comment_len, 0);
    }

    #[test]
    fn eocd_rejects_bad_signature() {
        let mut data = sample_eocd();
        data[0] = b'Q';
        assert!(matches!(
            EndOfCentralDirectory::from_bytes(&data),
            Err(ZipError::Format(_))
        ));
    }

    #[test]
    fn eocd_rejects_truncation() {
        let data = sample_eocd();
        assert!(matches!(
            EndOfCentralDirectory::from_bytes(&data[..10]),
            Err(ZipError::Format(_))
        ));
    }

    #[test]
    fn local_header_rejects_truncation() {
        let mut data = Vec::new();
        data.extend_from_slice(LocalFileHeader::SIGNATURE);
        data.extend_from_slice(&[0u8; 10]);
        assert!(matches!(
            LocalFileHeader::from_bytes(&data),
            Err(ZipError::Format(_))
        ));
    }

    #[test]
    fn central_header_rejects_truncation() {
        let mut data = Vec::new();
        data.extend_from_slice(CentralDirectoryHeader::SIGNATURE);
        data.extend_from_slice(&[0u8; 20]);
        let mut cursor = Cursor::new(data.as_slice());
        assert!(matches!(
            CentralDirectoryHeader::parse(&mut cursor),
            Err(ZipError::Format(_))
        ));
    }

    #[test]
    fn data_descriptor_without_signature() {
        let mut data = Vec::new();
        data.extend_from_slice(&0xDEADBEEFu32.to_le_bytes());
        data.extend_from_slice(&100u32.to_le_bytes());
        data.extend_from_slice(&200u32.to_le_bytes());
        let mut cursor = Cursor::new(data.as_slice());
        let desc = DataDescriptor::parse(&mut cursor).unwrap();
        assert_eq!(desc.crc32, 0xDEADBEEF);
        assert_eq!(desc.compressed_size, 100);
        assert_eq!(desc.uncompressed_size, 200);
    }

    #[test]
    fn data_descriptor_with_signature() {
        let mut data = Vec::new();
        data.extend_from_slice(&DataDescriptor::SIGNATURE.to_le_bytes());
        data.extend_from_slice(&0xDEADBEEFu32.to_le_bytes());
        data.extend_from_slice(&100u32.to_le_bytes());
        data.extend_from_slice(&200u32.to_le_bytes());
        let mut cursor = Cursor::new(data.as_slice());
        let desc = DataDescriptor::parse(&mut cursor).unwrap();
        assert_eq!(desc.crc32, 0xDEADBEEF);
        assert_eq!(desc.compressed_size, 100);
        assert_eq!(desc.uncompressed_size, 200);
    }

    #[test]
    fn compression_method_round_trip() {
        assert_eq!(CompressionMethod::from_u16(0), CompressionMethod::Stored);
        assert_eq!(CompressionMethod::from_u16(8), CompressionMethod::Deflate);
        assert_eq!(
            CompressionMethod::from_u16(12),
            CompressionMethod::Unknown(12)
        );
        assert_eq!(CompressionMethod::Unknown(12).as_u16(), 12);
    }

    #[test]
    fn dos_timestamp_decode() {
        let header = CentralDirectoryHeader {
            version_made_by: 0,
            version_to_extract: 20,
            gen_purpose_flag: 0,
            compression_method: 8,
            // 2024-06-15 12:30:10
            last_mod_time: (12 << 11) | (30 << 5) | 5,
            last_mod_date: ((2024 - 1980) << 9) | (6 << 5) | 15,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            disk_start: 0,
            internal_attrs: 0,
            external_attrs: 0,
            local_header_offset: 0,
            file_name: String::new(),
        };
        assert_eq!(header.mod_date(), (2024, 6, 15));
        assert_eq!(header.mod_time(), (12, 30, 10));
    }
}
