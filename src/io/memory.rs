use std::io::{self, Cursor, Read, Seek, SeekFrom};

use super::ByteSource;

/// Memory-backed byte source over an owned buffer.
///
/// Useful for archives that already live in memory (embedded assets,
/// network downloads) and as the substrate for tests.
pub struct MemorySource {
    cursor: Cursor<Vec<u8>>,
}

impl MemorySource {
    /// Wrap an owned byte buffer. The cursor starts at position 0.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// Recover the underlying buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.cursor.into_inner()
    }
}

impl From<Vec<u8>> for MemorySource {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl ByteSource for MemorySource {
    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.cursor.read_exact(buf)
    }

    fn seek(&mut self, pos: u64) -> io::Result<()> {
        self.cursor.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    fn tell(&mut self) -> io::Result<u64> {
        Ok(self.cursor.position())
    }

    fn size(&mut self) -> io::Result<u64> {
        Ok(self.cursor.get_ref().len() as u64)
    }
}
