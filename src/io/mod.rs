mod file;
mod memory;

pub use file::FileSource;
pub use memory::MemorySource;

use std::io;

/// Trait for seekable random-access reading from a data source.
///
/// This is the collaborator interface the archive code consumes: a
/// byte-addressable stream with an explicit cursor. Implementations are
/// synchronous and may block on I/O. A single source must not be shared
/// across threads without external synchronization, because the cursor
/// is the one piece of shared mutable state.
pub trait ByteSource {
    /// Fill `buf` completely from the current cursor position.
    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()>;

    /// Move the cursor to an absolute byte position.
    fn seek(&mut self, pos: u64) -> io::Result<()>;

    /// Current cursor position.
    fn tell(&mut self) -> io::Result<u64>;

    /// Total size of the data source in bytes.
    fn size(&mut self) -> io::Result<u64>;
}
