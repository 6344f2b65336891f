//! Raw DEFLATE compression and decompression.
//!
//! ZIP entries store raw deflate streams with no zlib or gzip wrapper,
//! so every function here runs flate2 in raw mode.
//!
//! Two decompression entry points coexist on purpose:
//!
//! - [`decompress`] is the general chunked path for callers that do not
//!   know the output size in advance. It grows its output buffer and
//!   fails with [`CodecError::IncompleteStream`] when the input ends
//!   before the deflate stream does.
//! - [`decompress_known_size`] is the extraction fast path. Entry
//!   headers already declare the exact uncompressed size, so it
//!   pre-allocates the whole output buffer and performs a single
//!   bounded inflate call, failing with [`CodecError::BufferTooSmall`]
//!   when the declared size turns out to be wrong.
//!
//! The compressor/decompressor state objects are plain values dropped
//! at the end of each call, on error paths included, so no scratch
//! state survives between calls.

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use crate::error::CodecError;

/// Bound on how much input is fed and how much output space is offered
/// to the underlying stream per iteration (16 KiB).
const CHUNK_SIZE: usize = 16 * 1024;

fn classify_compress(err: &flate2::CompressError) -> CodecError {
    let msg = err.to_string();
    if msg.contains("memory") {
        CodecError::OutOfMemory
    } else {
        CodecError::CorruptData(msg)
    }
}

fn classify_decompress(err: &flate2::DecompressError) -> CodecError {
    let msg = err.to_string();
    if msg.contains("memory") {
        CodecError::OutOfMemory
    } else {
        CodecError::CorruptData(msg)
    }
}

/// Compress a whole buffer into a raw deflate stream at the default
/// compression level.
///
/// Input is fed in bounded chunks and output drained in bounded chunks
/// until the compressor signals stream end; a single pass cannot assume
/// all output fits in one buffer.
pub fn compress(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = Compress::new(Compression::default(), false);
    let mut out = Vec::with_capacity(CHUNK_SIZE);

    loop {
        let consumed = encoder.total_in() as usize;
        let end = usize::min(consumed + CHUNK_SIZE, data.len());
        let flush = if end == data.len() {
            FlushCompress::Finish
        } else {
            FlushCompress::None
        };

        if out.len() == out.capacity() {
            out.reserve(CHUNK_SIZE);
        }

        let status = encoder
            .compress_vec(&data[consumed..end], &mut out, flush)
            .map_err(|e| classify_compress(&e))?;

        match status {
            Status::StreamEnd => return Ok(out),
            Status::Ok | Status::BufError => {}
        }
    }
}

/// Decompress a raw deflate stream of unknown output size.
///
/// The inverse of [`compress`]: feeds bounded input chunks and drains
/// bounded output chunks until the decompressor signals stream end.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut decoder = Decompress::new(false);
    let mut out = Vec::with_capacity(CHUNK_SIZE);

    loop {
        let consumed = decoder.total_in() as usize;
        let end = usize::min(consumed + CHUNK_SIZE, data.len());

        if out.len() == out.capacity() {
            out.reserve(CHUNK_SIZE);
        }

        let produced_before = decoder.total_out();
        let status = decoder
            .decompress_vec(&data[consumed..end], &mut out, FlushDecompress::None)
            .map_err(|e| classify_decompress(&e))?;

        match status {
            Status::StreamEnd => return Ok(out),
            Status::Ok | Status::BufError => {
                // Input exhausted and no forward progress means the
                // stream-end marker never arrived.
                if decoder.total_in() as usize == data.len()
                    && decoder.total_out() == produced_before
                {
                    return Err(CodecError::IncompleteStream);
                }
            }
        }
    }
}

/// Decompress a raw deflate stream whose exact output size is already
/// known from the entry headers.
///
/// Pre-allocates `uncompressed_size` bytes and inflates in a single
/// bounded call. Any disagreement between the declared size and the
/// actual stream fails with [`CodecError::BufferTooSmall`].
pub fn decompress_known_size(
    data: &[u8],
    uncompressed_size: usize,
) -> Result<Vec<u8>, CodecError> {
    let mut decoder = Decompress::new(false);
    let mut out = vec![0u8; uncompressed_size];

    let status = decoder
        .decompress(data, &mut out, FlushDecompress::Finish)
        .map_err(|e| classify_decompress(&e))?;

    match status {
        Status::StreamEnd if decoder.total_out() as usize == uncompressed_size => Ok(out),
        // Stream ended but produced fewer bytes than declared.
        Status::StreamEnd => Err(CodecError::BufferTooSmall {
            declared: uncompressed_size,
        }),
        Status::Ok | Status::BufError => {
            if decoder.total_out() as usize == uncompressed_size {
                // Output filled before the stream ended: the declared
                // size undershot the actual data.
                Err(CodecError::BufferTooSmall {
                    declared: uncompressed_size,
                })
            } else {
                Err(CodecError::IncompleteStream)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic pseudo-random filler for large round-trip buffers.
    fn junk(len: usize) -> Vec<u8> {
        let mut state = 2_051_920u32;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state as u8
            })
            .collect()
    }

    #[test]
    fn round_trip_chunk_boundaries() {
        for len in [0usize, 1, CHUNK_SIZE, CHUNK_SIZE + 1, CHUNK_SIZE * 128 + 1] {
            let data = junk(len);
            let deflated = compress(&data).unwrap();
            let inflated = decompress(&deflated).unwrap();
            assert_eq!(inflated, data, "round trip failed for len {len}");
        }
    }

    #[test]
    fn round_trip_text() {
        let data = b"this is a test".to_vec();
        let deflated = compress(&data).unwrap();
        let inflated = decompress(&deflated).unwrap();
        assert_eq!(inflated, data);
    }

    #[test]
    fn known_size_round_trip() {
        let data = junk(4096);
        let deflated = compress(&data).unwrap();
        let inflated = decompress_known_size(&deflated, data.len()).unwrap();
        assert_eq!(inflated, data);
    }

    #[test]
    fn known_size_declared_too_small() {
        let data = junk(4096);
        let deflated = compress(&data).unwrap();
        let err = decompress_known_size(&deflated, 100).unwrap_err();
        assert!(matches!(err, CodecError::BufferTooSmall { declared: 100 }));
    }

    #[test]
    fn known_size_declared_too_large() {
        let data = junk(512);
        let deflated = compress(&data).unwrap();
        let err = decompress_known_size(&deflated, 4096).unwrap_err();
        assert!(matches!(err, CodecError::BufferTooSmall { declared: 4096 }));
    }

    #[test]
    fn truncated_stream_is_incomplete() {
        let data = junk(CHUNK_SIZE * 4);
        let deflated = compress(&data).unwrap();
        let err = decompress(&deflated[..deflated.len() / 2]).unwrap_err();
        assert!(matches!(err, CodecError::IncompleteStream));
    }

    #[test]
    fn empty_input_is_incomplete() {
        let err = decompress(&[]).unwrap_err();
        assert!(matches!(err, CodecError::IncompleteStream));
    }

    #[test]
    fn garbage_input_is_corrupt() {
        // 0xff blocks decode as an invalid stored-block length almost
        // immediately.
        let err = decompress(&[0xff; 64]).unwrap_err();
        assert!(matches!(err, CodecError::CorruptData(_)));
    }
}
