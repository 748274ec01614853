//! Decompression utilities for pak blocks.

use std::io::Read;

use flate2::read::{GzDecoder, ZlibDecoder};

use crate::{Error, Result};

/// Decompress a zlib stream. Bytes after the end of the stream are ignored.
pub fn decompress_zlib(data: &[u8], output: &mut Vec<u8>) -> Result<()> {
    ZlibDecoder::new(data)
        .read_to_end(output)
        .map_err(|e| Error::Decompression(format!("zlib: {}", e)))?;
    Ok(())
}

/// Decompress a single gzip member.
pub fn decompress_gzip(data: &[u8], output: &mut Vec<u8>) -> Result<()> {
    GzDecoder::new(data)
        .read_to_end(output)
        .map_err(|e| Error::Decompression(format!("gzip: {}", e)))?;
    Ok(())
}

/// Decompress one Zstandard frame.
///
/// Decrypted blocks carry alignment padding after the frame, so decoding
/// stops at the end of the first frame.
pub fn decompress_zstd(data: &[u8], output: &mut Vec<u8>) -> Result<()> {
    let decoder = zstd::Decoder::new(data)
        .map_err(|e| Error::Decompression(format!("zstd: {}", e)))?;
    decoder
        .single_frame()
        .read_to_end(output)
        .map_err(|e| Error::Decompression(format!("zstd: {}", e)))?;
    Ok(())
}
