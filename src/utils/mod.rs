//! Utility functions for chunk checksums and the PNG signature

use crc32fast::Hasher;

/// The fixed 8-byte PNG file signature
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// CRC32 of a chunk: covers the type bytes followed by the payload, never the length
pub fn chunk_crc32(chunk_type: [u8; 4], payload: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&chunk_type);
    hasher.update(payload);
    hasher.finalize()
}

/// Validate PNG signature
pub fn is_png_signature(data: &[u8]) -> bool {
    data.len() >= 8 && data[0..8] == PNG_SIGNATURE
}
