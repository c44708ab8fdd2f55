//! Streaming PNG chunk indexing
//!
//! The indexer walks the chunk stream once, verifying every CRC as it goes,
//! but keeps only chunk metadata. Payload bytes are hashed through a fixed
//! buffer and dropped.

use std::io::{self, Read, Seek};
use byteorder::{BigEndian, ReadBytesExt};
use crc32fast::Hasher;
use tracing::{debug, warn};
use crate::png::chunk::{ChunkRecord, ChunkType};
use crate::utils::is_png_signature;
use crate::{StegoError, StegoResult};

const HASH_BUF_CAP: usize = 32 * 1024;

/// Read and check the 8-byte signature, returning it as a big-endian value
pub fn read_signature<R: Read>(reader: &mut R) -> StegoResult<u64> {
    let mut signature = [0u8; 8];
    reader.read_exact(&mut signature).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => {
            StegoError::Format("file too short for PNG signature".to_string())
        }
        _ => StegoError::Io(e),
    })?;

    if !is_png_signature(&signature) {
        return Err(StegoError::Format("bad signature: the file is not a PNG file".to_string()));
    }
    Ok(u64::from_be_bytes(signature))
}

/// Index every chunk from the current position up to and including `IEND`
pub fn index_chunks<R: Read + Seek>(reader: &mut R) -> StegoResult<Vec<ChunkRecord>> {
    let mut chunks = Vec::new();

    loop {
        let record = match read_record(reader)? {
            Some(record) => record,
            None if chunks.is_empty() => {
                return Err(StegoError::Format("no chunks after signature".to_string()));
            }
            None => {
                return Err(StegoError::Format("missing IEND chunk".to_string()));
            }
        };

        if chunks.is_empty() && !record.is_type(ChunkType::Ihdr) {
            return Err(StegoError::Format(format!(
                "bad chunk: expected IHDR, found {}",
                record.chunk_type
            )));
        }

        debug!(
            chunk = %record.chunk_type,
            length = record.length,
            offset = record.data_offset,
            "indexed chunk"
        );
        chunks.push(record);

        // IEND indicates end of PNG chunks
        if record.is_type(ChunkType::Iend) {
            break;
        }
    }

    let mut probe = [0u8; 1];
    if reader.read(&mut probe)? > 0 {
        warn!("ignoring trailing data after IEND chunk");
    }

    Ok(chunks)
}

/// Read one chunk, verifying its CRC without keeping the payload.
///
/// Returns `None` when the stream ends cleanly before a new chunk starts.
fn read_record<R: Read + Seek>(reader: &mut R) -> StegoResult<Option<ChunkRecord>> {
    let chunk_start = reader.stream_position()?;

    let mut length_bytes = [0u8; 4];
    let filled = read_full(reader, &mut length_bytes)?;
    if filled == 0 {
        return Ok(None);
    }
    if filled < length_bytes.len() {
        return Err(StegoError::Truncated { field: "chunk length", offset: chunk_start });
    }
    let length = u32::from_be_bytes(length_bytes);

    let mut tag = [0u8; 4];
    reader
        .read_exact(&mut tag)
        .map_err(|e| truncated(e, "chunk type", chunk_start + 4))?;
    let chunk_type = ChunkType::from_bytes(tag);

    let data_offset = reader.stream_position()?;

    let mut hasher = Hasher::new();
    hasher.update(&tag);
    hash_payload(reader, length, &mut hasher)
        .map_err(|e| truncated(e, "chunk data", data_offset))?;

    let crc = reader
        .read_u32::<BigEndian>()
        .map_err(|e| truncated(e, "chunk CRC", data_offset + u64::from(length)))?;
    StegoError::check_chunk_crc(chunk_type, crc, hasher.finalize())?;

    Ok(Some(ChunkRecord {
        length,
        chunk_type,
        data_offset,
        crc,
    }))
}

/// Feed exactly `length` payload bytes into `hasher`
fn hash_payload<R: Read>(reader: &mut R, length: u32, hasher: &mut Hasher) -> io::Result<()> {
    let mut buf = vec![0u8; (length as usize).min(HASH_BUF_CAP)];
    let mut remaining = length as usize;

    while remaining > 0 {
        let cap = remaining.min(buf.len());
        reader.read_exact(&mut buf[..cap])?;
        hasher.update(&buf[..cap]);
        remaining -= cap;
    }
    Ok(())
}

/// Like `read_exact`, but reports how many bytes were filled before EOF
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn truncated(e: io::Error, field: &'static str, offset: u64) -> StegoError {
    match e.kind() {
        io::ErrorKind::UnexpectedEof => StegoError::Truncated { field, offset },
        _ => StegoError::Io(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use proptest::prelude::*;
    use crate::utils::fixtures::{build_png, create_test_png, IHDR_1X1_RGB};

    fn index(data: Vec<u8>) -> StegoResult<Vec<ChunkRecord>> {
        let mut cursor = Cursor::new(data);
        read_signature(&mut cursor)?;
        index_chunks(&mut cursor)
    }

    #[test]
    fn test_parse_empty_png() {
        let result = read_signature(&mut Cursor::new(vec![0u8, 1, 2]));
        assert!(matches!(result, Err(StegoError::Format(_))));
    }

    #[test]
    fn test_invalid_signature() {
        let mut png = create_test_png();
        png[1] = b'Q';
        let mut cursor = Cursor::new(png);
        let result = read_signature(&mut cursor);
        assert!(matches!(result, Err(StegoError::Format(_))));
    }

    #[test]
    fn test_signature_value_and_cursor() {
        let mut cursor = Cursor::new(create_test_png());
        let header = read_signature(&mut cursor).unwrap();
        assert_eq!(header, 0x89504E470D0A1A0A);
        assert_eq!(cursor.position(), 8);
    }

    #[test]
    fn test_index_minimal_png() {
        let chunks = index(create_test_png()).unwrap();
        let types: Vec<ChunkType> = chunks.iter().map(|c| c.chunk_type).collect();
        assert_eq!(types, [ChunkType::Ihdr, ChunkType::Idat, ChunkType::Iend]);

        assert_eq!(chunks[0].length, 13);
        assert_eq!(chunks[0].data_offset, 16);
        assert_eq!(chunks[1].data_offset, 16 + 13 + 4 + 8);
        assert_eq!(chunks[2].length, 0);
        assert_eq!(chunks[2].crc, 0xAE426082);
    }

    #[test]
    fn test_offsets_point_at_payloads() {
        let png = create_test_png();
        let chunks = index(png.clone()).unwrap();
        for chunk in &chunks {
            let start = chunk.data_offset as usize;
            let payload = &png[start..start + chunk.length as usize];
            let crc = crate::utils::chunk_crc32(chunk.chunk_type.to_bytes(), payload);
            assert_eq!(crc, chunk.crc);
        }
    }

    #[test]
    fn test_first_chunk_must_be_ihdr() {
        let png = build_png(&[(b"IDAT", b"abc"), (b"IEND", &[])]);
        assert!(matches!(index(png), Err(StegoError::Format(_))));
    }

    #[test]
    fn test_missing_iend() {
        let png = build_png(&[(b"IHDR", &IHDR_1X1_RGB), (b"IDAT", b"abc")]);
        assert!(matches!(index(png), Err(StegoError::Format(_))));

        let signature_only = crate::utils::PNG_SIGNATURE.to_vec();
        assert!(matches!(index(signature_only), Err(StegoError::Format(_))));
    }

    #[test]
    fn test_stops_at_first_iend() {
        let mut png = create_test_png();
        crate::utils::fixtures::push_chunk(&mut png, b"tEXt", b"after the end");
        let chunks = index(png).unwrap();
        assert_eq!(chunks.len(), 3);
        assert!(chunks[2].is_type(ChunkType::Iend));
    }

    #[test]
    fn test_crc_mismatch() {
        let mut png = create_test_png();
        // First IDAT payload byte
        png[8 + 25 + 8] ^= 0x01;
        let result = index(png);
        assert!(matches!(result, Err(StegoError::Checksum { chunk: ChunkType::Idat, .. })));
    }

    #[test]
    fn test_iend_crc_mismatch() {
        let mut png = create_test_png();
        let last = png.len() - 1;
        png[last] ^= 0xFF;
        assert!(matches!(index(png), Err(StegoError::Checksum { chunk: ChunkType::Iend, .. })));
    }

    #[test]
    fn test_truncated_payload_is_not_a_crc_error() {
        let png = create_test_png();
        // Cut inside the IDAT payload
        let cut = png[..8 + 25 + 8 + 4].to_vec();
        assert!(matches!(
            index(cut),
            Err(StegoError::Truncated { field: "chunk data", offset: 41 })
        ));
    }

    #[test]
    fn test_length_claims_more_than_remains() {
        let mut png = build_png(&[(b"IHDR", &IHDR_1X1_RGB)]);
        png.extend_from_slice(&1000u32.to_be_bytes());
        png.extend_from_slice(b"IDAT");
        png.extend_from_slice(&[0u8; 10]);
        assert!(matches!(index(png), Err(StegoError::Truncated { .. })));
    }

    #[test]
    fn test_truncated_fields() {
        let png = create_test_png();
        let iend_start = png.len() - 12;

        let cut = png[..iend_start + 2].to_vec();
        assert!(matches!(index(cut), Err(StegoError::Truncated { field: "chunk length", .. })));

        let cut = png[..iend_start + 6].to_vec();
        assert!(matches!(index(cut), Err(StegoError::Truncated { field: "chunk type", .. })));

        let cut = png[..png.len() - 1].to_vec();
        assert!(matches!(index(cut), Err(StegoError::Truncated { field: "chunk CRC", .. })));
    }

    #[test]
    fn test_large_payload_spans_hash_buffer() {
        let big = vec![0x5Au8; HASH_BUF_CAP * 2 + 17];
        let png = build_png(&[(b"IHDR", &IHDR_1X1_RGB), (b"IDAT", &big), (b"IEND", &[])]);
        let chunks = index(png).unwrap();
        assert_eq!(chunks[1].length as usize, big.len());
    }

    proptest! {
        #[test]
        fn prop_any_corrupted_payload_byte_fails_crc(
            payload in proptest::collection::vec(any::<u8>(), 1..64),
            pick in any::<proptest::sample::Index>(),
            flip in 1u8..=255,
        ) {
            let mut png = build_png(&[(b"IHDR", &IHDR_1X1_RGB), (b"IDAT", &payload), (b"IEND", &[])]);
            let at = 8 + 25 + 8 + pick.index(payload.len());
            png[at] ^= flip;
            let result = index(png);
            prop_assert!(
                matches!(result, Err(StegoError::Checksum { chunk: ChunkType::Idat, .. })),
                "unexpected result: {:?}", result
            );
        }
    }
}
