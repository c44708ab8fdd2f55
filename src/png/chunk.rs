//! Chunk tags and chunk index records

use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::str::FromStr;
use byteorder::{BigEndian, WriteBytesExt};
use crate::utils::chunk_crc32;
use crate::{StegoError, StegoResult};

/// Largest payload a single PNG chunk may declare (2^31 - 1)
pub const MAX_CHUNK_LENGTH: usize = 0x7FFF_FFFF;

/// Four-byte chunk tag.
///
/// Known tags get their own variant; anything else is carried verbatim in
/// [`ChunkType::Other`]. Two values are equal when their 32-bit encodings are,
/// so `Other(*b"IEND")` compares equal to `Iend`.
#[derive(Debug, Clone, Copy, Eq)]
pub enum ChunkType {
    /// Image header, always the first chunk
    Ihdr,
    /// Palette
    Plte,
    /// Image data
    Idat,
    /// Image trailer, always the last chunk
    Iend,
    /// Hidden message chunk written by this tool
    Hide,
    Other([u8; 4]),
}

impl ChunkType {
    pub const IHDR: u32 = 0x4948_4452;
    pub const PLTE: u32 = 0x504C_5445;
    pub const IDAT: u32 = 0x4944_4154;
    pub const IEND: u32 = 0x4945_4E44;
    /// `hIDe`: ancillary and safe to copy
    pub const HIDE: u32 = 0x6849_4465;

    pub const fn from_u32(value: u32) -> Self {
        match value {
            Self::IHDR => ChunkType::Ihdr,
            Self::PLTE => ChunkType::Plte,
            Self::IDAT => ChunkType::Idat,
            Self::IEND => ChunkType::Iend,
            Self::HIDE => ChunkType::Hide,
            other => ChunkType::Other(other.to_be_bytes()),
        }
    }

    pub const fn to_u32(self) -> u32 {
        match self {
            ChunkType::Ihdr => Self::IHDR,
            ChunkType::Plte => Self::PLTE,
            ChunkType::Idat => Self::IDAT,
            ChunkType::Iend => Self::IEND,
            ChunkType::Hide => Self::HIDE,
            ChunkType::Other(bytes) => u32::from_be_bytes(bytes),
        }
    }

    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self::from_u32(u32::from_be_bytes(bytes))
    }

    /// The tag as it appears on disk
    pub const fn to_bytes(self) -> [u8; 4] {
        self.to_u32().to_be_bytes()
    }

    /// Critical chunks have an uppercase first letter
    pub const fn is_critical(self) -> bool {
        self.to_bytes()[0] & 0x20 == 0
    }

    /// Public chunks have an uppercase second letter
    pub const fn is_public(self) -> bool {
        self.to_bytes()[1] & 0x20 == 0
    }

    /// Safe-to-copy chunks have a lowercase fourth letter
    pub const fn is_safe_to_copy(self) -> bool {
        self.to_bytes()[3] & 0x20 != 0
    }
}

impl PartialEq for ChunkType {
    fn eq(&self, other: &Self) -> bool {
        self.to_u32() == other.to_u32()
    }
}

impl Hash for ChunkType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_u32().hash(state);
    }
}

impl From<[u8; 4]> for ChunkType {
    fn from(bytes: [u8; 4]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<ChunkType> for u32 {
    fn from(chunk_type: ChunkType) -> Self {
        chunk_type.to_u32()
    }
}

// Prints the ASCII tag (i.e. 'IHDR')
impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.to_bytes() {
            let c = if b.is_ascii_graphic() { b as char } else { '?' };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

impl FromStr for ChunkType {
    type Err = StegoError;

    fn from_str(s: &str) -> StegoResult<Self> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| StegoError::Format(format!("chunk tag must be 4 bytes: {:?}", s)))?;
        if !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(StegoError::Format(format!("chunk tag must be ASCII letters: {:?}", s)));
        }
        Ok(Self::from_bytes(bytes))
    }
}

/// Metadata for one chunk of the source stream.
///
/// The payload is not kept; `data_offset` points at it in the source so it can
/// be read back on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRecord {
    pub length: u32,
    pub chunk_type: ChunkType,
    pub data_offset: u64, // Absolute position of the payload in the source
    pub crc: u32,         // Stored CRC over type + payload
}

impl ChunkRecord {
    pub fn is_type(&self, chunk_type: ChunkType) -> bool {
        self.chunk_type == chunk_type
    }

    /// Length + type + payload + CRC
    pub fn total_size(&self) -> u64 {
        12 + u64::from(self.length)
    }

    /// Write the length and type fields that precede the payload
    pub fn write_header<W: Write>(&self, out: &mut W) -> StegoResult<()> {
        out.write_u32::<BigEndian>(self.length)?;
        out.write_all(&self.chunk_type.to_bytes())?;
        Ok(())
    }

    /// Write the stored CRC that follows the payload
    pub fn write_trailer<W: Write>(&self, out: &mut W) -> StegoResult<()> {
        out.write_u32::<BigEndian>(self.crc)?;
        Ok(())
    }
}

/// Write a complete `hIDe` chunk carrying `message` and return its size on disk
pub fn write_hidden_chunk<W: Write>(out: &mut W, message: &str) -> StegoResult<u64> {
    let payload = message.as_bytes();
    if payload.len() > MAX_CHUNK_LENGTH {
        return Err(StegoError::MessageTooLarge {
            len: payload.len(),
            max: MAX_CHUNK_LENGTH,
        });
    }

    let tag = ChunkType::Hide.to_bytes();
    out.write_u32::<BigEndian>(payload.len() as u32)?;
    out.write_all(&tag)?;
    out.write_all(payload)?;
    out.write_u32::<BigEndian>(chunk_crc32(tag, payload))?;

    Ok(12 + payload.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_known_tags_round_trip() {
        assert_eq!(ChunkType::from_bytes(*b"IHDR"), ChunkType::Ihdr);
        assert_eq!(ChunkType::from_bytes(*b"IEND"), ChunkType::Iend);
        assert_eq!(ChunkType::from_bytes(*b"hIDe"), ChunkType::Hide);
        assert_eq!(ChunkType::Hide.to_bytes(), *b"hIDe");
        assert_eq!(ChunkType::Iend.to_u32(), 0x49454E44);
        assert!(matches!(ChunkType::from_bytes(*b"tEXt"), ChunkType::Other(b) if &b == b"tEXt"));
    }

    #[test]
    fn test_equality_is_on_the_32_bit_value() {
        assert_eq!(ChunkType::Other(*b"IEND"), ChunkType::Iend);
        assert_ne!(ChunkType::Other(*b"IENd"), ChunkType::Iend);

        let set: HashSet<ChunkType> = [ChunkType::Idat, ChunkType::Other(*b"IDAT")].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_display_and_parse() {
        assert_eq!(ChunkType::Ihdr.to_string(), "IHDR");
        assert_eq!(ChunkType::Other(*b"pHYs").to_string(), "pHYs");
        assert_eq!(ChunkType::Other([0x00, b'A', 0xFF, b'B']).to_string(), "?A?B");

        assert_eq!("hIDe".parse::<ChunkType>().unwrap(), ChunkType::Hide);
        assert_eq!("tIME".parse::<ChunkType>().unwrap(), ChunkType::Other(*b"tIME"));
        assert!(matches!("IDA".parse::<ChunkType>(), Err(StegoError::Format(_))));
        assert!(matches!("ID4T".parse::<ChunkType>(), Err(StegoError::Format(_))));
    }

    #[test]
    fn test_property_bits() {
        assert!(ChunkType::Ihdr.is_critical());
        assert!(ChunkType::Ihdr.is_public());
        assert!(!ChunkType::Ihdr.is_safe_to_copy());

        // The hidden chunk must be skippable by decoders that do not know it
        assert!(!ChunkType::Hide.is_critical());
        assert!(ChunkType::Hide.is_safe_to_copy());
        assert!(!ChunkType::Other(*b"prVt").is_public());
    }

    #[test]
    fn test_write_hidden_chunk_layout() {
        let mut out = Vec::new();
        let written = write_hidden_chunk(&mut out, "hi").unwrap();

        assert_eq!(written, 14);
        assert_eq!(&out[0..4], &2u32.to_be_bytes());
        assert_eq!(&out[4..8], b"hIDe");
        assert_eq!(&out[8..10], b"hi");
        assert_eq!(&out[10..14], &chunk_crc32(*b"hIDe", b"hi").to_be_bytes());
    }

    #[test]
    fn test_record_header_and_trailer() {
        let record = ChunkRecord {
            length: 3,
            chunk_type: ChunkType::Idat,
            data_offset: 41,
            crc: 0xDEADBEEF,
        };
        assert_eq!(record.total_size(), 15);

        let mut out = Vec::new();
        record.write_header(&mut out).unwrap();
        record.write_trailer(&mut out).unwrap();
        assert_eq!(out, [0, 0, 0, 3, b'I', b'D', b'A', b'T', 0xDE, 0xAD, 0xBE, 0xEF]);
    }
}
