//! PNG chunk indexing module

pub mod chunk;
pub mod parser;

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::info;
use crate::StegoResult;
pub use chunk::{ChunkRecord, ChunkType};

/// An opened PNG: the source stream plus the index of its chunks.
///
/// The document owns the stream for its whole lifetime so payloads can be read
/// back lazily through the offsets stored in each [`ChunkRecord`]. Dropping the
/// document closes the stream, whichever way the caller exits.
#[derive(Debug)]
pub struct PngDocument<R> {
    source: R,
    signature: u64,
    chunks: Vec<ChunkRecord>,
}

impl PngDocument<BufReader<File>> {
    /// Open and index a PNG file
    pub fn open(path: &Path) -> StegoResult<Self> {
        let file = File::open(path)?;
        let document = Self::from_reader(BufReader::new(file))?;
        info!(
            path = %path.display(),
            chunks = document.chunks.len(),
            "indexed PNG file"
        );
        Ok(document)
    }
}

impl<R: Read + Seek> PngDocument<R> {
    /// Index a PNG from any seekable stream positioned at its first byte
    pub fn from_reader(mut source: R) -> StegoResult<Self> {
        let signature = parser::read_signature(&mut source)?;
        let chunks = parser::index_chunks(&mut source)?;

        Ok(Self { source, signature, chunks })
    }

    /// Read the payload of `record` back from the source
    pub fn read_payload(&mut self, record: &ChunkRecord) -> StegoResult<Vec<u8>> {
        self.source.seek(SeekFrom::Start(record.data_offset))?;
        let mut data = vec![0u8; record.length as usize];
        self.source.read_exact(&mut data)?;
        Ok(data)
    }

    /// Mutable access to the source for sequential copies
    pub(crate) fn source_mut(&mut self) -> &mut R {
        &mut self.source
    }
}

impl<R> PngDocument<R> {
    /// The validated signature as a big-endian value
    pub fn signature(&self) -> u64 {
        self.signature
    }

    /// Chunk records in on-disk order, `IHDR` first and `IEND` last
    pub fn chunks(&self) -> &[ChunkRecord] {
        &self.chunks
    }

    /// Give back the source stream
    pub fn into_inner(self) -> R {
        self.source
    }
}
