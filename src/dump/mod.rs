//! Human-readable chunk listings

use std::fmt;
use crate::png::{ChunkRecord, ChunkType, PngDocument};

/// Consecutive chunks sharing one type.
///
/// `length`, `offset` and `crc` describe the first chunk of the run; `count`
/// and `total_length` cover the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRun {
    pub chunk_type: ChunkType,
    pub length: u32,
    pub offset: u64,
    pub crc: u32,
    pub count: usize,
    pub total_length: u64,
}

impl ChunkRun {
    fn start(chunk: &ChunkRecord) -> Self {
        Self {
            chunk_type: chunk.chunk_type,
            length: chunk.length,
            offset: chunk.data_offset,
            crc: chunk.crc,
            count: 1,
            total_length: u64::from(chunk.length),
        }
    }
}

/// Collapse consecutive same-typed chunks into runs
pub fn collapse_runs(chunks: &[ChunkRecord]) -> Vec<ChunkRun> {
    let mut runs: Vec<ChunkRun> = Vec::new();
    let mut last_type: Option<ChunkType> = None;

    for chunk in chunks {
        if last_type == Some(chunk.chunk_type) {
            if let Some(run) = runs.last_mut() {
                run.count += 1;
                run.total_length += u64::from(chunk.length);
                continue;
            }
        }
        runs.push(ChunkRun::start(chunk));
        last_type = Some(chunk.chunk_type);
    }
    runs
}

/// Summary of a document's header and chunk index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpReport {
    pub signature: u64,
    pub runs: Vec<ChunkRun>,
    /// Every chunk listed on its own, with its CRC
    pub detailed: bool,
}

impl DumpReport {
    pub fn collapsed(signature: u64, chunks: &[ChunkRecord]) -> Self {
        Self {
            signature,
            runs: collapse_runs(chunks),
            detailed: false,
        }
    }

    pub fn detailed(signature: u64, chunks: &[ChunkRecord]) -> Self {
        Self {
            signature,
            runs: chunks.iter().map(ChunkRun::start).collect(),
            detailed: true,
        }
    }
}

impl fmt::Display for DumpReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Header: {:016X}", self.signature)?;
        for run in &self.runs {
            writeln!(
                f,
                "Chunk: {} (0x{:08X}), Length: {}, Pos: {}",
                run.chunk_type,
                run.chunk_type.to_u32(),
                run.length,
                run.offset
            )?;
            if self.detailed {
                writeln!(f, "  crc32: {:08X}", run.crc)?;
            }
            if run.count > 1 {
                writeln!(f, "  repeated: {} time(s)", run.count)?;
                writeln!(f, "  total length: {}", run.total_length)?;
            }
        }
        Ok(())
    }
}

impl<R> PngDocument<R> {
    /// Collapsed listing of the chunk index
    pub fn dump_report(&self) -> DumpReport {
        DumpReport::collapsed(self.signature(), self.chunks())
    }

    /// One line per chunk, CRCs included
    pub fn dump_detailed(&self) -> DumpReport {
        DumpReport::detailed(self.signature(), self.chunks())
    }
}
