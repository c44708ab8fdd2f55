//! # PNG Hidden Message Tool
//!
//! This library indexes PNG files at the chunk level and hides short text
//! messages inside them.
//!
//! The message travels in a custom ancillary chunk (`hIDe`) inserted right
//! before `IEND`. Every other chunk is copied through untouched, so the
//! rewritten file stays a checksum-valid PNG that ordinary decoders display
//! exactly like the source image.

// Public API exports
pub mod cli;
pub mod png;
pub mod dump;
pub mod extract;
pub mod inject;
pub mod utils;

use std::path::PathBuf;

pub use png::{ChunkRecord, ChunkType, PngDocument};
pub use dump::{ChunkRun, DumpReport};
pub use extract::HiddenMessage;

/// Result type alias for chunk-level operations
pub type StegoResult<T> = Result<T, StegoError>;

/// Comprehensive error type for the hidden message tool
#[derive(Debug, thiserror::Error)]
pub enum StegoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid PNG: {0}")]
    Format(String),

    #[error("CRC mismatch in chunk {chunk}: stored {stored:08X}, computed {computed:08X}")]
    Checksum {
        chunk: ChunkType,
        stored: u32,
        computed: u32,
    },

    #[error("Truncated PNG: {field} at offset {offset} runs past end of file")]
    Truncated { field: &'static str, offset: u64 },

    #[error("Hidden message is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("Message too large: {len} bytes (max: {max})")]
    MessageTooLarge { len: usize, max: usize },

    #[error("Output file {0} is the input file")]
    SameFile(PathBuf),
}

impl StegoError {
    /// Validate that a PNG chunk's stored CRC matches the computed value
    pub fn check_chunk_crc(chunk_type: ChunkType, stored: u32, computed: u32) -> StegoResult<()> {
        if stored != computed {
            Err(StegoError::Checksum {
                chunk: chunk_type,
                stored,
                computed,
            })
        } else {
            Ok(())
        }
    }
}
