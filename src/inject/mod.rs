//! Rewriting a PNG with a hidden message chunk

use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, info};
use crate::png::chunk::write_hidden_chunk;
use crate::png::{ChunkRecord, ChunkType, PngDocument};
use crate::utils::PNG_SIGNATURE;
use crate::StegoResult;

impl<R: Read + Seek> PngDocument<R> {
    /// Write a copy of this PNG to `target` with `message` hidden before `IEND`.
    ///
    /// An existing `target` is truncated. The write is not atomic: if it fails
    /// part way, whatever was written stays on disk.
    pub fn inject(&mut self, target: &Path, message: &str) -> StegoResult<u64> {
        let file = File::create(target)?;
        let mut out = BufWriter::new(file);
        let written = self.inject_into(&mut out, message)?;
        out.flush()?;

        info!(path = %target.display(), bytes = written, "wrote PNG with hidden message");
        Ok(written)
    }

    /// Stream the rewritten PNG into `out`, returning the number of bytes written
    pub fn inject_into<W: Write>(&mut self, out: &mut W, message: &str) -> StegoResult<u64> {
        out.write_all(&PNG_SIGNATURE)?;
        let mut written = PNG_SIGNATURE.len() as u64;

        let chunks = self.chunks().to_vec();
        for chunk in &chunks {
            if chunk.is_type(ChunkType::Iend) {
                // Let's insert the new chunk just before the end...
                written += write_hidden_chunk(out, message)?;
                debug!(length = message.len(), "inserted hIDe chunk");
            }
            written += self.copy_chunk(chunk, out)?;
        }

        Ok(written)
    }

    /// Copy one chunk verbatim, payload re-read from the source
    fn copy_chunk<W: Write>(&mut self, chunk: &ChunkRecord, out: &mut W) -> StegoResult<u64> {
        chunk.write_header(out)?;

        let source = self.source_mut();
        source.seek(SeekFrom::Start(chunk.data_offset))?;
        let copied = io::copy(&mut source.take(u64::from(chunk.length)), out)?;
        if copied != u64::from(chunk.length) {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "source ended after {} of {} bytes of {} chunk",
                    copied, chunk.length, chunk.chunk_type
                ),
            )
            .into());
        }

        chunk.write_trailer(out)?;
        debug!(chunk = %chunk.chunk_type, length = chunk.length, "copied chunk");
        Ok(chunk.total_size())
    }
}
