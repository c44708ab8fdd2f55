//! Hidden message lookup

use std::io::{Read, Seek};
use tracing::{debug, warn};
use crate::png::{ChunkRecord, ChunkType, PngDocument};
use crate::{StegoError, StegoResult};

/// A decoded `hIDe` chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiddenMessage {
    pub record: ChunkRecord,
    pub text: String,
}

impl<R: Read + Seek> PngDocument<R> {
    /// The first `hIDe` chunk in on-disk order, if any
    pub fn find_hidden(&self) -> Option<&ChunkRecord> {
        self.chunks().iter().find(|c| c.is_type(ChunkType::Hide))
    }

    /// Decode the payload of a hidden chunk as UTF-8
    pub fn decode_hidden(&mut self, record: &ChunkRecord) -> StegoResult<String> {
        let payload = self.read_payload(record)?;
        let text = std::str::from_utf8(&payload)?;
        Ok(text.to_string())
    }

    /// The first hidden message.
    ///
    /// Later `hIDe` chunks are ignored. A chunk whose payload is not UTF-8
    /// counts as no message; a zero-length chunk is a found, empty message.
    /// Only I/O failures while reading the payload are errors.
    pub fn hidden_message(&mut self) -> StegoResult<Option<String>> {
        let Some(record) = self.find_hidden().copied() else {
            debug!("no hIDe chunk in index");
            return Ok(None);
        };

        match self.decode_hidden(&record) {
            Ok(text) => Ok(Some(text)),
            Err(StegoError::Encoding(e)) => {
                warn!(offset = record.data_offset, "hidden message is not UTF-8: {}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Every decodable hidden message, in on-disk order
    pub fn hidden_messages(&mut self) -> StegoResult<Vec<HiddenMessage>> {
        let records: Vec<ChunkRecord> = self
            .chunks()
            .iter()
            .filter(|c| c.is_type(ChunkType::Hide))
            .copied()
            .collect();

        let mut messages = Vec::with_capacity(records.len());
        for record in records {
            match self.decode_hidden(&record) {
                Ok(text) => messages.push(HiddenMessage { record, text }),
                Err(StegoError::Encoding(e)) => {
                    warn!(offset = record.data_offset, "skipping non UTF-8 hIDe chunk: {}", e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(messages)
    }
}
