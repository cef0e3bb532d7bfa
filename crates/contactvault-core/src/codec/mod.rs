//! Byte encodings of the record tree.
//!
//! A [`Codec`] turns a [`FolderRecord`] into bytes and back. The store
//! encrypts whatever the codec produces and adds no framing of its own, so a
//! save file can only be read back with the codec that wrote it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::FolderRecord;

/// Errors from encoding or decoding records.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Binary codec error: {0}")]
    Binary(#[from] bincode::Error),
}

/// Pluggable serialization of a root record.
pub trait Codec: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn encode(&self, record: &FolderRecord) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, bytes: &[u8]) -> Result<FolderRecord, CodecError>;
}

/// Self-describing text encoding (serde_json).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, record: &FolderRecord) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(record)?)
    }

    /// Accepts trees of any depth. Each folder level nests three JSON values.
    fn decode(&self, bytes: &[u8]) -> Result<FolderRecord, CodecError> {
        let mut de = serde_json::Deserializer::from_slice(bytes);
        de.disable_recursion_limit();
        let record = FolderRecord::deserialize(&mut de)?;
        de.end()?;
        Ok(record)
    }
}

/// Compact binary encoding (bincode).
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl Codec for BinaryCodec {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn encode(&self, record: &FolderRecord) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::serialize(record)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<FolderRecord, CodecError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Codec selection, as it appears in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    #[default]
    Json,
    Binary,
}

impl CodecKind {
    pub fn codec(self) -> Box<dyn Codec> {
        match self {
            CodecKind::Json => Box::new(JsonCodec),
            CodecKind::Binary => Box::new(BinaryCodec),
        }
    }
}
