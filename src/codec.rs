//! Document codec boundary.
//!
//! The on-disk directB2S format is XML and is read and written by the host.
//! The core only sees a [`DocumentCodec`]: text in, [`Document`] out, and back.
//! [`JsonCodec`] is a `serde_json` implementation of the same contract, used
//! by hosts that keep documents as JSON and by the tests.

#[cfg(test)]
#[path = "codec_test.rs"]
mod codec_test;

use crate::doc::Document;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("failed to parse document: {0}")]
    Parse(String),
    #[error("failed to serialize document: {0}")]
    Serialize(String),
    #[error("document is empty")]
    Empty,
}

/// Pure text ⇄ document conversion.
pub trait DocumentCodec {
    /// Parse file contents into a document.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Parse`] or [`CodecError::Empty`] for unreadable input.
    fn parse(&self, text: &str) -> Result<Document, CodecError>;

    /// Serialize a document to file contents.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Serialize`] if the document cannot be represented.
    fn serialize(&self, doc: &Document) -> Result<String, CodecError>;
}

/// JSON codec. Output field order follows struct declaration order, so the
/// same document always serializes to the same bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pub pretty: bool,
}

impl JsonCodec {
    #[must_use]
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl DocumentCodec for JsonCodec {
    fn parse(&self, text: &str) -> Result<Document, CodecError> {
        if text.trim().is_empty() {
            return Err(CodecError::Empty);
        }
        serde_json::from_str(text).map_err(|e| CodecError::Parse(e.to_string()))
    }

    fn serialize(&self, doc: &Document) -> Result<String, CodecError> {
        let out = if self.pretty { serde_json::to_string_pretty(doc) } else { serde_json::to_string(doc) };
        out.map_err(|e| CodecError::Serialize(e.to_string()))
    }
}
