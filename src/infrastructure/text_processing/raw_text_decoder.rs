use crate::application::ports::{DecodeError, Decoder};

use super::DEFAULT_MAX_DECOMPRESSED_BYTES;
use super::ooxml::{open_package, read_part};
use super::word_binary::{OLE_SIGNATURE, extract_word_binary_text};
use super::word_xml::{ParseMode, paragraphs};

const ZIP_SIGNATURE: [u8; 4] = *b"PK\x03\x04";

/// Best-effort text recovery for Word files that the structured reader
/// rejects, and for legacy binary `.doc` files.
///
/// Zip containers are scanned for header, body and footer parts by name,
/// ignoring content types and relationships; unreadable XML is consumed up
/// to the first error. OLE containers go through the Word piece table.
#[derive(Debug)]
pub struct RawTextDecoder {
    max_part_bytes: usize,
}

impl RawTextDecoder {
    pub fn new() -> Self {
        Self {
            max_part_bytes: DEFAULT_MAX_DECOMPRESSED_BYTES,
        }
    }

    pub fn with_max_part_bytes(mut self, max_part_bytes: usize) -> Self {
        self.max_part_bytes = max_part_bytes;
        self
    }

    fn decode_zip(&self, content: &[u8]) -> Result<String, DecodeError> {
        let mut package = open_package(content)?;

        let mut headers = Vec::new();
        let mut bodies = Vec::new();
        let mut footers = Vec::new();
        for name in package.file_names() {
            let Some(stem) = name.strip_prefix("word/").and_then(|n| n.strip_suffix(".xml")) else {
                continue;
            };
            if stem.contains('/') {
                continue;
            }
            if stem.starts_with("header") {
                headers.push(name.to_string());
            } else if stem.starts_with("document") {
                bodies.push(name.to_string());
            } else if stem.starts_with("footer") {
                footers.push(name.to_string());
            }
        }

        if bodies.is_empty() {
            return Err(DecodeError::MissingPart("word/document.xml".to_string()));
        }

        headers.sort();
        bodies.sort();
        footers.sort();

        let mut lines = Vec::new();
        for part in headers.iter().chain(&bodies).chain(&footers) {
            match read_part(&mut package, part, self.max_part_bytes) {
                Ok(xml) => lines.extend(paragraphs(&xml, part, ParseMode::Tolerant)?),
                Err(e @ DecodeError::Unsupported(_)) => return Err(e),
                Err(e) => tracing::debug!(part = %part, error = %e, "skipping unreadable part"),
            }
        }

        Ok(lines.join("\n"))
    }
}

impl Default for RawTextDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for RawTextDecoder {
    fn name(&self) -> &'static str {
        "raw-text"
    }

    #[tracing::instrument(skip(self, content), fields(bytes = content.len()))]
    fn decode(&self, content: &[u8]) -> Result<String, DecodeError> {
        if content.starts_with(&ZIP_SIGNATURE) {
            self.decode_zip(content)
        } else if content.starts_with(&OLE_SIGNATURE) {
            extract_word_binary_text(content)
        } else {
            Err(DecodeError::Unsupported(
                "neither a zip package nor an OLE compound file".to_string(),
            ))
        }
    }
}
