use crate::application::ports::{DecodeError, Decoder};

use super::DEFAULT_MAX_DECOMPRESSED_BYTES;
use super::ooxml::{has_part, open_package, read_part, read_relationships, resolve_target};
use super::word_xml::{ParseMode, paragraphs};

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const PACKAGE_RELS_PART: &str = "_rels/.rels";
const OFFICE_DOCUMENT_REL: &str = "/officeDocument";

/// Reads a well-formed WordprocessingML package: the main document part is
/// located through the package relationships and its paragraphs are joined
/// with `\n`. Any deviation from the expected package layout is an error.
#[derive(Debug)]
pub struct DocxDecoder {
    max_part_bytes: usize,
}

impl DocxDecoder {
    pub fn new() -> Self {
        Self {
            max_part_bytes: DEFAULT_MAX_DECOMPRESSED_BYTES,
        }
    }

    pub fn with_max_part_bytes(mut self, max_part_bytes: usize) -> Self {
        self.max_part_bytes = max_part_bytes;
        self
    }
}

impl Default for DocxDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for DocxDecoder {
    fn name(&self) -> &'static str {
        "docx-structured"
    }

    #[tracing::instrument(skip(self, content), fields(bytes = content.len()))]
    fn decode(&self, content: &[u8]) -> Result<String, DecodeError> {
        let mut package = open_package(content)?;

        if !has_part(&package, CONTENT_TYPES_PART) {
            return Err(DecodeError::MissingPart(CONTENT_TYPES_PART.to_string()));
        }

        let main_part = read_relationships(&mut package, PACKAGE_RELS_PART, self.max_part_bytes)?
            .into_iter()
            .find(|rel| rel.rel_type.ends_with(OFFICE_DOCUMENT_REL))
            .map(|rel| resolve_target("", &rel.target))
            .ok_or_else(|| DecodeError::MissingPart("officeDocument relationship".to_string()))?;

        let xml = read_part(&mut package, &main_part, self.max_part_bytes)?;
        let paragraphs = paragraphs(&xml, &main_part, ParseMode::Strict)?;

        Ok(paragraphs.join("\n"))
    }
}
