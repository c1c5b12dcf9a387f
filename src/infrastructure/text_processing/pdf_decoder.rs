use lopdf::{DecompressError, Document};

use crate::application::ports::{DecodeError, Decoder};

use super::DEFAULT_MAX_DECOMPRESSED_BYTES;

/// Extracts text page by page. A page whose content cannot be turned into
/// text contributes an empty line, so an image-only PDF yields `""`.
pub struct PdfDecoder {
    max_decompressed_bytes: usize,
}

impl PdfDecoder {
    pub fn new(max_decompressed_bytes: usize) -> Self {
        Self {
            max_decompressed_bytes,
        }
    }

    fn page_text(&self, document: &Document, page_number: u32) -> Result<String, DecodeError> {
        match document.extract_text_with_limit(&[page_number], self.max_decompressed_bytes) {
            Ok(text) => Ok(text.trim_end_matches(['\n', '\r']).to_string()),
            Err(lopdf::Error::Decompress(DecompressError::MemoryLimitExceeded { limit })) => {
                Err(DecodeError::Unsupported(format!(
                    "page {page_number} inflates beyond {limit} bytes"
                )))
            }
            Err(e) => {
                tracing::debug!(page_number, error = %e, "page has no extractable text");
                Ok(String::new())
            }
        }
    }
}

impl Default for PdfDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DECOMPRESSED_BYTES)
    }
}

impl Decoder for PdfDecoder {
    fn name(&self) -> &'static str {
        "pdf"
    }

    #[tracing::instrument(skip(self, content), fields(bytes = content.len()))]
    fn decode(&self, content: &[u8]) -> Result<String, DecodeError> {
        let document = Document::load_mem(content)
            .map_err(|e| DecodeError::Malformed(format!("failed to parse PDF: {e}")))?;

        if document.is_encrypted() {
            return Err(DecodeError::Unsupported("PDF is encrypted".to_string()));
        }

        let pages = document.get_pages();
        let mut texts = Vec::with_capacity(pages.len());
        for page_number in pages.keys() {
            texts.push(self.page_text(&document, *page_number)?);
        }

        tracing::debug!(page_count = texts.len(), "PDF text extraction complete");

        Ok(texts.join("\n"))
    }
}
