use std::sync::Arc;

use crate::application::ports::Decoder;
use crate::domain::DocumentFormat;

/// Decoders tried in order for one format until one succeeds.
pub type DecoderChain = Vec<Arc<dyn Decoder>>;

/// One fallback chain per supported format.
pub struct DecoderSet {
    pub pdf: DecoderChain,
    pub docx: DecoderChain,
    pub doc: DecoderChain,
    pub plain_text: DecoderChain,
    pub spreadsheet: DecoderChain,
    pub presentation: DecoderChain,
}

impl DecoderSet {
    pub fn chain_for(&self, format: DocumentFormat) -> &[Arc<dyn Decoder>] {
        match format {
            DocumentFormat::Pdf => &self.pdf,
            DocumentFormat::Docx => &self.docx,
            DocumentFormat::Doc => &self.doc,
            DocumentFormat::PlainText => &self.plain_text,
            DocumentFormat::Spreadsheet => &self.spreadsheet,
            DocumentFormat::Presentation => &self.presentation,
        }
    }
}
