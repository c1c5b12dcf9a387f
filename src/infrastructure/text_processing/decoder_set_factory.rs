use std::sync::Arc;

use crate::application::ports::Decoder;
use crate::application::services::DecoderSet;
use crate::config::ExtractionSettings;

use super::docx_decoder::DocxDecoder;
use super::pdf_decoder::PdfDecoder;
use super::plain_text_decoder::PlainTextDecoder;
use super::presentation_decoder::PresentationDecoder;
use super::raw_text_decoder::RawTextDecoder;
use super::spreadsheet_decoder::SpreadsheetDecoder;

pub struct DecoderSetFactory;

impl DecoderSetFactory {
    pub fn create(settings: &ExtractionSettings) -> DecoderSet {
        let limit = settings.max_decompressed_bytes;
        let raw_text: Arc<dyn Decoder> =
            Arc::new(RawTextDecoder::new().with_max_part_bytes(limit));

        DecoderSet {
            pdf: vec![Arc::new(PdfDecoder::new(limit))],
            docx: vec![
                Arc::new(DocxDecoder::new().with_max_part_bytes(limit)),
                Arc::clone(&raw_text),
            ],
            doc: vec![raw_text],
            plain_text: vec![Arc::new(PlainTextDecoder::new())],
            spreadsheet: vec![Arc::new(SpreadsheetDecoder::new().with_max_part_bytes(limit))],
            presentation: vec![Arc::new(PresentationDecoder::new().with_max_part_bytes(limit))],
        }
    }
}
