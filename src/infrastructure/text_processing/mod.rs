mod decoder_set_factory;
mod docx_decoder;
mod ooxml;
mod pdf_decoder;
mod plain_text_decoder;
mod presentation_decoder;
mod raw_text_decoder;
mod spreadsheet_decoder;
mod word_binary;
mod word_xml;

/// Upper bound on the inflated size of a single compressed stream or package
/// part, unless configured otherwise.
pub const DEFAULT_MAX_DECOMPRESSED_BYTES: usize = 64 * 1024 * 1024;

pub use decoder_set_factory::DecoderSetFactory;
pub use docx_decoder::DocxDecoder;
pub use pdf_decoder::PdfDecoder;
pub use plain_text_decoder::PlainTextDecoder;
pub use presentation_decoder::PresentationDecoder;
pub use raw_text_decoder::RawTextDecoder;
pub use spreadsheet_decoder::SpreadsheetDecoder;
