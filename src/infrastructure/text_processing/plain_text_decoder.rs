use encoding_rs::{Encoding, ISO_8859_15, UTF_8, WINDOWS_1252};

use crate::application::ports::{DecodeError, Decoder};

const SINGLE_BYTE_FALLBACKS: [&Encoding; 2] = [ISO_8859_15, WINDOWS_1252];

/// Decodes text files by trying UTF-8 (or the encoding named by a byte order
/// mark), then ISO-8859-15, then Windows-1252.
///
/// Any strictly valid Unicode decoding is accepted as-is. The single-byte
/// fallbacks map nearly every byte, so their output is also rejected when it
/// holds control characters other than common whitespace.
#[derive(Debug, Default)]
pub struct PlainTextDecoder;

impl PlainTextDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for PlainTextDecoder {
    fn name(&self) -> &'static str {
        "plain-text"
    }

    #[tracing::instrument(skip(self, content), fields(bytes = content.len()))]
    fn decode(&self, content: &[u8]) -> Result<String, DecodeError> {
        let (unicode, bom_len) = Encoding::for_bom(content).unwrap_or((UTF_8, 0));
        let mut tried = vec![unicode.name()];

        if let Some(text) =
            unicode.decode_without_bom_handling_and_without_replacement(&content[bom_len..])
        {
            tracing::debug!(encoding = unicode.name(), "decoded plain text");
            return Ok(text.into_owned());
        }

        for encoding in SINGLE_BYTE_FALLBACKS {
            tried.push(encoding.name());

            let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(content)
            else {
                continue;
            };

            if text.chars().any(is_disallowed_control) {
                continue;
            }

            tracing::debug!(encoding = encoding.name(), "decoded plain text");
            return Ok(text.into_owned());
        }

        Err(DecodeError::UnrecognizedEncoding(format!(
            "no candidate encoding matched (tried {})",
            tried.join(", ")
        )))
    }
}

fn is_disallowed_control(ch: char) -> bool {
    ch.is_control() && !matches!(ch, '\t' | '\n' | '\r' | '\u{0C}')
}
