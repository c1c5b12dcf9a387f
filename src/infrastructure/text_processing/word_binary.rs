//! Text recovery from Word 97-2003 binary documents.
//!
//! Only the piece table is consulted; formatting, styles and every other
//! structure of the file are skipped.

use std::io::{Cursor, Read};

use cfb::CompoundFile;

use crate::application::ports::DecodeError;

const WORD97_IDENT: u16 = 0xA5EC;
const WORD95_IDENT: u16 = 0xA5DC;

const FLAGS_OFFSET: usize = 0x000A;
const FIB_FC_MIN_OFFSET: usize = 0x0018;
const FIB_FC_MAC_OFFSET: usize = 0x001C;
const CCP_TEXT_OFFSET: usize = 0x004C;
const FC_CLX_OFFSET: usize = 0x01A2;
const LCB_CLX_OFFSET: usize = 0x01A6;

const FLAG_ENCRYPTED: u16 = 0x0100;
const FLAG_TABLE_1: u16 = 0x0200;
const FC_COMPRESSED: u32 = 0x4000_0000;

const FIELD_BEGIN: char = '\u{13}';
const FIELD_SEPARATOR: char = '\u{14}';
const FIELD_END: char = '\u{15}';

pub(super) const OLE_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Returns the main-story text of a binary `.doc` file.
pub(super) fn extract_word_binary_text(content: &[u8]) -> Result<String, DecodeError> {
    let mut compound = CompoundFile::open(Cursor::new(content))
        .map_err(|e| DecodeError::Malformed(format!("compound file: {e}")))?;

    let word_document = read_stream(&mut compound, "/WordDocument")?;
    let ident = read_u16(&word_document, 0)?;
    let flags = read_u16(&word_document, FLAGS_OFFSET)?;

    if flags & FLAG_ENCRYPTED != 0 {
        return Err(DecodeError::Unsupported("document is encrypted".to_string()));
    }

    let raw = match ident {
        WORD97_IDENT => {
            let table_name = if flags & FLAG_TABLE_1 != 0 { "/1Table" } else { "/0Table" };
            let table = read_stream(&mut compound, table_name)?;
            piece_table_text(&word_document, &table)?
        }
        WORD95_IDENT => {
            let fc_min = read_u32(&word_document, FIB_FC_MIN_OFFSET)? as usize;
            let fc_mac = read_u32(&word_document, FIB_FC_MAC_OFFSET)? as usize;
            let bytes = slice(&word_document, fc_min, fc_mac.saturating_sub(fc_min))?;
            decode_cp1252(bytes)
        }
        other => {
            return Err(DecodeError::Unsupported(format!(
                "unknown Word binary identifier {other:#06x}"
            )));
        }
    };

    Ok(clean_control_characters(&raw))
}

fn piece_table_text(word_document: &[u8], table: &[u8]) -> Result<String, DecodeError> {
    let ccp_text = read_u32(word_document, CCP_TEXT_OFFSET)? as usize;
    let fc_clx = read_u32(word_document, FC_CLX_OFFSET)? as usize;
    let lcb_clx = read_u32(word_document, LCB_CLX_OFFSET)? as usize;
    let clx = slice(table, fc_clx, lcb_clx)?;

    let mut pos = 0;
    while clx.get(pos) == Some(&0x01) {
        let cb_grpprl = read_u16(clx, pos + 1)? as usize;
        pos += 3 + cb_grpprl;
    }
    if clx.get(pos) != Some(&0x02) {
        return Err(DecodeError::Malformed("piece table descriptor missing".to_string()));
    }

    let lcb = read_u32(clx, pos + 1)? as usize;
    let plc = slice(clx, pos + 5, lcb)?;
    if lcb < 4 || (lcb - 4) % 12 != 0 {
        return Err(DecodeError::Malformed(format!("piece table of {lcb} bytes")));
    }

    let piece_count = (lcb - 4) / 12;
    let descriptors_at = 4 * (piece_count + 1);
    let mut text = String::new();
    let mut remaining = ccp_text;

    for piece in 0..piece_count {
        if remaining == 0 {
            break;
        }

        let cp_start = read_u32(plc, piece * 4)? as usize;
        let cp_end = read_u32(plc, (piece + 1) * 4)? as usize;
        let chars = cp_end.saturating_sub(cp_start).min(remaining);
        let fc = read_u32(plc, descriptors_at + piece * 8 + 2)?;

        if fc & FC_COMPRESSED != 0 {
            let offset = ((fc & !FC_COMPRESSED) / 2) as usize;
            text.push_str(&decode_cp1252(slice(word_document, offset, chars)?));
        } else {
            let bytes = slice(word_document, fc as usize, chars * 2)?;
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            text.push_str(&String::from_utf16_lossy(&units));
        }

        remaining -= chars;
    }

    Ok(text)
}

/// Maps Word's special characters to plain text and drops field instructions.
fn clean_control_characters(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut fields: Vec<bool> = Vec::new();

    for ch in raw.chars() {
        match ch {
            FIELD_BEGIN => fields.push(true),
            FIELD_SEPARATOR => {
                if let Some(in_instruction) = fields.last_mut() {
                    *in_instruction = false;
                }
            }
            FIELD_END => {
                fields.pop();
            }
            _ if fields.last() == Some(&true) => {}
            '\r' | '\u{0B}' | '\u{0C}' => out.push('\n'),
            '\u{07}' => out.push('\t'),
            '\t' | '\n' => out.push(ch),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }

    out.trim_end().to_string()
}

fn read_stream(
    compound: &mut CompoundFile<Cursor<&[u8]>>,
    path: &str,
) -> Result<Vec<u8>, DecodeError> {
    let mut stream = compound
        .open_stream(path)
        .map_err(|_| DecodeError::MissingPart(path.trim_start_matches('/').to_string()))?;
    let mut buffer = Vec::new();
    stream
        .read_to_end(&mut buffer)
        .map_err(|e| DecodeError::Malformed(format!("{path}: {e}")))?;
    Ok(buffer)
}

fn decode_cp1252(bytes: &[u8]) -> String {
    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    text.into_owned()
}

fn slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8], DecodeError> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| {
            DecodeError::Malformed(format!("range {offset}+{len} outside {} bytes", data.len()))
        })
}

fn read_u16(data: &[u8], offset: usize) -> Result<u16, DecodeError> {
    let bytes = slice(data, offset, 2)?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32, DecodeError> {
    let bytes = slice(data, offset, 4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
