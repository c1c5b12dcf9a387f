use std::io::Cursor;

use calamine::{Data, Range, Reader, Xlsx};

use crate::application::ports::{DecodeError, Decoder};

use super::DEFAULT_MAX_DECOMPRESSED_BYTES;
use super::ooxml::ensure_parts_within;

/// Flattens every worksheet of an `.xlsx` workbook into tab-separated rows.
/// Worksheets follow workbook order and rows are positioned from cell `A1`,
/// so leading blank rows and columns survive as empty cells.
#[derive(Debug)]
pub struct SpreadsheetDecoder {
    max_part_bytes: usize,
}

impl SpreadsheetDecoder {
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

impl Default for SpreadsheetDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for SpreadsheetDecoder {
    fn name(&self) -> &'static str {
        "spreadsheet"
    }

    #[tracing::instrument(skip(self, content), fields(bytes = content.len()))]
    fn decode(&self, content: &[u8]) -> Result<String, DecodeError> {
        ensure_parts_within(content, self.max_part_bytes)?;

        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(content))
            .map_err(|e| DecodeError::Malformed(format!("failed to open workbook: {e}")))?;

        let mut rows = Vec::new();
        for sheet in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&sheet)
                .map_err(|e| DecodeError::Malformed(format!("worksheet {sheet:?}: {e}")))?;
            append_rows(&range, &mut rows);
        }

        Ok(rows.join("\n"))
    }
}

fn append_rows(range: &Range<Data>, rows: &mut Vec<String>) {
    let Some((first_row, first_col)) = range.start() else {
        return;
    };

    let leading_cells = vec![String::new(); first_col as usize];
    let width = first_col as usize + range.width();

    for _ in 0..first_row {
        rows.push(vec![""; width].join("\t"));
    }

    for row in range.rows() {
        let cells: Vec<String> = leading_cells
            .iter()
            .cloned()
            .chain(row.iter().map(|cell| cell.to_string()))
            .collect();
        rows.push(cells.join("\t"));
    }
}
