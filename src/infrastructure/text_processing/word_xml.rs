use quick_xml::Reader;
use quick_xml::events::Event;

use crate::application::ports::DecodeError;

use super::ooxml::resolve_reference;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ParseMode {
    /// Any XML error fails the whole part.
    Strict,
    /// XML errors end the scan; text read up to that point is kept.
    Tolerant,
}

/// Collects the text of every `<w:p>` paragraph in a WordprocessingML part,
/// in document order. Tabs and breaks inside runs become `\t` and `\n`.
pub(super) fn paragraphs(xml: &str, part: &str, mode: ParseMode) -> Result<Vec<String>, DecodeError> {
    let mut reader = Reader::from_str(xml);
    {
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = mode == ParseMode::Strict;
        config.allow_unmatched_ends = mode == ParseMode::Tolerant;
    }

    let mut completed = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut run_depth = 0usize;
    let mut in_text = false;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) if mode == ParseMode::Strict => {
                return Err(DecodeError::Malformed(format!(
                    "{part} at byte {}: {e}",
                    reader.error_position()
                )));
            }
            Err(_) => break,
        };

        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => open.push(String::new()),
                b"r" => run_depth += 1,
                b"t" if run_depth > 0 => in_text = true,
                name => push_run_break(&mut open, name, run_depth),
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"p" => completed.push(String::new()),
                name => push_run_break(&mut open, name, run_depth),
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(paragraph) = open.pop() {
                        completed.push(paragraph);
                    }
                }
                b"r" => run_depth = run_depth.saturating_sub(1),
                b"t" => in_text = false,
                _ => {}
            },
            Event::Text(t) if in_text => {
                let text = t
                    .decode()
                    .map_err(|e| DecodeError::Malformed(format!("{part}: {e}")));
                match (text, mode) {
                    (Ok(text), _) => push_text(&mut open, &text),
                    (Err(e), ParseMode::Strict) => return Err(e),
                    (Err(_), ParseMode::Tolerant) => {}
                }
            }
            Event::GeneralRef(r) if in_text => {
                if let Some(resolved) = resolve_reference(&r) {
                    push_text(&mut open, &resolved);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !open.is_empty() {
        if mode == ParseMode::Strict {
            return Err(DecodeError::Malformed(format!(
                "{part}: {} unterminated paragraph(s)",
                open.len()
            )));
        }
        completed.extend(open.into_iter().filter(|p| !p.is_empty()));
    }

    Ok(completed)
}

fn push_run_break(open: &mut [String], name: &[u8], run_depth: usize) {
    if run_depth == 0 {
        return;
    }

    match name {
        b"tab" => push_text(open, "\t"),
        b"br" | b"cr" => push_text(open, "\n"),
        _ => {}
    }
}

fn push_text(open: &mut [String], text: &str) {
    if let Some(current) = open.last_mut() {
        current.push_str(text);
    }
}
