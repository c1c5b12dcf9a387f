use quick_xml::Reader;
use quick_xml::events::Event;

use crate::application::ports::{DecodeError, Decoder};

use super::DEFAULT_MAX_DECOMPRESSED_BYTES;
use super::ooxml::{
    Package, attribute_value, open_package, read_part, read_relationships, resolve_reference,
    resolve_target,
};

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PART: &str = "ppt/_rels/presentation.xml.rels";
const PRESENTATION_DIR: &str = "ppt";

/// Reads `.pptx` slides in presentation order. Each shape carrying a text
/// body contributes its paragraphs joined with `\n`; shapes are emitted in
/// document order and joined with `\n`.
#[derive(Debug)]
pub struct PresentationDecoder {
    max_part_bytes: usize,
}

impl PresentationDecoder {
    pub fn new() -> Self {
        Self {
            max_part_bytes: DEFAULT_MAX_DECOMPRESSED_BYTES,
        }
    }

    pub fn with_max_part_bytes(mut self, max_part_bytes: usize) -> Self {
        self.max_part_bytes = max_part_bytes;
        self
    }

    fn slide_parts(&self, package: &mut Package<'_>) -> Result<Vec<String>, DecodeError> {
        let xml = read_part(package, PRESENTATION_PART, self.max_part_bytes)?;
        let relationships =
            read_relationships(package, PRESENTATION_RELS_PART, self.max_part_bytes)?;

        let mut reader = Reader::from_str(&xml);
        let mut parts = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e) | Event::Empty(e)) if e.local_name().as_ref() == b"sldId" => {
                    let Some(rel_id) = attribute_value(&e, "r:id", reader.decoder())? else {
                        continue;
                    };
                    let relationship = relationships
                        .iter()
                        .find(|rel| rel.id == rel_id)
                        .ok_or_else(|| {
                            DecodeError::MissingPart(format!("slide relationship {rel_id}"))
                        })?;
                    parts.push(resolve_target(PRESENTATION_DIR, &relationship.target));
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(DecodeError::Malformed(format!("{PRESENTATION_PART}: {e}")));
                }
            }
        }

        Ok(parts)
    }
}

impl Default for PresentationDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for PresentationDecoder {
    fn name(&self) -> &'static str {
        "presentation"
    }

    #[tracing::instrument(skip(self, content), fields(bytes = content.len()))]
    fn decode(&self, content: &[u8]) -> Result<String, DecodeError> {
        let mut package = open_package(content)?;
        let slides = self.slide_parts(&mut package)?;

        let mut texts = Vec::new();
        for slide in &slides {
            let xml = read_part(&mut package, slide, self.max_part_bytes)?;
            texts.extend(shape_texts(&xml, slide)?);
        }

        tracing::debug!(slide_count = slides.len(), "presentation text extraction complete");

        Ok(texts.join("\n"))
    }
}

#[derive(Default)]
struct ShapeText {
    paragraphs: Vec<String>,
}

impl ShapeText {
    fn push(&mut self, text: &str) {
        if let Some(current) = self.paragraphs.last_mut() {
            current.push_str(text);
        }
    }
}

fn shape_texts(xml: &str, part: &str) -> Result<Vec<String>, DecodeError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut shapes = Vec::new();
    let mut current: Option<ShapeText> = None;
    let mut shape_depth = 0usize;
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| DecodeError::Malformed(format!("{part}: {e}")))?;

        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"sp" => {
                    shape_depth += 1;
                    if shape_depth == 1 {
                        current = None;
                    }
                }
                b"txBody" if shape_depth > 0 => current = Some(ShapeText::default()),
                b"p" => {
                    if let Some(shape) = current.as_mut() {
                        shape.paragraphs.push(String::new());
                    }
                }
                b"t" => in_text = current.is_some(),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(shape) = current.as_mut() {
                        shape.paragraphs.push(String::new());
                    }
                }
                b"br" => {
                    if let Some(shape) = current.as_mut() {
                        shape.push("\n");
                    }
                }
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"sp" => {
                    shape_depth = shape_depth.saturating_sub(1);
                    if let Some(shape) = current.take() {
                        shapes.push(shape.paragraphs.join("\n"));
                    }
                }
                b"t" => in_text = false,
                _ => {}
            },
            Event::Text(t) if in_text => {
                let text = t
                    .decode()
                    .map_err(|e| DecodeError::Malformed(format!("{part}: {e}")))?;
                if let Some(shape) = current.as_mut() {
                    shape.push(&text);
                }
            }
            Event::GeneralRef(r) if in_text => {
                if let (Some(resolved), Some(shape)) = (resolve_reference(&r), current.as_mut()) {
                    shape.push(&resolved);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(shapes)
}
