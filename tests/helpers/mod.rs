#![allow(dead_code)]

pub mod test_postgres;

use std::io::{Cursor, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use askdocx::application::ports::{DecodeError, Decoder};
use askdocx::application::services::DecoderSet;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
</Types>"#;

const DOCX_PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

pub fn zip_package(parts: &[(&str, String)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in parts {
        zip.start_file(*name, SimpleFileOptions::default())
            .expect("Failed to start zip entry");
        zip.write_all(body.as_bytes())
            .expect("Failed to write zip entry");
    }
    zip.finish().expect("Failed to finish zip").into_inner()
}

pub fn word_document_xml(paragraphs: &[&str]) -> String {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{p}</w:t></w:r></w:p>"))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{body}</w:body></w:document>"
    )
}

pub fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    zip_package(&[
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", DOCX_PACKAGE_RELS.to_string()),
        ("word/document.xml", word_document_xml(paragraphs)),
    ])
}

/// A Word package lacking `[Content_Types].xml`, which only a tolerant reader accepts.
pub fn docx_without_content_types(paragraphs: &[&str]) -> Vec<u8> {
    zip_package(&[
        ("_rels/.rels", DOCX_PACKAGE_RELS.to_string()),
        ("word/document.xml", word_document_xml(paragraphs)),
    ])
}

/// A Word package whose body part is cut off after the given paragraphs.
pub fn docx_with_truncated_body(paragraphs: &[&str]) -> Vec<u8> {
    let mut xml = word_document_xml(paragraphs);
    let cut = xml.rfind("</w:body>").expect("body end present");
    xml.truncate(cut);
    xml.push_str("<w:p><w:r><w:t>dangling");

    zip_package(&[
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", DOCX_PACKAGE_RELS.to_string()),
        ("word/document.xml", xml),
    ])
}

fn slide_xml(shapes: &[&[&str]]) -> String {
    let shapes: String = shapes
        .iter()
        .map(|paragraphs| {
            let paragraphs: String = paragraphs
                .iter()
                .map(|p| format!("<a:p><a:r><a:t>{p}</a:t></a:r></a:p>"))
                .collect();
            format!("<p:sp><p:nvSpPr/><p:txBody><a:bodyPr/>{paragraphs}</p:txBody></p:sp>")
        })
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <p:sld xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" \
         xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\">\
         <p:cSld><p:spTree><p:pic/>{shapes}</p:spTree></p:cSld></p:sld>"
    )
}

/// Builds a presentation; `slides[i]` lists the shapes of slide `i`, each as
/// its paragraphs. Slide parts are numbered in reverse so that ordering has
/// to come from `presentation.xml`.
pub fn pptx_bytes(slides: &[&[&[&str]]]) -> Vec<u8> {
    let count = slides.len();
    let part_number = |index: usize| count - index;

    let slide_ids: String = (0..count)
        .map(|i| format!("<p:sldId id=\"{}\" r:id=\"rId{}\"/>", 256 + i, i + 10))
        .collect();
    let relationships: String = (0..count)
        .map(|i| {
            format!(
                "<Relationship Id=\"rId{}\" \
                 Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide\" \
                 Target=\"slides/slide{}.xml\"/>",
                i + 10,
                part_number(i)
            )
        })
        .collect();

    let mut parts = vec![
        ("[Content_Types].xml".to_string(), CONTENT_TYPES.to_string()),
        (
            "ppt/presentation.xml".to_string(),
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
                 <p:presentation xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\" \
                 xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
                 <p:sldIdLst>{slide_ids}</p:sldIdLst></p:presentation>"
            ),
        ),
        (
            "ppt/_rels/presentation.xml.rels".to_string(),
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
                 <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
                 {relationships}</Relationships>"
            ),
        ),
    ];
    for (i, shapes) in slides.iter().enumerate() {
        parts.push((
            format!("ppt/slides/slide{}.xml", part_number(i)),
            slide_xml(shapes),
        ));
    }

    let borrowed: Vec<(&str, String)> = parts
        .iter()
        .map(|(name, body)| (name.as_str(), body.clone()))
        .collect();
    zip_package(&borrowed)
}

fn pdf_with_page_contents(pages: Vec<Content>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let page_count = pages.len() as i64;
    let kids: Vec<Object> = pages
        .into_iter()
        .map(|content| {
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("Failed to encode content"),
            ));
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            })
            .into()
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("Failed to save PDF");
    buffer
}

pub fn pdf_bytes(page_texts: &[&str]) -> Vec<u8> {
    let pages = page_texts
        .iter()
        .map(|text| Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        })
        .collect();
    pdf_with_page_contents(pages)
}

/// Pages that only paint graphics, as a scanned document would.
pub fn image_only_pdf_bytes(page_count: usize) -> Vec<u8> {
    let pages = (0..page_count)
        .map(|_| Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "re",
                    vec![0.into(), 0.into(), 595.into(), 842.into()],
                ),
                Operation::new("f", vec![]),
                Operation::new("Q", vec![]),
            ],
        })
        .collect();
    pdf_with_page_contents(pages)
}

const TEXT_OFFSET: usize = 0x800;

/// A minimal Word 97 binary file holding `text` as one compressed piece.
pub fn word97_bytes(text: &str) -> Vec<u8> {
    let encoded: Vec<u8> = text.chars().map(|c| c as u8).collect();

    let mut word_document = vec![0u8; TEXT_OFFSET];
    word_document[0..2].copy_from_slice(&0xA5ECu16.to_le_bytes());
    word_document[0x0A..0x0C].copy_from_slice(&0x0200u16.to_le_bytes());
    word_document[0x4C..0x50].copy_from_slice(&(encoded.len() as u32).to_le_bytes());
    word_document[0x1A2..0x1A6].copy_from_slice(&0u32.to_le_bytes());
    word_document[0x1A6..0x1AA].copy_from_slice(&21u32.to_le_bytes());
    word_document.extend_from_slice(&encoded);

    let fc = ((TEXT_OFFSET * 2) as u32) | 0x4000_0000;
    let mut table = vec![0x02];
    table.extend_from_slice(&16u32.to_le_bytes());
    table.extend_from_slice(&0u32.to_le_bytes());
    table.extend_from_slice(&(encoded.len() as u32).to_le_bytes());
    table.extend_from_slice(&0u16.to_le_bytes());
    table.extend_from_slice(&fc.to_le_bytes());
    table.extend_from_slice(&0u16.to_le_bytes());

    compound_file(&[("/WordDocument", word_document), ("/1Table", table)])
}

pub fn compound_file(streams: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut compound =
        cfb::CompoundFile::create(Cursor::new(Vec::new())).expect("Failed to create compound file");
    for (path, data) in streams {
        let mut stream = compound
            .create_stream(path)
            .expect("Failed to create stream");
        stream.write_all(data).expect("Failed to write stream");
    }
    compound.flush().expect("Failed to flush compound file");
    compound.into_inner().into_inner()
}

pub fn xlsx_bytes(sheets: &[(&str, &[&[&str]])]) -> Vec<u8> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).expect("Failed to name worksheet");
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if !cell.is_empty() {
                    worksheet
                        .write_string(r as u32, c as u16, *cell)
                        .expect("Failed to write cell");
                }
            }
        }
    }
    workbook.save_to_buffer().expect("Failed to save workbook")
}

/// Decoder that records how often it ran and returns a fixed outcome.
pub struct SpyDecoder {
    name: &'static str,
    outcome: Result<String, DecodeError>,
    calls: AtomicUsize,
}

impl SpyDecoder {
    pub fn succeeding(name: &'static str, text: &str) -> Arc<Self> {
        Arc::new(Self {
            name,
            outcome: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(name: &'static str, cause: DecodeError) -> Arc<Self> {
        Arc::new(Self {
            name,
            outcome: Err(cause),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Decoder for SpyDecoder {
    fn name(&self) -> &'static str {
        self.name
    }

    fn decode(&self, _content: &[u8]) -> Result<String, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// A decoder set where every format uses the same single decoder.
pub fn uniform_decoder_set(decoder: Arc<SpyDecoder>) -> DecoderSet {
    let decoder: Arc<dyn Decoder> = decoder;
    let chain = || vec![Arc::clone(&decoder)];
    DecoderSet {
        pdf: chain(),
        docx: chain(),
        doc: chain(),
        plain_text: chain(),
        spreadsheet: chain(),
        presentation: chain(),
    }
}
