use std::io::{self, Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::application::ports::DecodeError;

pub(super) type Package<'a> = ZipArchive<Cursor<&'a [u8]>>;

pub(super) struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

pub(super) fn open_package(content: &[u8]) -> Result<Package<'_>, DecodeError> {
    ZipArchive::new(Cursor::new(content))
        .map_err(|e| DecodeError::Malformed(format!("not a readable zip package: {e}")))
}

pub(super) fn has_part(package: &Package<'_>, name: &str) -> bool {
    package.file_names().any(|candidate| candidate == name)
}

/// Reads one part as text, refusing parts that inflate beyond `max_bytes`.
/// The declared size is checked first and the actual stream is capped as
/// well, since the header may understate it.
pub(super) fn read_part(
    package: &mut Package<'_>,
    name: &str,
    max_bytes: usize,
) -> Result<String, DecodeError> {
    let mut file = package.by_name(name).map_err(|e| match e {
        ZipError::FileNotFound => DecodeError::MissingPart(name.to_string()),
        other => DecodeError::Malformed(format!("{name}: {other}")),
    })?;

    if file.size() > max_bytes as u64 {
        return Err(oversized(name, max_bytes));
    }

    let mut bytes = Vec::new();
    file.by_ref()
        .take(max_bytes as u64 + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| DecodeError::Malformed(format!("{name}: {e}")))?;

    if bytes.len() > max_bytes {
        return Err(oversized(name, max_bytes));
    }

    String::from_utf8(bytes).map_err(|e| DecodeError::Malformed(format!("{name}: {e}")))
}

/// Inflates every entry into a sink and fails on the first one larger than
/// `max_bytes`. Used ahead of readers that inflate parts on their own.
pub(super) fn ensure_parts_within(content: &[u8], max_bytes: usize) -> Result<(), DecodeError> {
    let mut package = open_package(content)?;

    for index in 0..package.len() {
        let mut file = package
            .by_index(index)
            .map_err(|e| DecodeError::Malformed(format!("entry {index}: {e}")))?;
        let name = file.name().to_string();

        if file.size() > max_bytes as u64 {
            return Err(oversized(&name, max_bytes));
        }

        let inflated = io::copy(&mut file.by_ref().take(max_bytes as u64 + 1), &mut io::sink())
            .map_err(|e| DecodeError::Malformed(format!("{name}: {e}")))?;
        if inflated > max_bytes as u64 {
            return Err(oversized(&name, max_bytes));
        }
    }

    Ok(())
}

fn oversized(name: &str, max_bytes: usize) -> DecodeError {
    DecodeError::Unsupported(format!("{name} inflates beyond {max_bytes} bytes"))
}

/// Parses a `.rels` part into its relationship entries.
pub(super) fn read_relationships(
    package: &mut Package<'_>,
    rels_name: &str,
    max_bytes: usize,
) -> Result<Vec<Relationship>, DecodeError> {
    let xml = read_part(package, rels_name, max_bytes)?;
    let mut reader = Reader::from_str(&xml);
    let mut relationships = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) if e.local_name().as_ref() == b"Relationship" => {
                let decoder = reader.decoder();
                let attribute = |key: &str| -> Result<String, DecodeError> {
                    attribute_value(&e, key, decoder)?.ok_or_else(|| {
                        DecodeError::Malformed(format!("{rels_name}: relationship without {key}"))
                    })
                };
                relationships.push(Relationship {
                    id: attribute("Id")?,
                    rel_type: attribute("Type")?,
                    target: attribute("Target")?,
                });
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(DecodeError::Malformed(format!("{rels_name}: {e}"))),
        }
    }

    Ok(relationships)
}

pub(super) fn attribute_value(
    element: &BytesStart<'_>,
    key: &str,
    decoder: quick_xml::encoding::Decoder,
) -> Result<Option<String>, DecodeError> {
    let attribute = element
        .try_get_attribute(key)
        .map_err(|e| DecodeError::Malformed(e.to_string()))?;

    attribute
        .map(|a| {
            a.decode_and_unescape_value(decoder)
                .map(|value| value.into_owned())
                .map_err(|e| DecodeError::Malformed(e.to_string()))
        })
        .transpose()
}

/// Resolves a relationship target against the folder of its source part.
pub(super) fn resolve_target(source_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = source_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Resolves an entity or character reference met inside text content.
pub(super) fn resolve_reference(reference: &quick_xml::events::BytesRef<'_>) -> Option<String> {
    if let Ok(Some(ch)) = reference.resolve_char_ref() {
        return Some(ch.to_string());
    }

    let name = reference.decode().ok()?;
    quick_xml::escape::resolve_predefined_entity(&name).map(str::to_string)
}
