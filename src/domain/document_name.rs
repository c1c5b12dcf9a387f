use std::fmt;

const MAX_NAME_CHARS: usize = 255;

/// Display name of an uploaded file, reduced to its final path component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentName(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("filename {0:?} has no usable characters")]
pub struct InvalidDocumentName(pub String);

impl DocumentName {
    /// Strips directory components, control characters and leading dots from
    /// an uploaded filename. Overlong names keep their extension.
    pub fn parse(raw: &str) -> Result<Self, InvalidDocumentName> {
        let last_component = raw.rsplit(['/', '\\']).next().unwrap_or_default();
        let without_controls: String = last_component
            .chars()
            .filter(|c| !c.is_control())
            .collect();
        let cleaned = without_controls
            .trim()
            .trim_start_matches('.')
            .trim_start();

        if cleaned.is_empty() {
            return Err(InvalidDocumentName(raw.to_string()));
        }

        Ok(Self(truncate_keeping_extension(cleaned, MAX_NAME_CHARS)))
    }

    /// Rehydrates a name that was sanitized before it was persisted.
    pub fn from_stored(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn truncate_keeping_extension(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name.to_string();
    }

    match name.rsplit_once('.') {
        Some((stem, extension)) if extension.chars().count() < max_chars / 2 => {
            let stem_budget = max_chars - extension.chars().count() - 1;
            let stem: String = stem.chars().take(stem_budget).collect();
            format!("{}.{}", stem, extension)
        }
        _ => name.chars().take(max_chars).collect(),
    }
}

impl fmt::Display for DocumentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
