use crate::error::SearchError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FileKind {
    Text,
    Pdf,
}

impl FileKind {
    /// Resolves the kind from a file name's extension, ignoring case.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())?;

        if extension.eq_ignore_ascii_case("txt") {
            Some(Self::Text)
        } else if extension.eq_ignore_ascii_case("pdf") {
            Some(Self::Pdf)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    pub file_name: String,
    pub checksum: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub embedding: Vec<f32>,
    pub text: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RetrievalMode {
    /// Every stored document text becomes context.
    AllDocuments,
    /// Only the `top_k` documents closest to the question embedding.
    Nearest { top_k: usize },
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub retrieval: RetrievalMode,
    pub context_separator: &'static str,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            retrieval: RetrievalMode::Nearest { top_k: 3 },
            context_separator: "\n\n",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroundedAnswer {
    pub context: String,
    pub prompt: String,
    pub answer: String,
    /// File names for document answers, empty for web answers.
    pub sources: Vec<String>,
}

#[derive(Debug)]
pub enum WebQueryOutcome {
    Answered(GroundedAnswer),
    NoResults,
    SearchUnavailable(SearchError),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::FileKind;

    #[test]
    fn file_kind_ignores_extension_case() {
        assert_eq!(FileKind::from_file_name("notes.TXT"), Some(FileKind::Text));
        assert_eq!(FileKind::from_file_name("manual.Pdf"), Some(FileKind::Pdf));
    }

    #[test]
    fn file_kind_rejects_unknown_or_missing_extension() {
        assert_eq!(FileKind::from_file_name("slides.pptx"), None);
        assert_eq!(FileKind::from_file_name("README"), None);
    }
}
