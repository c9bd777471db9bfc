use crate::error::IngestError;
use crate::models::FileKind;
use lopdf::Document;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

pub trait PdfExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<PageText>, IngestError>;
}

#[derive(Default)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<PageText>, IngestError> {
        let document =
            Document::load_mem(bytes).map_err(|error| IngestError::PdfParse(error.to_string()))?;

        let mut pages = Vec::new();
        for (page_no, _page_id) in document.get_pages() {
            // A page that cannot be decoded is skipped, not fatal.
            let Ok(text) = document.extract_text(&[page_no]) else {
                debug!(page = page_no, "page text not extractable");
                continue;
            };

            let text = text.trim();
            if !text.is_empty() {
                pages.push(PageText {
                    number: page_no,
                    text: text.to_string(),
                });
            }
        }

        Ok(pages)
    }
}

/// Flattens page texts into one line of text: newlines become spaces and pages
/// are joined by a single space.
pub fn join_pages(pages: &[PageText]) -> String {
    pages
        .iter()
        .map(|page| page.text.trim().replace('\n', " "))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn extract_text(file_name: &str, bytes: &[u8]) -> Result<String, IngestError> {
    extract_text_with(&LopdfExtractor, file_name, bytes)
}

pub fn extract_text_with<P: PdfExtractor + ?Sized>(
    pdf: &P,
    file_name: &str,
    bytes: &[u8],
) -> Result<String, IngestError> {
    let kind = FileKind::from_file_name(file_name)
        .ok_or_else(|| IngestError::UnsupportedFormat(file_name.to_string()))?;

    let text = match kind {
        FileKind::Text => String::from_utf8(bytes.to_vec())?,
        FileKind::Pdf => {
            let pages = pdf.extract_pages(bytes)?;
            debug!(
                file_name,
                pages = ?pages.iter().map(|page| page.number).collect::<Vec<_>>(),
                "pdf pages with text"
            );
            join_pages(&pages)
        }
    };

    if text.trim().is_empty() {
        return Err(IngestError::EmptyDocument(file_name.to_string()));
    }

    Ok(text)
}
