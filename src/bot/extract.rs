//! Content extraction dispatch for uploaded files.
//!
//! Maps a file's declared media type to an extraction path: OCR for
//! images, whole-document text for PDFs, raw read for plain text. Any
//! other type produces no analysis at all.

use crate::bot::ocr::{OcrEngine, OcrError};
use std::fmt;
use std::path::Path;

/// Extraction path chosen from the attachment kind and declared MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Pdf,
    PlainText,
    Unsupported,
}

impl FileKind {
    /// Photos carry no MIME type and are always images; documents dispatch
    /// on their declared type. The categories are disjoint.
    pub fn classify(is_photo: bool, mime_type: Option<&str>) -> Self {
        if is_photo {
            return FileKind::Image;
        }
        match mime_type {
            Some(m) if m.starts_with("image/") => FileKind::Image,
            Some("application/pdf") => FileKind::Pdf,
            Some("text/plain") => FileKind::PlainText,
            _ => FileKind::Unsupported,
        }
    }
}

/// Outcome of running the chosen extraction path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Text ready to hand to the AI responder.
    Text(String),
    /// The image decoded fine but OCR found no text.
    NoText,
    /// Unsupported type: no extraction branch ran.
    Skipped,
}

#[derive(Debug)]
pub enum ExtractError {
    Ocr(OcrError),
    Pdf(String),
    Io(std::io::Error),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::Ocr(e) => write!(f, "{e}"),
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {e}"),
            ExtractError::Io(e) => write!(f, "failed to read file: {e}"),
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractError::Ocr(e) => Some(e),
            ExtractError::Pdf(_) => None,
            ExtractError::Io(e) => Some(e),
        }
    }
}

impl From<OcrError> for ExtractError {
    fn from(e: OcrError) -> Self {
        ExtractError::Ocr(e)
    }
}

/// Run the extraction path for `kind` on the file at `path`.
pub fn extract(kind: FileKind, path: &Path, ocr: &OcrEngine) -> Result<Extraction, ExtractError> {
    match kind {
        FileKind::Image => {
            let text = ocr.recognize(path)?;
            Ok(image_extraction(text))
        }
        FileKind::Pdf => {
            // pdf-extract walks the whole document, concatenating page text
            let text = pdf_extract::extract_text(path)
                .map_err(|e| ExtractError::Pdf(e.to_string()))?;
            Ok(Extraction::Text(text))
        }
        FileKind::PlainText => {
            let text = std::fs::read_to_string(path).map_err(ExtractError::Io)?;
            Ok(Extraction::Text(text))
        }
        FileKind::Unsupported => Ok(Extraction::Skipped),
    }
}

/// Whitespace-only OCR output means the image carried no readable text;
/// that case must be decided before any AI call is made.
pub fn image_extraction(ocr_text: String) -> Extraction {
    if ocr_text.trim().is_empty() {
        Extraction::NoText
    } else {
        Extraction::Text(ocr_text)
    }
}
