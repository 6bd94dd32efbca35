//! Image text extraction using Tesseract.
//!
//! Decodes the downloaded file with the `image` crate, then feeds the raw
//! RGB buffer to Tesseract for recognition.

use std::fmt;
use std::path::{Path, PathBuf};
use tesseract_rs::TesseractAPI;
use tracing::debug;

#[derive(Debug)]
pub enum OcrError {
    /// The file could not be decoded as an image.
    Decode(image::ImageError),
    /// Tesseract failed to initialize or recognize.
    Engine(String),
}

impl fmt::Display for OcrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OcrError::Decode(e) => write!(f, "failed to decode image: {e}"),
            OcrError::Engine(e) => write!(f, "OCR engine error: {e}"),
        }
    }
}

impl std::error::Error for OcrError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OcrError::Decode(e) => Some(e),
            OcrError::Engine(_) => None,
        }
    }
}

/// Tesseract OCR engine configuration.
pub struct OcrEngine {
    tessdata_dir: Option<PathBuf>,
}

impl OcrEngine {
    /// When `tessdata_dir` is unset, the TESSDATA_PREFIX environment
    /// variable decides where the language data lives.
    pub fn new(tessdata_dir: Option<PathBuf>) -> Self {
        Self { tessdata_dir }
    }

    fn datapath(&self) -> String {
        self.tessdata_dir
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| std::env::var("TESSDATA_PREFIX").unwrap_or_default())
    }

    /// Extract text from the image at `path`.
    pub fn recognize(&self, path: &Path) -> Result<String, OcrError> {
        let img = image::open(path).map_err(OcrError::Decode)?.to_rgb8();
        let (width, height) = img.dimensions();
        debug!("Running OCR on {:?} ({}x{})", path, width, height);

        // The API handle is cheap; create one per recognition so nothing
        // non-Send is held across handler suspension points.
        let api = TesseractAPI::new();
        api.init(&self.datapath(), "eng")
            .map_err(|e| OcrError::Engine(e.to_string()))?;
        api.set_image(
            img.as_raw(),
            width as i32,
            height as i32,
            3,
            3 * width as i32,
        )
        .map_err(|e| OcrError::Engine(e.to_string()))?;

        api.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
    }
}
