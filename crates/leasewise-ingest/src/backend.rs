//! Ordered document-text extraction backends
//!
//! Each backend turns a file into page-level text. [`BackendSelector`]
//! tries them in order and keeps the first result with at least one
//! non-empty page, tagged with the name of the backend that produced it.

use crate::error::ExtractionError;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::{debug, info, warn};

/// One way of reading page text out of a file
pub trait PageExtractor: Send + Sync {
    /// Backend name recorded in chunk provenance
    fn name(&self) -> &'static str;

    /// Extract text, one entry per page
    fn extract(&self, path: &Path) -> Result<Vec<String>, ExtractionError>;
}

/// Page text plus the backend that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPages {
    /// Text of each page, in order
    pub pages: Vec<String>,
    /// Name of the winning backend
    pub backend: &'static str,
}

fn read_pdf(path: &Path, backend: &'static str) -> Result<Vec<u8>, ExtractionError> {
    let bytes = fs::read(path).map_err(|e| ExtractionError::io(path, e))?;
    if !bytes.starts_with(b"%PDF") {
        return Err(ExtractionError::backend(backend, "not a PDF file"));
    }
    Ok(bytes)
}

/// Primary PDF backend built on `pdf-extract`
///
/// Pages are split on form feeds when the producer emits them; otherwise
/// the whole document comes back as a single page.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractBackend;

impl PageExtractor for PdfExtractBackend {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn extract(&self, path: &Path) -> Result<Vec<String>, ExtractionError> {
        let bytes = read_pdf(path, self.name())?;

        // pdf-extract panics on some malformed font tables
        let text = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(&bytes)
        }))
        .map_err(|_| ExtractionError::backend(self.name(), "extractor panicked"))?
        .map_err(|e| ExtractionError::backend(self.name(), e.to_string()))?;

        Ok(text.split('\u{000C}').map(str::to_string).collect())
    }
}

/// Fallback PDF backend reading each page through `lopdf`
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfBackend;

impl PageExtractor for LopdfBackend {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn extract(&self, path: &Path) -> Result<Vec<String>, ExtractionError> {
        let bytes = read_pdf(path, self.name())?;
        let document = lopdf::Document::load_mem(&bytes)
            .map_err(|e| ExtractionError::backend(self.name(), format!("failed to load PDF: {}", e)))?;

        let mut pages = Vec::new();
        for page_number in document.get_pages().keys() {
            match document.extract_text(&[*page_number]) {
                Ok(text) => pages.push(text),
                Err(e) => {
                    debug!("lopdf could not read page {}: {}", page_number, e);
                    pages.push(String::new());
                }
            }
        }
        Ok(pages)
    }
}

/// Backend for plain-text and Markdown files, read as a single page
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextBackend;

impl PlainTextBackend {
    const EXTENSIONS: [&'static str; 4] = ["txt", "text", "md", "markdown"];
}

impl PageExtractor for PlainTextBackend {
    fn name(&self) -> &'static str {
        "plain-text"
    }

    fn extract(&self, path: &Path) -> Result<Vec<String>, ExtractionError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !Self::EXTENSIONS.contains(&extension.as_str()) {
            return Err(ExtractionError::backend(
                self.name(),
                format!("unsupported extension '{}'", extension),
            ));
        }

        let text = fs::read_to_string(path).map_err(|e| ExtractionError::io(path, e))?;
        Ok(vec![text])
    }
}

/// Tries extraction backends in order until one yields text
pub struct BackendSelector {
    backends: Vec<Box<dyn PageExtractor>>,
}

impl BackendSelector {
    /// Use the given backends, in order
    pub fn new(backends: Vec<Box<dyn PageExtractor>>) -> Self {
        Self { backends }
    }

    /// Names of the configured backends, in order
    pub fn names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Extract page text with the first backend that produces any
    ///
    /// # Errors
    ///
    /// - [`ExtractionError::FileNotFound`] when the path does not exist
    /// - [`ExtractionError::AllBackendsFailed`] when every backend errors or
    ///   returns only empty pages
    pub fn extract(&self, path: &Path) -> Result<ExtractedPages, ExtractionError> {
        if !path.exists() {
            return Err(ExtractionError::FileNotFound(path.to_path_buf()));
        }

        let mut attempts = Vec::with_capacity(self.backends.len());
        for backend in &self.backends {
            match backend.extract(path) {
                Ok(pages) if pages.iter().any(|p| !p.trim().is_empty()) => {
                    info!(
                        "Extracted {} page(s) from {} with {}",
                        pages.len(),
                        path.display(),
                        backend.name()
                    );
                    return Ok(ExtractedPages {
                        pages,
                        backend: backend.name(),
                    });
                }
                Ok(_) => {
                    warn!("{} produced no text for {}", backend.name(), path.display());
                    attempts.push(format!("{}: no text", backend.name()));
                }
                Err(ExtractionError::FileNotFound(missing)) => {
                    return Err(ExtractionError::FileNotFound(missing));
                }
                Err(e) => {
                    debug!("{} could not read {}: {}", backend.name(), path.display(), e);
                    attempts.push(e.to_string());
                }
            }
        }

        Err(ExtractionError::AllBackendsFailed {
            path: path.to_path_buf(),
            attempts,
        })
    }
}

impl Default for BackendSelector {
    /// `pdf-extract`, then `lopdf`, then plain text
    fn default() -> Self {
        Self::new(vec![
            Box::new(PdfExtractBackend),
            Box::new(LopdfBackend),
            Box::new(PlainTextBackend),
        ])
    }
}
