//! Document sources: page text keyed by a document id.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One document's already-extracted page text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

impl<I: Into<String>, T: Into<String>> From<(I, T)> for Document {
    fn from((id, text): (I, T)) -> Self {
        Self::new(id, text)
    }
}

/// Reads documents from a directory, ordered by file name.
#[derive(Debug, Clone)]
pub struct DocumentSource {
    dir: PathBuf,
    extensions: Vec<String>,
}

impl DocumentSource {
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extensions: vec!["txt".to_string(), "pdf".to_string()],
        }
    }

    /// Restrict the accepted file extensions (case-insensitive).
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions.into_iter().map(|e| e.to_lowercase()).collect();
        self
    }

    /// Matching files in name order.
    pub fn files(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .filter(|p| {
                let ext = p
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("")
                    .to_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            })
            .collect();
        files.sort();
        Ok(files)
    }

    /// Load every matching document.
    ///
    /// A file that cannot be read becomes a document with empty text, so
    /// the batch reports it instead of stopping.
    pub fn load(&self) -> std::io::Result<Vec<Document>> {
        let files = self.files()?;
        debug!("{} documents in {}", files.len(), self.dir.display());
        Ok(files.iter().map(|p| read_document(p)).collect())
    }
}

/// Document id used for a path: its file name.
pub fn document_id(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

/// Read one file's text; unreadable files yield empty text.
pub fn read_document(path: &Path) -> Document {
    let id = document_id(path);
    let text = match read_text(path) {
        Ok(text) => text,
        Err(e) => {
            warn!("Could not read {}: {}", path.display(), e);
            String::new()
        }
    };
    Document { id, text }
}

fn read_text(path: &Path) -> Result<String, String> {
    let bytes = fs::read(path).map_err(|e| e.to_string())?;
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        pdf_text(&bytes)
    } else {
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(feature = "pdf")]
fn pdf_text(bytes: &[u8]) -> Result<String, String> {
    // pdf-extract panics on some malformed files.
    std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| "PDF text extraction panicked".to_string())?
        .map_err(|e| e.to_string())
}

#[cfg(not(feature = "pdf"))]
fn pdf_text(_bytes: &[u8]) -> Result<String, String> {
    Err("PDF support not enabled".to_string())
}
