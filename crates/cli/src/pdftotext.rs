//! PDF page source backed by poppler's `pdftotext`.

use std::path::{Path, PathBuf};
use std::process::Command;

use form26as_extract::model::Page;
use form26as_extract::source::split_form_feed;
use form26as_extract::{ExtractError, PageSource};

pub const INSTALL_HINT: &str = "Install with: apt install poppler-utils / brew install poppler";

/// True when `pdftotext` is on PATH.
pub fn available() -> bool {
    which::which("pdftotext").is_ok()
}

pub struct PdftotextSource {
    path: PathBuf,
}

impl PdftotextSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PageSource for PdftotextSource {
    fn load_pages(&self) -> Result<Vec<Page>, ExtractError> {
        let text = run_pdftotext(&self.path)?;
        let pages = split_form_feed(&text);
        log::info!("pdftotext: {} bytes, {} pages from {}", text.len(), pages.len(), self.path.display());
        Ok(pages)
    }
}

fn run_pdftotext(file: &Path) -> Result<String, ExtractError> {
    if !available() {
        return Err(ExtractError::Extraction(
            "pdftotext not installed (poppler-utils)".to_string(),
        ));
    }

    let output = Command::new("pdftotext")
        .arg("-layout")
        .arg(file)
        .arg("-")
        .output()
        .map_err(|e| ExtractError::Extraction(format!("failed to run pdftotext: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExtractError::Extraction(format!(
            "pdftotext failed (exit {}): {}",
            output.status.code().unwrap_or(-1),
            stderr.trim(),
        )));
    }

    let text = String::from_utf8_lossy(&output.stdout).to_string();

    if text.trim().is_empty() {
        return Err(ExtractError::Extraction(
            "PDF appears scanned/image-only; text extraction failed".to_string(),
        ));
    }

    Ok(text)
}
