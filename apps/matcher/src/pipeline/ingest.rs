//! Ingest: uploaded or on-disk files → `InputDocument`.
//!
//! PDF text comes from `pdf-extract`; `.txt` and `.md` are read as UTF-8.
//! PDF parsing is CPU-bound and runs inside `tokio::task::spawn_blocking`.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{DocType, InputDocument};

pub const MAX_FILE_BYTES: usize = 5 * 1024 * 1024;
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt", "md"];

fn bullet_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*[-*•]\s+").expect("valid bullet regex"))
}

/// Lowercased extension of `file_name` if it is one we can read.
pub fn supported_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    SUPPORTED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Strips bullet markers, replaces non-ASCII with spaces, collapses whitespace.
pub fn clean_text(raw: &str) -> String {
    let unbulleted = bullet_regex().replace_all(raw, "");
    let ascii: String = unbulleted
        .chars()
        .map(|c| if c.is_ascii() { c } else { ' ' })
        .collect();
    ascii.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub async fn ingest_file(path: &Path, doc_type: DocType) -> Result<InputDocument, AppError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::Validation(format!("Invalid file path {}", path.display())))?
        .to_string();

    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|_| AppError::Validation(format!("File not found: {}", path.display())))?;
    if meta.len() > MAX_FILE_BYTES as u64 {
        return Err(too_large(&file_name));
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::Storage(format!("Cannot read {}: {e}", path.display())))?;
    ingest_bytes(&file_name, bytes, doc_type).await
}

pub async fn ingest_bytes(
    file_name: &str,
    bytes: Vec<u8>,
    doc_type: DocType,
) -> Result<InputDocument, AppError> {
    if bytes.len() > MAX_FILE_BYTES {
        return Err(too_large(file_name));
    }
    let ext = supported_extension(file_name).ok_or_else(|| {
        AppError::Validation(format!(
            "Unsupported file format for '{file_name}'. Only .pdf, .txt or .md files are allowed."
        ))
    })?;

    let size_mb = bytes.len() as f64 / (1024.0 * 1024.0);
    let raw = match ext.as_str() {
        "pdf" => extract_pdf_text(bytes).await?,
        _ => String::from_utf8(bytes)
            .map_err(|_| AppError::Validation(format!("'{file_name}' is not valid UTF-8 text")))?,
    };

    let text = clean_text(&raw);
    if text.is_empty() {
        return Err(AppError::Validation(format!(
            "No text could be extracted from '{file_name}'"
        )));
    }

    let doc = InputDocument {
        doc_id: Uuid::new_v4().to_string(),
        doc_type,
        word_count: text.split_whitespace().count(),
        text,
        file_name: Some(file_name.to_string()),
        file_size_mb: (size_mb * 100.0).round() / 100.0,
        job_title: None,
        company: None,
    };
    info!(
        doc_id = %doc.doc_id,
        doc_type = %doc_type,
        file = file_name,
        words = doc.word_count,
        "Extracted document text"
    );
    Ok(doc)
}

async fn extract_pdf_text(bytes: Vec<u8>) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in PDF extraction: {e}")))?
        .map_err(|e| AppError::Validation(format!("Unreadable PDF: {e}")))
}

fn too_large(file_name: &str) -> AppError {
    AppError::Validation(format!("'{file_name}' exceeds the 5MB size limit"))
}
