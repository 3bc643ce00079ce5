//! Text extraction — turns a resume file into a single string.
//!
//! The format is picked from the file extension. Pages and paragraphs come
//! back joined by `\n`. Unsupported formats fail with `UnsupportedFormat`
//! before any completion call is made.

use std::path::{Path, PathBuf};

use docx_rs::{DocumentChild, Paragraph, ParagraphChild, RunChild};
use tracing::info;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("pdf") => Ok(DocumentFormat::Pdf),
            Some("docx") => Ok(DocumentFormat::Docx),
            Some("txt") | Some("md") | Some("text") => Ok(DocumentFormat::PlainText),
            _ => Err(AppError::UnsupportedFormat(format!(
                "{} (supported: .pdf, .docx, .txt, .md)",
                path.display()
            ))),
        }
    }
}

/// Reads the full text of a resume document.
pub async fn extract_text(path: &Path) -> Result<String, AppError> {
    let format = DocumentFormat::from_path(path)?;

    let raw = match format {
        DocumentFormat::PlainText => tokio::fs::read_to_string(path).await?,
        DocumentFormat::Pdf => extract_pdf(path.to_path_buf()).await?,
        DocumentFormat::Docx => extract_docx(tokio::fs::read(path).await?, path).await?,
    };

    let text = normalize_newlines(&raw);
    info!(
        "Extracted {} chars from {} ({:?})",
        text.len(),
        path.display(),
        format
    );
    Ok(text)
}

async fn extract_pdf(path: PathBuf) -> Result<String, AppError> {
    let display = path.display().to_string();
    tokio::task::spawn_blocking(move || pdf_extract::extract_text(&path))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF extraction task failed: {e}")))?
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to read PDF {display}: {e}")))
}

/// Top-level paragraphs of the document body, one per line.
async fn extract_docx(bytes: Vec<u8>, path: &Path) -> Result<String, AppError> {
    let display = path.display().to_string();
    tokio::task::spawn_blocking(move || docx_paragraphs(&bytes))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("DOCX extraction task failed: {e}")))?
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to read DOCX {display}: {e}")))
}

fn docx_paragraphs(bytes: &[u8]) -> Result<String, docx_rs::ReaderError> {
    let docx = docx_rs::read_docx(bytes)?;

    let lines: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(paragraph) => Some(paragraph_text(paragraph)),
            _ => None,
        })
        .collect();

    Ok(lines.join("\n"))
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                match run_child {
                    RunChild::Text(t) => text.push_str(&t.text),
                    RunChild::Tab(_) => text.push('\t'),
                    _ => {}
                }
            }
        }
    }
    text
}

/// CRLF and page breaks become `\n`; trailing whitespace is dropped.
fn normalize_newlines(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .replace(['\r', '\u{c}'], "\n")
        .trim_end()
        .to_string()
}
