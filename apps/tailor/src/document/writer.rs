//! Document output: one line of content per line of a text file, or one
//! paragraph per line when the target ends in `.docx`.

use std::io::Cursor;
use std::path::Path;

use docx_rs::{AlignmentType, Docx, Paragraph, Run, RunFonts};
use tracing::info;

use crate::errors::AppError;

const DOCX_FONT: &str = "Times New Roman";
/// docx sizes are in half-points.
const DOCX_FONT_SIZE: usize = 24;

/// Writes `content` to `path`, overwriting any existing file.
pub async fn write_document(path: &Path, content: &str) -> Result<(), AppError> {
    let lines: Vec<&str> = content.lines().map(str::trim_end).collect();

    let is_docx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("docx"));

    let body = if is_docx {
        build_docx(&lines)?
    } else {
        let mut text = lines.join("\n");
        text.push('\n');
        text.into_bytes()
    };

    tokio::fs::write(path, body).await?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn build_docx(lines: &[&str]) -> Result<Vec<u8>, AppError> {
    let docx = lines.iter().fold(Docx::new(), |docx, line| {
        let run = Run::new()
            .add_text(*line)
            .fonts(RunFonts::new().ascii(DOCX_FONT).hi_ansi(DOCX_FONT))
            .size(DOCX_FONT_SIZE);
        docx.add_paragraph(Paragraph::new().add_run(run).align(AlignmentType::Left))
    });

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build DOCX: {e}")))?;
    Ok(buf.into_inner())
}
