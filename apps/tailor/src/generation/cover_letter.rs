//! Cover Letter Generator — single backoff-guarded completion, trimmed.

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::errors::AppError;
use crate::generation::prompts::{COVER_LETTER_PROMPT_TEMPLATE, COVER_LETTER_SYSTEM};
use crate::llm_client::backoff::BackoffCaller;
use crate::llm_client::prompts::{fill_template, FACTUALITY_INSTRUCTION, PLAIN_TEXT_ONLY_SYSTEM};
use crate::llm_client::{complete_text, CompletionService};

/// Generates a cover letter from the resume as supplied by the caller.
/// Failures propagate unchanged, same as the optimizer.
pub async fn generate_cover_letter(
    llm: &dyn CompletionService,
    backoff: &BackoffCaller,
    resume_text: &str,
    job_description: &str,
    extra_info: Option<&str>,
    cancel: &CancellationToken,
) -> Result<String, AppError> {
    let prompt = build_cover_letter_prompt(resume_text, job_description, extra_info);
    let system = format!("{COVER_LETTER_SYSTEM} {PLAIN_TEXT_ONLY_SYSTEM}");

    let letter = complete_text(llm, backoff, cancel, &system, &prompt).await?;
    info!("Cover letter generated ({} chars)", letter.len());

    Ok(letter)
}

pub fn build_cover_letter_prompt(
    resume_text: &str,
    job_description: &str,
    extra_info: Option<&str>,
) -> String {
    fill_template(
        COVER_LETTER_PROMPT_TEMPLATE,
        &[
            ("factuality_instruction", FACTUALITY_INSTRUCTION),
            ("resume_text", resume_text),
            ("job_description", job_description),
            ("extra_info", extra_info.unwrap_or("")),
        ],
    )
}
