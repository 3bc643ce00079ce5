//! Application pipeline — one request from raw resume text to finished documents.
//!
//! Flow: validate → optimize resume → generate cover letter → rescore the
//! optimized resume → return everything to the caller in one value.
//!
//! The outcome is request-scoped. Nothing is stashed between runs; whoever
//! called `run_application` decides where the documents go.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::generation::ats_score::AtsScore;
use crate::generation::cover_letter::generate_cover_letter;
use crate::generation::optimizer::ResumeOptimizer;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationRequest {
    pub resume_text: String,
    pub job_description: String,
    #[serde(default)]
    pub extra_info: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationOutcome {
    pub resume: String,
    pub cover_letter: String,
    pub ats_score: AtsScore,
    pub missing_keywords: Vec<String>,
    pub recommendation: String,
}

/// Rejects input the optimizer cannot work with.
pub fn validate_request(request: &ApplicationRequest) -> Result<(), AppError> {
    if request.resume_text.trim().is_empty() {
        return Err(AppError::Validation("resume text cannot be empty".to_string()));
    }
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job description cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Runs the full pipeline. Errors from any stage propagate unchanged.
pub async fn run_application(
    state: &AppState,
    request: &ApplicationRequest,
    cancel: &CancellationToken,
) -> Result<ApplicationOutcome, AppError> {
    validate_request(request)?;
    let extra_info = request.extra_info.as_deref().filter(|s| !s.trim().is_empty());

    info!(
        "Optimizing resume (target {}, up to {} attempts, model {}, worst-case backoff {:?} per call)",
        state.optimize.target_score,
        state.optimize.max_attempts,
        state.llm.model(),
        state.backoff.policy().worst_case_delay()
    );
    let optimizer = ResumeOptimizer::new(
        state.llm.as_ref(),
        &state.backoff,
        state.scorer.as_ref(),
        state.optimize,
    );
    let resume = optimizer
        .optimize(&request.resume_text, &request.job_description, extra_info, cancel)
        .await?;

    // The letter is written from the resume as the candidate supplied it.
    let cover_letter = generate_cover_letter(
        state.llm.as_ref(),
        &state.backoff,
        &request.resume_text,
        &request.job_description,
        extra_info,
        cancel,
    )
    .await?;

    let report = state.scorer.report(&resume, &request.job_description)?;
    info!("Final ATS score: {}", report.score);

    Ok(ApplicationOutcome {
        resume,
        cover_letter,
        ats_score: report.score,
        missing_keywords: report.missing_keywords,
        recommendation: report.recommendation,
    })
}

/// `run_application` under an overall deadline. On expiry the in-flight run is
/// cancelled and `TimedOut` is returned.
pub async fn run_application_with_timeout(
    state: &AppState,
    request: &ApplicationRequest,
    timeout: Option<Duration>,
) -> Result<ApplicationOutcome, AppError> {
    let cancel = CancellationToken::new();

    let Some(timeout) = timeout else {
        return run_application(state, request, &cancel).await;
    };

    match tokio::time::timeout(timeout, run_application(state, request, &cancel)).await {
        Ok(result) => result,
        Err(_) => {
            cancel.cancel();
            warn!("Application run exceeded {}s, cancelled", timeout.as_secs());
            Err(AppError::TimedOut(timeout.as_secs()))
        }
    }
}
