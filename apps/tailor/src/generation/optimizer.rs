//! Resume Optimizer — iterative rewrite loop against a target ATS score.
//!
//! Flow per attempt: build prompt from the *current* candidate → completion
//! (via the backoff caller) → trim → score → stop if score ≥ target.
//! Each attempt rewrites the previous attempt's output, not the original resume.
//!
//! The loop is best-effort: running out of attempts is not an error, the last
//! candidate is returned whatever it scored. Errors from the completion
//! service propagate unchanged.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::generation::ats_score::{AtsScore, AtsScorer};
use crate::generation::prompts::{RESUME_REWRITE_PROMPT_TEMPLATE, RESUME_REWRITE_SYSTEM};
use crate::llm_client::backoff::BackoffCaller;
use crate::llm_client::prompts::{fill_template, FACTUALITY_INSTRUCTION, PLAIN_TEXT_ONLY_SYSTEM};
use crate::llm_client::{complete_text, CompletionService};

pub const DEFAULT_TARGET_SCORE: f64 = 80.0;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizeSettings {
    pub target_score: f64,
    pub max_attempts: u32,
}

impl Default for OptimizeSettings {
    fn default() -> Self {
        Self {
            target_score: DEFAULT_TARGET_SCORE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// A target must be a finite score in [0, 100].
pub fn check_target_score(target: f64) -> Result<f64, AppError> {
    if (0.0..=100.0).contains(&target) {
        Ok(target)
    } else {
        Err(AppError::Validation(format!(
            "target score must be between 0 and 100, got {target}"
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerState {
    Start,
    Generating { attempt: u32 },
    Scoring { attempt: u32 },
    Done,
}

/// Result of one loop iteration. Only the last one survives the run.
#[derive(Debug, Clone)]
pub struct OptimizationAttempt {
    /// 1-based; 0 means no rewrite happened and `text` is the input resume.
    pub attempt: u32,
    pub text: String,
    pub score: AtsScore,
}

pub struct ResumeOptimizer<'a> {
    llm: &'a dyn CompletionService,
    backoff: &'a BackoffCaller,
    scorer: &'a dyn AtsScorer,
    settings: OptimizeSettings,
}

impl<'a> ResumeOptimizer<'a> {
    pub fn new(
        llm: &'a dyn CompletionService,
        backoff: &'a BackoffCaller,
        scorer: &'a dyn AtsScorer,
        settings: OptimizeSettings,
    ) -> Self {
        Self {
            llm,
            backoff,
            scorer,
            settings,
        }
    }

    /// Returns the final optimized resume text. Callers that need the score
    /// rescore it themselves.
    pub async fn optimize(
        &self,
        resume_text: &str,
        job_description: &str,
        extra_info: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<String, AppError> {
        let last = self
            .run(resume_text, job_description, extra_info, cancel)
            .await?;
        debug!(
            "Optimization stopped after attempt {} at score {}",
            last.attempt, last.score
        );
        Ok(last.text)
    }

    /// Drives the state machine and returns the last attempt.
    pub async fn run(
        &self,
        resume_text: &str,
        job_description: &str,
        extra_info: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<OptimizationAttempt, AppError> {
        let mut state = OptimizerState::Start;
        let mut candidate = resume_text.to_string();
        let mut last_score: Option<AtsScore> = None;
        let mut completed_attempts = 0;

        loop {
            state = match state {
                OptimizerState::Start => {
                    check_target_score(self.settings.target_score)?;
                    if job_description.split_whitespace().next().is_none() {
                        return Err(AppError::Validation(
                            "job description cannot be empty".to_string(),
                        ));
                    }
                    if self.settings.max_attempts == 0 {
                        OptimizerState::Done
                    } else {
                        OptimizerState::Generating { attempt: 1 }
                    }
                }
                OptimizerState::Generating { attempt } => {
                    if cancel.is_cancelled() {
                        return Err(AppError::Cancelled);
                    }
                    let prompt = build_rewrite_prompt(&candidate, job_description, extra_info);
                    let system = format!("{RESUME_REWRITE_SYSTEM} {PLAIN_TEXT_ONLY_SYSTEM}");
                    candidate = complete_text(self.llm, self.backoff, cancel, &system, &prompt)
                        .await?;
                    OptimizerState::Scoring { attempt }
                }
                OptimizerState::Scoring { attempt } => {
                    let score = self.scorer.score(&candidate, job_description)?;
                    info!(
                        attempt,
                        score = score.value(),
                        "Attempt {attempt}: Updated ATS Score = {score}"
                    );
                    last_score = Some(score);
                    completed_attempts = attempt;

                    if score.meets(self.settings.target_score)
                        || attempt >= self.settings.max_attempts
                    {
                        OptimizerState::Done
                    } else {
                        OptimizerState::Generating {
                            attempt: attempt + 1,
                        }
                    }
                }
                OptimizerState::Done => break,
            };
        }

        let score = match last_score {
            Some(score) => score,
            None => self.scorer.score(&candidate, job_description)?,
        };

        Ok(OptimizationAttempt {
            attempt: completed_attempts,
            text: candidate,
            score,
        })
    }
}

/// Builds the rewrite prompt around the current candidate text.
pub fn build_rewrite_prompt(
    candidate_text: &str,
    job_description: &str,
    extra_info: Option<&str>,
) -> String {
    fill_template(
        RESUME_REWRITE_PROMPT_TEMPLATE,
        &[
            ("factuality_instruction", FACTUALITY_INSTRUCTION),
            ("resume_text", candidate_text),
            ("job_description", job_description),
            ("extra_info", extra_info.unwrap_or("")),
        ],
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::generation::ats_score::KeywordAtsScorer;
    use crate::llm_client::backoff::BackoffPolicy;
    use crate::llm_client::testing::{RecordingSleeper, ScriptedCompletion};
    use crate::llm_client::{ChatMessage, CompletionResponse, LlmError};
    use async_trait::async_trait;

    const JD: &str = "Rust Kafka Postgres Kubernetes Linux";
    const RESUME: &str = "Backend engineer. Built services in Go.";

    fn backoff() -> (BackoffCaller, Arc<RecordingSleeper>) {
        let sleeper = Arc::new(RecordingSleeper::default());
        (
            BackoffCaller::new(BackoffPolicy::default(), sleeper.clone()),
            sleeper,
        )
    }

    #[tokio::test]
    async fn test_stops_as_soon_as_target_is_reached() {
        let llm = ScriptedCompletion::texts(&[
            "Rust engineer",                               // 20
            "Rust Kafka Postgres Kubernetes engineer",     // 80
            "Rust Kafka Postgres Kubernetes Linux expert", // never requested
        ]);
        let (backoff, _) = backoff();
        let scorer = KeywordAtsScorer::default();
        let optimizer =
            ResumeOptimizer::new(&llm, &backoff, &scorer, OptimizeSettings::default());

        let last = optimizer
            .run(RESUME, JD, None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(llm.call_count(), 2);
        assert_eq!(last.attempt, 2);
        assert_eq!(last.text, "Rust Kafka Postgres Kubernetes engineer");
        assert_eq!(last.score.value(), 80.0);
    }

    #[tokio::test]
    async fn test_returns_last_candidate_when_target_never_reached() {
        let llm = ScriptedCompletion::texts(&["Rust", "Rust Kafka", "Go only"]);
        let (backoff, _) = backoff();
        let scorer = KeywordAtsScorer::default();
        let optimizer =
            ResumeOptimizer::new(&llm, &backoff, &scorer, OptimizeSettings::default());

        let text = optimizer
            .optimize(RESUME, JD, None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(llm.call_count(), 3);
        assert_eq!(text, "Go only");
    }

    #[tokio::test]
    async fn test_each_attempt_rewrites_previous_output() {
        let llm = ScriptedCompletion::texts(&["first draft", "second draft", "third draft"]);
        let (backoff, _) = backoff();
        let scorer = KeywordAtsScorer::default();
        let optimizer =
            ResumeOptimizer::new(&llm, &backoff, &scorer, OptimizeSettings::default());

        optimizer
            .optimize(RESUME, JD, Some("Keep it to one page"), &CancellationToken::new())
            .await
            .unwrap();

        let prompts = llm.user_prompts();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].contains(RESUME));
        assert!(prompts[1].contains("first draft"));
        assert!(!prompts[1].contains(RESUME));
        assert!(prompts[2].contains("second draft"));
        assert!(prompts
            .iter()
            .all(|p| p.contains(JD) && p.contains("Extra Instructions: Keep it to one page")));
    }

    #[tokio::test]
    async fn test_completion_output_is_trimmed() {
        let llm = ScriptedCompletion::texts(&["\n  Rust Kafka Postgres Kubernetes Linux  \n"]);
        let (backoff, _) = backoff();
        let scorer = KeywordAtsScorer::default();
        let optimizer =
            ResumeOptimizer::new(&llm, &backoff, &scorer, OptimizeSettings::default());

        let text = optimizer
            .optimize(RESUME, JD, None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(text, "Rust Kafka Postgres Kubernetes Linux");
    }

    #[tokio::test]
    async fn test_respects_custom_attempt_budget_and_target() {
        let llm = ScriptedCompletion::texts(&["Rust", "Rust Kafka", "Rust Kafka Postgres"]);
        let (backoff, _) = backoff();
        let scorer = KeywordAtsScorer::default();
        let settings = OptimizeSettings {
            target_score: 40.0,
            max_attempts: 5,
        };
        let optimizer = ResumeOptimizer::new(&llm, &backoff, &scorer, settings);

        let last = optimizer
            .run(RESUME, JD, None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(llm.call_count(), 2);
        assert_eq!(last.score.value(), 40.0);
    }

    #[tokio::test]
    async fn test_zero_attempts_returns_input_unchanged() {
        let llm = ScriptedCompletion::texts(&[]);
        let (backoff, _) = backoff();
        let scorer = KeywordAtsScorer::default();
        let settings = OptimizeSettings {
            target_score: 80.0,
            max_attempts: 0,
        };
        let optimizer = ResumeOptimizer::new(&llm, &backoff, &scorer, settings);

        let last = optimizer
            .run(RESUME, JD, None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(llm.call_count(), 0);
        assert_eq!(last.attempt, 0);
        assert_eq!(last.text, RESUME);
    }

    #[tokio::test]
    async fn test_rate_limits_are_absorbed_by_backoff() {
        let llm = ScriptedCompletion::new(vec![
            Err(LlmError::RateLimited {
                message: "429".to_string(),
            }),
            Err(LlmError::RateLimited {
                message: "429".to_string(),
            }),
            Ok("Rust Kafka Postgres Kubernetes Linux".to_string()),
        ]);
        let (backoff, sleeper) = backoff();
        let scorer = KeywordAtsScorer::default();
        let optimizer =
            ResumeOptimizer::new(&llm, &backoff, &scorer, OptimizeSettings::default());

        let last = optimizer
            .run(RESUME, JD, None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(last.attempt, 1);
        assert_eq!(sleeper.delays_secs(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_fatal_error_propagates() {
        let llm = ScriptedCompletion::new(vec![
            Ok("Rust".to_string()),
            Err(LlmError::Api {
                status: 401,
                message: "bad key".to_string(),
            }),
        ]);
        let (backoff, _) = backoff();
        let scorer = KeywordAtsScorer::default();
        let optimizer =
            ResumeOptimizer::new(&llm, &backoff, &scorer, OptimizeSettings::default());

        let err = optimizer
            .optimize(RESUME, JD, None, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Llm(msg) if msg.contains("bad key")));
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_retries_exhausted_propagates() {
        let replies = (0..5)
            .map(|_| {
                Err(LlmError::RateLimited {
                    message: "429".to_string(),
                })
            })
            .collect();
        let llm = ScriptedCompletion::new(replies);
        let (backoff, _) = backoff();
        let scorer = KeywordAtsScorer::default();
        let optimizer =
            ResumeOptimizer::new(&llm, &backoff, &scorer, OptimizeSettings::default());

        let err = optimizer
            .optimize(RESUME, JD, None, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::RetriesExhausted { attempts: 5 }));
    }

    #[tokio::test]
    async fn test_empty_job_description_fails_before_any_call() {
        let llm = ScriptedCompletion::texts(&["anything"]);
        let (backoff, _) = backoff();
        let scorer = KeywordAtsScorer::default();
        let optimizer =
            ResumeOptimizer::new(&llm, &backoff, &scorer, OptimizeSettings::default());

        let err = optimizer
            .optimize(RESUME, "  ", None, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_before_first_attempt() {
        let llm = ScriptedCompletion::texts(&["Rust", "Rust Kafka", "Rust Kafka Postgres"]);
        let (backoff, _) = backoff();
        let scorer = KeywordAtsScorer::default();
        let optimizer =
            ResumeOptimizer::new(&llm, &backoff, &scorer, OptimizeSettings::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = optimizer
            .optimize(RESUME, JD, None, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Cancelled));
        assert_eq!(llm.call_count(), 0);
    }

    /// Cancels the shared token while serving its first completion.
    struct CancelDuringCompletion {
        inner: ScriptedCompletion,
        cancel: CancellationToken,
    }

    #[async_trait]
    impl CompletionService for CancelDuringCompletion {
        async fn complete(
            &self,
            messages: &[ChatMessage],
        ) -> Result<CompletionResponse, LlmError> {
            self.cancel.cancel();
            self.inner.complete(messages).await
        }

        fn model(&self) -> &str {
            self.inner.model()
        }
    }

    #[tokio::test]
    async fn test_cancellation_is_checked_between_attempts() {
        let cancel = CancellationToken::new();
        let llm = CancelDuringCompletion {
            // Scores 20, below the default target, so a second attempt would follow.
            inner: ScriptedCompletion::texts(&["Rust", "Rust Kafka Postgres Kubernetes Linux"]),
            cancel: cancel.clone(),
        };
        let (backoff, _) = backoff();
        let scorer = KeywordAtsScorer::default();
        let optimizer =
            ResumeOptimizer::new(&llm, &backoff, &scorer, OptimizeSettings::default());

        let err = optimizer
            .optimize(RESUME, JD, None, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Cancelled));
        assert_eq!(llm.inner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_non_finite_target_is_rejected_before_any_call() {
        let llm = ScriptedCompletion::texts(&["Rust"]);
        let (backoff, _) = backoff();
        let scorer = KeywordAtsScorer::default();

        for target in [f64::NAN, f64::INFINITY, -5.0, 100.01] {
            let settings = OptimizeSettings {
                target_score: target,
                max_attempts: 3,
            };
            let optimizer = ResumeOptimizer::new(&llm, &backoff, &scorer, settings);

            let err = optimizer
                .optimize(RESUME, JD, None, &CancellationToken::new())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{target}");
        }
        assert_eq!(llm.call_count(), 0);
    }

    #[test]
    fn test_prompt_renders_missing_extra_info_as_empty() {
        let prompt = build_rewrite_prompt("resume body", "job body", None);
        assert!(prompt.contains("Resume:\nresume body"));
        assert!(prompt.contains("Job Description:\njob body"));
        assert!(prompt.contains("Extra Instructions: \n"));
    }
}
