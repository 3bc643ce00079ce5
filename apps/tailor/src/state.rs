use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::generation::ats_score::{AtsScorer, KeywordAtsScorer};
use crate::generation::optimizer::OptimizeSettings;
use crate::llm_client::backoff::{BackoffCaller, BackoffPolicy};
use crate::llm_client::{CompletionService, LlmClient, LlmSettings};

/// Shared handles injected into every pipeline run.
/// Everything here is immutable and safe to share across concurrent runs;
/// per-run counters live inside the optimizer and backoff caller.
#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn CompletionService>,
    pub backoff: BackoffCaller,
    /// Pluggable ATS scorer. Default: KeywordAtsScorer in substring mode.
    pub scorer: Arc<dyn AtsScorer>,
    pub optimize: OptimizeSettings,
}

impl AppState {
    /// Builds the production state: HTTP completion client, tokio-backed sleeps.
    pub fn from_config(config: &Config) -> Result<Self> {
        let llm = LlmClient::new(LlmSettings {
            api_url: config.completion_api_url.clone(),
            api_key: config.api_key()?.to_string(),
            model: config.completion_model.clone(),
            max_tokens: config.completion_max_tokens,
            timeout: config.http_timeout,
        })?;

        let backoff = BackoffCaller::with_tokio_sleep(BackoffPolicy {
            max_attempts: config.backoff_max_attempts,
            base_delay: config.backoff_base_delay,
        });

        Ok(Self {
            llm: Arc::new(llm),
            backoff,
            scorer: Arc::new(KeywordAtsScorer::new(config.match_mode)),
            optimize: OptimizeSettings {
                target_score: config.target_score,
                max_attempts: config.optimize_max_attempts,
            },
        })
    }
}
