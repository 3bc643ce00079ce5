//! ATS Scoring — keyword-overlap score between a candidate document and a job description.
//!
//! The job description is split on whitespace; every token (duplicates included)
//! is checked case-insensitively against the candidate text, and the score is
//! the matched share × 100, rounded to two decimals.
//!
//! Default matching is substring containment: "experience" matches inside
//! "Experienced", and "AWS," (with the comma) does not match "AWS and".
//! `MatchMode::WholeWord` is available for callers that want word boundaries.
//!
//! `AppState` holds an `Arc<dyn AtsScorer>`, chosen at startup via config.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

// ────────────────────────────────────────────────────────────────────────────
// Output data models
// ────────────────────────────────────────────────────────────────────────────

/// A match score in [0, 100], always held at two-decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AtsScore(f64);

impl AtsScore {
    /// An empty total scores 0.
    fn from_ratio(matched: usize, total: usize) -> Self {
        if total == 0 {
            return AtsScore(0.0);
        }
        let raw = matched as f64 / total as f64 * 100.0;
        AtsScore(((raw * 100.0).round() / 100.0).clamp(0.0, 100.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn meets(self, target: f64) -> bool {
        self.0 >= target
    }
}

impl fmt::Display for AtsScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Token matches if it occurs anywhere in the candidate text.
    #[default]
    Substring,
    /// Token matches only a whole whitespace-delimited word, ignoring
    /// surrounding punctuation.
    WholeWord,
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "substring" => Ok(MatchMode::Substring),
            "whole_word" | "whole-word" | "word" => Ok(MatchMode::WholeWord),
            other => Err(format!(
                "unknown match mode '{other}' (expected 'substring' or 'whole_word')"
            )),
        }
    }
}

/// Full scoring breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtsReport {
    pub score: AtsScore,
    pub total_tokens: usize,
    pub matched_tokens: usize,
    /// Distinct matched tokens, in first-seen order.
    pub matched_keywords: Vec<String>,
    /// Distinct unmatched tokens, in first-seen order.
    pub missing_keywords: Vec<String>,
    pub recommendation: String,
    pub match_mode: MatchMode,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// The ATS scorer trait. Implement this to swap matching strategies without
/// touching the optimizer or the pipeline.
pub trait AtsScorer: Send + Sync {
    fn report(&self, candidate_text: &str, job_description: &str) -> Result<AtsReport, AppError>;

    fn score(&self, candidate_text: &str, job_description: &str) -> Result<AtsScore, AppError> {
        Ok(self.report(candidate_text, job_description)?.score)
    }
}

/// Pure keyword-overlap scorer. Deterministic, no I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordAtsScorer {
    pub mode: MatchMode,
}

impl KeywordAtsScorer {
    pub fn new(mode: MatchMode) -> Self {
        Self { mode }
    }
}

impl AtsScorer for KeywordAtsScorer {
    fn report(&self, candidate_text: &str, job_description: &str) -> Result<AtsReport, AppError> {
        compute_ats_report(candidate_text, job_description, self.mode)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Core scoring algorithm
// ────────────────────────────────────────────────────────────────────────────

fn compute_ats_report(
    candidate_text: &str,
    job_description: &str,
    mode: MatchMode,
) -> Result<AtsReport, AppError> {
    let tokens: Vec<&str> = job_description.split_whitespace().collect();

    if tokens.is_empty() {
        return Err(AppError::Validation(
            "job description has no words to score against".to_string(),
        ));
    }

    let matcher = Matcher::new(candidate_text, mode);

    let mut matched_tokens = 0;
    let mut seen = HashSet::new();
    let mut matched_keywords = Vec::new();
    let mut missing_keywords = Vec::new();

    for token in &tokens {
        let hit = matcher.contains(token);
        if hit {
            matched_tokens += 1;
        }
        if seen.insert(token.to_lowercase()) {
            if hit {
                matched_keywords.push(token.to_string());
            } else {
                missing_keywords.push(token.to_string());
            }
        }
    }

    let score = AtsScore::from_ratio(matched_tokens, tokens.len());
    let recommendation = build_recommendation(score, &missing_keywords);

    Ok(AtsReport {
        score,
        total_tokens: tokens.len(),
        matched_tokens,
        matched_keywords,
        missing_keywords,
        recommendation,
        match_mode: mode,
    })
}

enum Matcher {
    Substring(String),
    WholeWord {
        lowered: String,
        words: HashSet<String>,
    },
}

impl Matcher {
    fn new(candidate_text: &str, mode: MatchMode) -> Self {
        let lowered = candidate_text.to_lowercase();
        match mode {
            MatchMode::Substring => Matcher::Substring(lowered),
            MatchMode::WholeWord => {
                let words = lowered
                    .split_whitespace()
                    .map(trim_punctuation)
                    .filter(|w| !w.is_empty())
                    .map(str::to_string)
                    .collect();
                Matcher::WholeWord { lowered, words }
            }
        }
    }

    fn contains(&self, token: &str) -> bool {
        let token = token.to_lowercase();
        match self {
            Matcher::Substring(lowered) => lowered.contains(&token),
            Matcher::WholeWord { lowered, words } => {
                let core = trim_punctuation(&token);
                if core.is_empty() {
                    // Pure punctuation has no word to match; fall back to containment.
                    lowered.contains(&token)
                } else {
                    words.contains(core)
                }
            }
        }
    }
}

fn trim_punctuation(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Builds a human-readable recommendation string from score and missing keywords.
fn build_recommendation(score: AtsScore, missing: &[String]) -> String {
    let top_missing: Vec<&str> = missing.iter().take(5).map(String::as_str).collect();

    if score.meets(80.0) {
        "Strong match. The document covers most of the job description's wording.".to_string()
    } else if score.meets(60.0) {
        format!(
            "Moderate match ({score}/100). Consider working in: {}.",
            top_missing.join(", ")
        )
    } else {
        format!(
            "Low match ({score}/100). Missing terms include: {}.",
            top_missing.join(", ")
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
