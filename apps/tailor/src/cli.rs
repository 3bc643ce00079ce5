use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::config::Config;
use crate::document::extract::extract_text;
use crate::document::writer::write_document;
use crate::errors::AppError;
use crate::generation::application::{
    run_application_with_timeout, ApplicationOutcome, ApplicationRequest,
};
use crate::generation::ats_score::{AtsReport, AtsScorer, KeywordAtsScorer, MatchMode};
use crate::generation::optimizer::check_target_score;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "tailor")]
#[command(about = "Tailor a resume to a job description and write a matching cover letter")]
#[command(version)]
pub struct Cli {
    #[arg(short, long, help = "Enable debug logging")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Optimize a resume for ATS and generate a cover letter
    Apply(ApplyArgs),

    /// Score a resume against a job description without rewriting it
    Score(ScoreArgs),
}

#[derive(Args)]
pub struct JobArgs {
    /// Job description file (.pdf, .docx, .txt, .md)
    #[arg(long, value_name = "FILE", required_unless_present = "job_text", conflicts_with = "job_text")]
    pub job: Option<PathBuf>,

    /// Job description given inline
    #[arg(long, value_name = "TEXT")]
    pub job_text: Option<String>,
}

impl JobArgs {
    async fn load(&self) -> Result<String, AppError> {
        match (&self.job, &self.job_text) {
            (Some(path), _) => extract_text(path).await,
            (None, Some(text)) => Ok(text.clone()),
            (None, None) => Err(AppError::Validation(
                "a job description is required (--job or --job-text)".to_string(),
            )),
        }
    }
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Resume file (.pdf, .docx, .txt, .md)
    #[arg(long, value_name = "FILE")]
    pub resume: PathBuf,

    #[command(flatten)]
    pub job: JobArgs,

    /// Extra instructions appended to every prompt
    #[arg(long, value_name = "TEXT")]
    pub extra: Option<String>,

    /// Stop optimizing once the ATS score reaches this value (0-100)
    #[arg(long, value_parser = parse_target_score)]
    pub target_score: Option<f64>,

    /// Maximum number of rewrite attempts
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Write the optimized resume to this file (.docx or plain text)
    #[arg(long, value_name = "FILE")]
    pub resume_out: Option<PathBuf>,

    /// Write the cover letter to this file (.docx or plain text)
    #[arg(long, value_name = "FILE")]
    pub cover_letter_out: Option<PathBuf>,

    /// Give up on the whole run after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ScoreArgs {
    /// Resume file (.pdf, .docx, .txt, .md)
    #[arg(long, value_name = "FILE")]
    pub resume: PathBuf,

    #[command(flatten)]
    pub job: JobArgs,

    /// Token matching: substring (default) or whole_word
    #[arg(long)]
    pub match_mode: Option<MatchMode>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_target_score(raw: &str) -> Result<f64, String> {
    let target: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    check_target_score(target).map_err(|e| e.to_string())
}

impl Commands {
    pub async fn execute(self, config: Config) -> Result<()> {
        match self {
            Commands::Apply(args) => handle_apply_command(config, &args).await?,
            Commands::Score(args) => handle_score_command(config, &args).await?,
        }
        Ok(())
    }
}

async fn handle_apply_command(config: Config, args: &ApplyArgs) -> Result<()> {
    // Read and validate both inputs before touching the completion service.
    let resume_text = extract_text(&args.resume).await?;
    let job_description = args.job.load().await?;

    let mut state = AppState::from_config(&config)?;
    if let Some(target) = args.target_score {
        state.optimize.target_score = target;
    }
    if let Some(attempts) = args.max_attempts {
        state.optimize.max_attempts = attempts;
    }

    let request = ApplicationRequest {
        resume_text,
        job_description,
        extra_info: args.extra.clone(),
    };
    let timeout = args.timeout_secs.map(Duration::from_secs);
    let outcome = run_application_with_timeout(&state, &request, timeout).await?;

    if let Some(path) = &args.resume_out {
        write_document(path, &outcome.resume).await?;
    }
    if let Some(path) = &args.cover_letter_out {
        write_document(path, &outcome.cover_letter).await?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

async fn handle_score_command(config: Config, args: &ScoreArgs) -> Result<()> {
    let resume_text = extract_text(&args.resume).await?;
    let job_description = args.job.load().await?;

    let scorer = KeywordAtsScorer::new(args.match_mode.unwrap_or(config.match_mode));
    let report = scorer.report(&resume_text, &job_description)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&args.resume, &report);
    }
    Ok(())
}

fn print_outcome(outcome: &ApplicationOutcome) {
    println!("=== Optimized resume ===\n{}\n", outcome.resume);
    println!("=== Cover letter ===\n{}\n", outcome.cover_letter);
    println!("ATS score: {}/100", outcome.ats_score);
    println!("{}", outcome.recommendation);
}

fn print_report(resume: &Path, report: &AtsReport) {
    println!("{}: {}/100", resume.display(), report.score);
    println!(
        "Matched {} of {} job description words ({:?} matching)",
        report.matched_tokens, report.total_tokens, report.match_mode
    );
    if !report.missing_keywords.is_empty() {
        println!("Missing: {}", report.missing_keywords.join(", "));
    }
    println!("{}", report.recommendation);
}
