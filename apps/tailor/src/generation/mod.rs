// Resume tailoring engine: ATS scoring, iterative resume optimization, cover letters.
// All completion calls go through llm_client — no direct HTTP calls here.

pub mod application;
pub mod ats_score;
pub mod cover_letter;
pub mod optimizer;
pub mod prompts;
