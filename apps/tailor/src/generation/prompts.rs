// All LLM prompt constants for the Generation module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for ATS resume rewriting.
pub const RESUME_REWRITE_SYSTEM: &str = "You are an expert resume writer who optimizes \
    resumes for Applicant Tracking Systems. You keep every fact from the original \
    resume, mirror the wording of the target job description where it is truthful, \
    and use plain ATS-friendly formatting: simple section headings, no tables, no columns.";

/// Resume rewrite prompt template.
/// Replace: {resume_text}, {job_description}, {extra_info}, {factuality_instruction}
pub const RESUME_REWRITE_PROMPT_TEMPLATE: &str = "Rewrite the following resume to align with this job description for ATS-friendly formatting and maximize the ATS score.

{factuality_instruction}

Resume:
{resume_text}

Job Description:
{job_description}

Extra Instructions: {extra_info}
";

/// System prompt for cover letter generation.
pub const COVER_LETTER_SYSTEM: &str = "You are an experienced career coach who writes \
    concise, professional cover letters tailored to a specific role.";

/// Cover letter prompt template.
/// Replace: {resume_text}, {job_description}, {extra_info}, {factuality_instruction}
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = "Write a professional cover letter based on the following resume and job description.

{factuality_instruction}

Resume:
{resume_text}

Job Description:
{job_description}

Extra Instructions: {extra_info}
";
