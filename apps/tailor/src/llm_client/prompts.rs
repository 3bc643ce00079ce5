// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that asks for the finished document only.
pub const PLAIN_TEXT_ONLY_SYSTEM: &str = "You are a precise writing assistant. \
    Respond with the finished document text only. \
    Do NOT wrap the document in markdown code fences. \
    Do NOT add commentary, preambles, or explanations before or after it.";

/// Common instruction appended to all generation prompts.
pub const FACTUALITY_INSTRUCTION: &str = "\
    Use only facts present in the resume. Do NOT invent employers, dates, \
    degrees, certifications, or metrics. Rephrase and reorder, never fabricate.";

/// Fills `{name}` placeholders in a template in a single pass, so braces inside
/// substituted values are never expanded. Unknown placeholders are left as-is.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (close, *value))
        });
        match value {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
