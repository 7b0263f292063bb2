// Prompt constants for structured-field extraction. The required field sets
// here must stay in sync with the schemas in `ingest::records`.

/// System prompt for parsing resumes into the resume field set.
pub const RESUME_EXTRACT_SYSTEM: &str = "You are an AI assistant that parses resumes into \
    structured JSON. Required fields: summary, experience, skills, education, projects, \
    certifications. Respond with valid JSON only. Do NOT include any text outside the JSON \
    object. Do NOT use markdown code fences.";

/// System prompt for parsing job descriptions into the JD field set.
pub const JD_EXTRACT_SYSTEM: &str = "You are an AI assistant that parses job descriptions into \
    structured JSON. Required fields: about_company, role_overview, qualifications, location, \
    job_type, benefits. Respond with valid JSON only. Do NOT include any text outside the JSON \
    object. Do NOT use markdown code fences.";

/// User-turn template; `{text}` is replaced with the normalized document text.
pub const EXTRACT_PROMPT_TEMPLATE: &str =
    "Extract and summarize the following text in JSON format:\n\n{text}\n\n";
