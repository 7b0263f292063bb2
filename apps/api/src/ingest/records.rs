//! Structured records — per-role field schemas for model-extracted data.
//!
//! The generative model is not guaranteed to produce conformant output, so
//! its text is validated here immediately after extraction: strip code
//! fences, then parse against the role schema. Malformed output is rejected,
//! never stored opaque.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::ingest::IngestRole;
use crate::llm_client::prompts::{
    EXTRACT_PROMPT_TEMPLATE, JD_EXTRACT_SYSTEM, RESUME_EXTRACT_SYSTEM,
};
use crate::llm_client::{strip_json_fences, LlmClient, LlmError};

#[derive(Debug, Error)]
pub enum StructuredExtractionError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("model output did not match the {role} schema: {reason}")]
    Malformed { role: &'static str, reason: String },
}

/// Resume field set. Values are free-form nested JSON; only presence of
/// every field is enforced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeFields {
    pub summary: Value,
    pub experience: Value,
    pub skills: Value,
    pub education: Value,
    pub projects: Value,
    pub certifications: Value,
}

/// Job-description field set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDescriptionFields {
    pub about_company: Value,
    pub role_overview: Value,
    pub qualifications: Value,
    pub location: Value,
    pub job_type: Value,
    pub benefits: Value,
}

/// A validated, role-shaped extraction result.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StructuredRecord {
    Resume(ResumeFields),
    JobDescription(JobDescriptionFields),
}

impl StructuredRecord {
    /// Validates raw model output against the schema for `role`.
    /// Fence stripping is the single repair step applied first.
    pub fn parse(role: IngestRole, raw: &str) -> Result<Self, StructuredExtractionError> {
        let json = strip_json_fences(raw);
        match role {
            IngestRole::Resume => serde_json::from_str::<ResumeFields>(json)
                .map(StructuredRecord::Resume)
                .map_err(|e| StructuredExtractionError::Malformed {
                    role: "resume",
                    reason: e.to_string(),
                }),
            IngestRole::JobDescription => serde_json::from_str::<JobDescriptionFields>(json)
                .map(StructuredRecord::JobDescription)
                .map_err(|e| StructuredExtractionError::Malformed {
                    role: "job_description",
                    reason: e.to_string(),
                }),
        }
    }

    pub fn to_value(&self) -> Value {
        // Field values are already JSON, so this cannot fail.
        serde_json::to_value(self).expect("structured record serializes to JSON")
    }
}

/// Seam for the structured-field extraction backend.
#[async_trait]
pub trait StructuredExtractor: Send + Sync {
    async fn extract(
        &self,
        text: &str,
        role: IngestRole,
    ) -> Result<StructuredRecord, StructuredExtractionError>;
}

/// Production extractor: one deterministic LLM call per document, output
/// validated against the role schema.
pub struct LlmFieldExtractor {
    llm: LlmClient,
}

impl LlmFieldExtractor {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl StructuredExtractor for LlmFieldExtractor {
    async fn extract(
        &self,
        text: &str,
        role: IngestRole,
    ) -> Result<StructuredRecord, StructuredExtractionError> {
        let system = match role {
            IngestRole::Resume => RESUME_EXTRACT_SYSTEM,
            IngestRole::JobDescription => JD_EXTRACT_SYSTEM,
        };
        let prompt = EXTRACT_PROMPT_TEMPLATE.replace("{text}", text);
        let raw = self.llm.complete(system, &prompt).await?;
        StructuredRecord::parse(role, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const RESUME_JSON: &str = r#"{
        "summary": "Backend engineer, 5 years",
        "experience": [{"company": "Acme", "years": 3}],
        "skills": ["Python", "Django"],
        "education": [{"degree": "BSc"}],
        "projects": [],
        "certifications": null
    }"#;

    const JD_JSON: &str = r#"{
        "about_company": "Acme builds rockets",
        "role_overview": "Own the backend",
        "qualifications": ["Python", "5+ years"],
        "location": "Remote",
        "job_type": "Full-time",
        "benefits": ["Equity"]
    }"#;

    #[test]
    fn test_parse_valid_resume() {
        let record = StructuredRecord::parse(IngestRole::Resume, RESUME_JSON).unwrap();
        assert!(matches!(record, StructuredRecord::Resume(_)));
    }

    #[test]
    fn test_parse_valid_job_description() {
        let record = StructuredRecord::parse(IngestRole::JobDescription, JD_JSON).unwrap();
        assert!(matches!(record, StructuredRecord::JobDescription(_)));
    }

    #[test]
    fn test_parse_rejects_missing_required_field() {
        let missing_skills = r#"{
            "summary": "s", "experience": [], "education": [],
            "projects": [], "certifications": []
        }"#;
        let err = StructuredRecord::parse(IngestRole::Resume, missing_skills).unwrap_err();
        assert!(matches!(
            err,
            StructuredExtractionError::Malformed { role: "resume", .. }
        ));
    }

    #[test]
    fn test_parse_rejects_non_json_output() {
        let err = StructuredRecord::parse(IngestRole::Resume, "Sure! Here is the resume...")
            .unwrap_err();
        assert!(matches!(err, StructuredExtractionError::Malformed { .. }));
    }

    #[test]
    fn test_parse_repairs_fenced_output() {
        let fenced = format!("```json\n{RESUME_JSON}\n```");
        let record = StructuredRecord::parse(IngestRole::Resume, &fenced).unwrap();
        assert!(matches!(record, StructuredRecord::Resume(_)));
    }

    #[test]
    fn test_parse_tolerates_extra_fields() {
        let with_extra = r#"{
            "summary": "s", "experience": [], "skills": [], "education": [],
            "projects": [], "certifications": [], "hobbies": ["chess"]
        }"#;
        assert!(StructuredRecord::parse(IngestRole::Resume, with_extra).is_ok());
    }

    #[test]
    fn test_role_schemas_are_not_interchangeable() {
        assert!(StructuredRecord::parse(IngestRole::JobDescription, RESUME_JSON).is_err());
        assert!(StructuredRecord::parse(IngestRole::Resume, JD_JSON).is_err());
    }

    #[test]
    fn test_to_value_keeps_field_values() {
        let record = StructuredRecord::parse(IngestRole::Resume, RESUME_JSON).unwrap();
        let value = record.to_value();
        assert_eq!(value["skills"], json!(["Python", "Django"]));
        assert_eq!(value["summary"], json!("Backend engineer, 5 years"));
    }
}
