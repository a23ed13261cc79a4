use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Version tag stamped on every persisted document.
pub const PROCESSED_BY: &str = concat!("matcher-v", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Resume,
    Job,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Resume => "resume",
            DocType::Job => "job",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "resume" => Ok(DocType::Resume),
            "job" => Ok(DocType::Job),
            other => Err(AppError::Validation(format!(
                "Unknown document type '{other}' (expected 'resume' or 'job')"
            ))),
        }
    }
}

/// A canonical skill. No two skills on one document share `canonical_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    #[serde(rename = "name")]
    pub canonical_name: String,
    #[serde(default)]
    pub category: String,
}

impl Skill {
    pub fn new(canonical_name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            canonical_name: canonical_name.into(),
            category: category.into(),
        }
    }
}

/// A document as handed over by text extraction, before skills are known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputDocument {
    pub doc_id: String,
    pub doc_type: DocType,
    pub text: String,
    pub word_count: usize,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_size_mb: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl InputDocument {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_doc_id(&self.doc_id)?;
        if self.text.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "Document {} has no text",
                self.doc_id
            )));
        }
        Ok(())
    }

    /// Validates the document and checks that it is of the `expected` type.
    pub fn validate_as(&self, expected: DocType) -> Result<(), AppError> {
        self.validate()?;
        if self.doc_type != expected {
            return Err(AppError::Validation(format!(
                "Document {} is a {}, expected a {}",
                self.doc_id, self.doc_type, expected
            )));
        }
        Ok(())
    }
}

/// Document ids become storage keys, so only `[A-Za-z0-9_-]` is accepted.
pub fn validate_doc_id(doc_id: &str) -> Result<(), AppError> {
    let valid = !doc_id.is_empty()
        && doc_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(format!("Invalid document id '{doc_id}'")))
    }
}

/// The persisted form of a processed document. Superseded, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedDocument {
    pub doc_id: String,
    pub doc_type: DocType,
    pub text: String,
    pub word_count: usize,
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub file_size_mb: f64,
    /// Job postings only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_by: String,
}

impl FormattedDocument {
    pub fn from_input(input: InputDocument, skills: Vec<Skill>) -> Self {
        let is_job = input.doc_type == DocType::Job;
        Self {
            doc_id: input.doc_id,
            doc_type: input.doc_type,
            text: input.text,
            word_count: input.word_count,
            skills,
            file_name: input.file_name.unwrap_or_default(),
            file_size_mb: input.file_size_mb,
            job_title: input.job_title.filter(|_| is_job),
            company: input.company.filter(|_| is_job),
            created_at: Utc::now(),
            processed_by: PROCESSED_BY.to_string(),
        }
    }

    pub fn skill_names(&self) -> impl Iterator<Item = &str> {
        self.skills.iter().map(|s| s.canonical_name.as_str())
    }

    /// Space-joined skill names, the text that gets embedded and vectorized.
    pub fn skill_text(&self) -> String {
        self.skill_names().collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(doc_type: DocType, text: &str) -> InputDocument {
        InputDocument {
            doc_id: "doc-1".to_string(),
            doc_type,
            text: text.to_string(),
            word_count: text.split_whitespace().count(),
            file_name: Some("cv.pdf".to_string()),
            file_size_mb: 0.1,
            job_title: None,
            company: None,
        }
    }

    #[test]
    fn test_doc_type_parses_case_insensitively() {
        assert_eq!("Resume".parse::<DocType>().unwrap(), DocType::Resume);
        assert_eq!(" job ".parse::<DocType>().unwrap(), DocType::Job);
        assert!(matches!(
            "cover_letter".parse::<DocType>(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_skill_serializes_as_name_and_category() {
        let value = serde_json::to_value(Skill::new("Python", "programming_languages")).unwrap();
        assert_eq!(value, json!({"name": "Python", "category": "programming_languages"}));
    }

    #[test]
    fn test_blank_text_fails_validation() {
        assert!(matches!(
            input(DocType::Resume, "   \n").validate(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_wrong_type_fails_validation() {
        let doc = input(DocType::Job, "Need Python");
        assert!(doc.validate_as(DocType::Job).is_ok());
        assert!(matches!(
            doc.validate_as(DocType::Resume),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_doc_id_rejects_path_segments() {
        assert!(validate_doc_id("3f2a-b1_c").is_ok());
        assert!(validate_doc_id("../etc/passwd").is_err());
        assert!(validate_doc_id("").is_err());
    }

    #[test]
    fn test_formatted_document_skill_text() {
        let doc = FormattedDocument::from_input(
            input(DocType::Resume, "Python and SQL"),
            vec![
                Skill::new("Python", "programming_languages"),
                Skill::new("Machine Learning", "data_science"),
            ],
        );
        assert_eq!(doc.skill_text(), "Python Machine Learning");
        assert_eq!(doc.file_name, "cv.pdf");
        assert_eq!(doc.processed_by, PROCESSED_BY);
    }

    #[test]
    fn test_job_title_and_company_kept_for_jobs_only() {
        let mut job = input(DocType::Job, "Data engineer, Python");
        job.job_title = Some("Data Engineer".to_string());
        job.company = Some("Acme".to_string());
        let mut resume = job.clone();
        resume.doc_type = DocType::Resume;

        let job = FormattedDocument::from_input(job, Vec::new());
        assert_eq!(job.job_title.as_deref(), Some("Data Engineer"));
        assert_eq!(job.company.as_deref(), Some("Acme"));

        let resume = FormattedDocument::from_input(resume, Vec::new());
        assert!(resume.job_title.is_none());
        let value = serde_json::to_value(&resume).unwrap();
        assert!(value.get("company").is_none());
    }

    #[test]
    fn test_records_without_job_fields_still_load() {
        let doc: InputDocument = serde_json::from_value(json!({
            "doc_id": "job-1",
            "doc_type": "job",
            "text": "Python",
            "word_count": 1
        }))
        .unwrap();
        assert!(doc.job_title.is_none() && doc.company.is_none());
    }
}
