use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::llm_client::prompts::excerpt;
use crate::llm_client::{call_json, TextOracle};
use crate::matching::prompts::{SUGGESTIONS_PROMPT, SUGGESTIONS_SYSTEM};
use crate::matching::relevance::COMPARISON_TEXT_LIMIT;
use crate::models::{FormattedDocument, Suggestion};

pub const MAX_SUGGESTIONS: usize = 5;

/// Expected oracle payload. `match_score` and `missing_skills` are
/// informational; the locally computed diff is what gets reported.
#[derive(Debug, Deserialize)]
struct SuggestionResponse {
    #[serde(default)]
    match_score: Option<f64>,
    #[serde(default)]
    missing_skills: Vec<String>,
    suggestions: Vec<Suggestion>,
}

pub fn placeholder_suggestions() -> Vec<Suggestion> {
    vec![Suggestion {
        area: "general".to_string(),
        advice: "Unable to generate suggestions".to_string(),
    }]
}

/// `job − resume`, in job skill order.
pub fn missing_skills(resume: &FormattedDocument, job: &FormattedDocument) -> Vec<String> {
    let have: std::collections::HashSet<&str> = resume.skill_names().collect();
    job.skill_names()
        .filter(|name| !have.contains(name))
        .map(str::to_owned)
        .collect()
}

#[derive(Clone)]
pub struct SuggestionGenerator {
    oracle: Arc<dyn TextOracle>,
}

impl SuggestionGenerator {
    pub fn new(oracle: Arc<dyn TextOracle>) -> Self {
        Self { oracle }
    }

    pub async fn generate(
        &self,
        resume: &FormattedDocument,
        job: &FormattedDocument,
        missing: &[String],
    ) -> Vec<Suggestion> {
        let resume_skills: Vec<&str> = resume.skill_names().collect();
        let job_skills: Vec<&str> = job.skill_names().collect();
        let prompt = SUGGESTIONS_PROMPT
            .replace("{resume_skills}", &serde_json::to_string(&resume_skills).unwrap_or_default())
            .replace("{job_skills}", &serde_json::to_string(&job_skills).unwrap_or_default())
            .replace("{missing_skills}", &serde_json::to_string(missing).unwrap_or_default())
            .replace("{job_text}", excerpt(&job.text, COMPARISON_TEXT_LIMIT))
            .replace("{resume_text}", excerpt(&resume.text, COMPARISON_TEXT_LIMIT));

        match call_json::<SuggestionResponse>(self.oracle.as_ref(), &prompt, SUGGESTIONS_SYSTEM).await
        {
            Ok(response) => {
                debug!(
                    resume_id = %resume.doc_id,
                    job_id = %job.doc_id,
                    oracle_score = ?response.match_score,
                    oracle_missing = response.missing_skills.len(),
                    "Suggestions generated"
                );
                let mut suggestions = response.suggestions;
                suggestions.truncate(MAX_SUGGESTIONS);
                suggestions
            }
            Err(e) => {
                warn!(resume_id = %resume.doc_id, job_id = %job.doc_id, "Unusable suggestions, using placeholder: {e}");
                placeholder_suggestions()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocType;
    use crate::testing::{formatted_doc, ScriptedOracle};

    #[test]
    fn test_missing_skills_follow_job_order() {
        let resume = formatted_doc("r", DocType::Resume, &["SQL"]);
        let job = formatted_doc("j", DocType::Job, &["Docker", "SQL", "Python"]);
        assert_eq!(missing_skills(&resume, &job), vec!["Docker", "Python"]);
    }

    #[tokio::test]
    async fn test_well_formed_suggestions_are_kept_and_capped() {
        let items: Vec<String> = (0..8)
            .map(|i| format!(r#"{{"area": "skills", "advice": "tip {i}"}}"#))
            .collect();
        let raw = format!(
            r#"{{"match_score": 64, "missing_skills": ["Docker"], "suggestions": [{}]}}"#,
            items.join(",")
        );
        let generator = SuggestionGenerator::new(Arc::new(ScriptedOracle::constant(&raw)));
        let resume = formatted_doc("r", DocType::Resume, &["Python"]);
        let job = formatted_doc("j", DocType::Job, &["Python", "Docker"]);
        let suggestions = generator.generate(&resume, &job, &["Docker".to_string()]).await;
        assert_eq!(suggestions.len(), MAX_SUGGESTIONS);
        assert_eq!(suggestions[0].advice, "tip 0");
    }

    #[tokio::test]
    async fn test_malformed_output_yields_placeholder() {
        let generator = SuggestionGenerator::new(Arc::new(ScriptedOracle::constant(
            r#"{"match_score": 50, "suggestions": "Add Docker"}"#,
        )));
        let resume = formatted_doc("r", DocType::Resume, &["Python"]);
        let job = formatted_doc("j", DocType::Job, &["Docker"]);
        assert_eq!(
            generator.generate(&resume, &job, &[]).await,
            placeholder_suggestions()
        );
    }

    #[tokio::test]
    async fn test_prompt_carries_local_missing_diff() {
        let oracle = ScriptedOracle::new(|prompt, _| {
            assert!(prompt.contains(r#"MISSING SKILLS: ["Docker"]"#));
            Ok(r#"{"suggestions": []}"#.to_string())
        });
        let generator = SuggestionGenerator::new(Arc::new(oracle));
        let resume = formatted_doc("r", DocType::Resume, &["Python"]);
        let job = formatted_doc("j", DocType::Job, &["Python", "Docker"]);
        assert!(generator
            .generate(&resume, &job, &["Docker".to_string()])
            .await
            .is_empty());
    }
}
