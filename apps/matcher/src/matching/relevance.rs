//! Relevance Scoring: skill overlap weighted by must-have skills, averaged
//! with an oracle-judged semantic similarity.
//!
//! Algorithm, for resume skills R, job skills J and critical skills C:
//! 1. overlap = (|R∩J| + 2·|R∩C∩J|) / (|J| + 2·|C|) × 50   (0 when J is empty)
//! 2. similarity = oracle integer 0 – 100                   (0 when unusable)
//! 3. relevance = (overlap + similarity) / 2
//!
//! Scoring never raises: a failed pair scores 0.0.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::llm_client::prompts::excerpt;
use crate::llm_client::{parse_json_response, strip_json_fences, LlmError, TextOracle};
use crate::matching::prompts::{
    CRITICAL_SKILLS_PROMPT, CRITICAL_SKILLS_SYSTEM, SIMILARITY_PROMPT, SIMILARITY_SYSTEM,
};
use crate::models::{FormattedDocument, Skill};
use crate::skills::taxonomy::Taxonomy;

/// Leading characters of each document sent to the similarity and suggestion oracles.
pub const COMPARISON_TEXT_LIMIT: usize = 1000;

/// Weight of a critical skill relative to an ordinary one.
const CRITICAL_WEIGHT: f64 = 2.0;

pub fn overlap_score(
    resume: &HashSet<&str>,
    job: &HashSet<&str>,
    critical: &HashSet<&str>,
) -> f64 {
    if job.is_empty() {
        return 0.0;
    }
    let matched = resume.intersection(job).count() as f64;
    let matched_critical = resume
        .intersection(job)
        .filter(|s| critical.contains(*s))
        .count() as f64;
    let denominator = job.len() as f64 + CRITICAL_WEIGHT * critical.len() as f64;
    (matched + CRITICAL_WEIGHT * matched_critical) / denominator * 50.0
}

/// Reads a bare similarity score. Anything but a finite number in [0, 100] is 0.
pub fn parse_similarity(raw: &str) -> f64 {
    match strip_json_fences(raw).trim().parse::<f64>() {
        Ok(v) if v.is_finite() && (0.0..=100.0).contains(&v) => v,
        _ => {
            warn!(response = %raw.trim(), "Similarity oracle returned a non-score, using 0");
            0.0
        }
    }
}

fn name_set(skills: &[Skill]) -> HashSet<&str> {
    skills.iter().map(|s| s.canonical_name.as_str()).collect()
}

#[derive(Clone)]
pub struct RelevanceScorer {
    oracle: Arc<dyn TextOracle>,
    taxonomy: Arc<Taxonomy>,
}

impl RelevanceScorer {
    pub fn new(oracle: Arc<dyn TextOracle>, taxonomy: Arc<Taxonomy>) -> Self {
        Self { oracle, taxonomy }
    }

    /// Must-have skills for one job posting. Falls back to the taxonomy's
    /// static list when the oracle fails or answers with the wrong shape.
    pub async fn critical_skills(&self, job: &FormattedDocument) -> Vec<String> {
        let job_skills: Vec<&str> = job.skill_names().collect();
        let prompt = CRITICAL_SKILLS_PROMPT
            .replace("{taxonomy}", &self.taxonomy.prompt_listing())
            .replace("{job_skills}", &serde_json::to_string(&job_skills).unwrap_or_default())
            .replace("{job_text}", excerpt(&job.text, COMPARISON_TEXT_LIMIT));

        let names = match self.oracle.complete(&prompt, CRITICAL_SKILLS_SYSTEM).await {
            Ok(raw) => parse_json_response::<Vec<String>>(&raw),
            Err(e) => Err(e),
        };

        match names {
            Ok(names) => {
                let critical = self.taxonomy.canonicalize(&names);
                debug!(job_id = %job.doc_id, ?critical, "Critical skills identified");
                critical
            }
            Err(e) => {
                warn!(job_id = %job.doc_id, "Critical skill call failed, using taxonomy defaults: {e}");
                self.taxonomy.critical_skills().to_vec()
            }
        }
    }

    /// Full relevance for one (resume, job) pair, including the critical-skill call.
    pub async fn score(
        &self,
        resume_skills: &[Skill],
        job: &FormattedDocument,
        resume_text: &str,
    ) -> f64 {
        let critical = self.critical_skills(job).await;
        self.score_with_critical(resume_skills, &job.skills, &critical, resume_text, &job.text)
            .await
    }

    /// Relevance for one pair when the job's critical skills are already known.
    pub async fn score_with_critical(
        &self,
        resume_skills: &[Skill],
        job_skills: &[Skill],
        critical: &[String],
        resume_text: &str,
        job_text: &str,
    ) -> f64 {
        let critical: HashSet<&str> = critical.iter().map(String::as_str).collect();
        let overlap = overlap_score(&name_set(resume_skills), &name_set(job_skills), &critical);

        match self.similarity(resume_text, job_text).await {
            Ok(similarity) => {
                let relevance = (overlap + similarity) / 2.0;
                debug!(overlap, similarity, relevance, "Relevance scored");
                relevance
            }
            Err(e) => {
                warn!("Similarity oracle call failed, pair scores 0: {e}");
                0.0
            }
        }
    }

    async fn similarity(&self, resume_text: &str, job_text: &str) -> Result<f64, LlmError> {
        let prompt = SIMILARITY_PROMPT
            .replace("{resume_text}", excerpt(resume_text, COMPARISON_TEXT_LIMIT))
            .replace("{job_text}", excerpt(job_text, COMPARISON_TEXT_LIMIT));
        let raw = self.oracle.complete(&prompt, SIMILARITY_SYSTEM).await?;
        Ok(parse_similarity(&raw))
    }
}
