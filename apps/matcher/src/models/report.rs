use serde::{Deserialize, Serialize};

use crate::models::document::{DocType, Skill};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub area: String,
    pub advice: String,
}

/// One ranked (resume, job) pair. Produced fresh per ranking, only replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub job_id: String,
    pub match_score: f64, // 0 – 100
    pub missing_skills: Vec<String>,
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub relevance_score: f64,    // 0 – 100
    pub completeness_score: f64, // 0 – 100
}

/// The output record persisted once per resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeReport {
    pub doc_id: String,
    pub doc_type: DocType,
    pub skills: Vec<Skill>,
    pub metrics: Metrics,
    pub job_matches: Vec<MatchResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub doc_id: String,
    pub doc_type: DocType,
    pub reason: String,
}

/// Result of one batch run: everything that made it through, plus what didn't.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub reports: Vec<ResumeReport>,
    pub skipped: Vec<SkippedDocument>,
}
