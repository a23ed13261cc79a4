//! Match Ranking: one resume against N job postings.
//!
//! A `RankingStrategy` scores candidates; `MatchRanker` sorts them, keeps the
//! top K, and explains each kept hit with a missing-skill diff and suggestions.
//! The strategy is picked at startup from `MATCH_MODE`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::index::JobIndex;
use crate::matching::lexical::lexical_scores;
use crate::matching::suggestions::{missing_skills, SuggestionGenerator};
use crate::models::{FormattedDocument, MatchResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    Lexical,
    Semantic,
}

impl MatchMode {
    pub fn top_k(&self) -> usize {
        match self {
            MatchMode::Lexical => 3,
            MatchMode::Semantic => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::Lexical => "lexical",
            MatchMode::Semantic => "semantic",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lexical" => Ok(MatchMode::Lexical),
            "semantic" => Ok(MatchMode::Semantic),
            other => Err(AppError::Configuration(format!(
                "MATCH_MODE must be 'lexical' or 'semantic', got '{other}'"
            ))),
        }
    }
}

/// One scored candidate; `candidate` is its position in the input slice.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedJob {
    pub candidate: usize,
    pub score: f64,
}

#[async_trait]
pub trait RankingStrategy: Send + Sync {
    fn mode(&self) -> MatchMode;

    async fn score_candidates(
        &self,
        resume: &FormattedDocument,
        jobs: &[FormattedDocument],
    ) -> Result<Vec<RankedJob>, AppError>;
}

/// Count-vector cosine over skill names, scored against every candidate.
pub struct LexicalStrategy;

#[async_trait]
impl RankingStrategy for LexicalStrategy {
    fn mode(&self) -> MatchMode {
        MatchMode::Lexical
    }

    async fn score_candidates(
        &self,
        resume: &FormattedDocument,
        jobs: &[FormattedDocument],
    ) -> Result<Vec<RankedJob>, AppError> {
        let job_texts: Vec<String> = jobs.iter().map(FormattedDocument::skill_text).collect();
        Ok(lexical_scores(&resume.skill_text(), &job_texts)
            .into_iter()
            .enumerate()
            .map(|(candidate, score)| RankedJob { candidate, score })
            .collect())
    }
}

/// Nearest neighbours from the job index; score is `(1 − distance) × 100`.
/// A failed embedding or index query ranks nothing, it does not fail the resume.
pub struct SemanticIndexStrategy {
    index: Arc<JobIndex>,
}

impl SemanticIndexStrategy {
    pub fn new(index: Arc<JobIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl RankingStrategy for SemanticIndexStrategy {
    fn mode(&self) -> MatchMode {
        MatchMode::Semantic
    }

    async fn score_candidates(
        &self,
        resume: &FormattedDocument,
        jobs: &[FormattedDocument],
    ) -> Result<Vec<RankedJob>, AppError> {
        let positions: HashMap<&str, usize> = jobs
            .iter()
            .enumerate()
            .map(|(i, job)| (job.doc_id.as_str(), i))
            .collect();

        let hits = match self.index.nearest(resume, self.mode().top_k()).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(resume_id = %resume.doc_id, "Semantic lookup failed, no matches: {e}");
                return Ok(Vec::new());
            }
        };
        Ok(hits
            .into_iter()
            .filter_map(|hit| match positions.get(hit.doc_id.as_str()) {
                Some(&candidate) => Some(RankedJob {
                    candidate,
                    score: ((1.0 - hit.distance) * 100.0).clamp(0.0, 100.0),
                }),
                None => {
                    warn!(job_id = %hit.doc_id, "Index hit refers to an unknown job, skipping");
                    None
                }
            })
            .collect())
    }
}

/// Highest score first; equal scores keep candidate order.
pub fn sort_ranked(ranked: &mut [RankedJob]) {
    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.candidate.cmp(&b.candidate))
    });
}

#[derive(Clone)]
pub struct MatchRanker {
    strategy: Arc<dyn RankingStrategy>,
    suggestions: SuggestionGenerator,
}

impl MatchRanker {
    pub fn new(strategy: Arc<dyn RankingStrategy>, suggestions: SuggestionGenerator) -> Self {
        Self {
            strategy,
            suggestions,
        }
    }

    pub fn mode(&self) -> MatchMode {
        self.strategy.mode()
    }

    pub async fn rank(
        &self,
        resume: &FormattedDocument,
        jobs: &[FormattedDocument],
    ) -> Result<Vec<MatchResult>, AppError> {
        let mut ranked = self.strategy.score_candidates(resume, jobs).await?;
        sort_ranked(&mut ranked);
        ranked.truncate(self.mode().top_k());

        let mut matches = Vec::with_capacity(ranked.len());
        for hit in ranked {
            let job = &jobs[hit.candidate];
            let missing = missing_skills(resume, job);
            let suggestions = self.suggestions.generate(resume, job, &missing).await;
            matches.push(MatchResult {
                job_id: job.doc_id.clone(),
                match_score: hit.score,
                missing_skills: missing,
                suggestions,
            });
        }

        info!(
            resume_id = %resume.doc_id,
            mode = %self.mode(),
            candidates = jobs.len(),
            kept = matches.len(),
            "Ranked job matches"
        );
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{EntryMetadata, LocalVectorIndex, VectorIndex};
    use crate::matching::suggestions::placeholder_suggestions;
    use crate::models::DocType;
    use crate::testing::{formatted_doc, EmptyEmbedder, ScriptedOracle, VocabularyEmbedder};

    struct FixedScores(Vec<f64>);

    #[async_trait]
    impl RankingStrategy for FixedScores {
        fn mode(&self) -> MatchMode {
            MatchMode::Lexical
        }

        async fn score_candidates(
            &self,
            _resume: &FormattedDocument,
            _jobs: &[FormattedDocument],
        ) -> Result<Vec<RankedJob>, AppError> {
            Ok(self
                .0
                .iter()
                .enumerate()
                .map(|(candidate, score)| RankedJob {
                    candidate,
                    score: *score,
                })
                .collect())
        }
    }

    fn good_suggestions() -> SuggestionGenerator {
        SuggestionGenerator::new(Arc::new(ScriptedOracle::constant(
            r#"{"suggestions": [{"area": "skills", "advice": "Add the missing tools"}]}"#,
        )))
    }

    fn jobs(n: usize) -> Vec<FormattedDocument> {
        (0..n)
            .map(|i| formatted_doc(&format!("job-{i}"), DocType::Job, &["Python"]))
            .collect()
    }

    #[test]
    fn test_match_mode_parses_and_sets_k() {
        assert_eq!("Lexical".parse::<MatchMode>().unwrap().top_k(), 3);
        assert_eq!("semantic".parse::<MatchMode>().unwrap().top_k(), 5);
        assert!(matches!(
            "fuzzy".parse::<MatchMode>(),
            Err(AppError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_rank_keeps_top_k_sorted_with_stable_ties() {
        let ranker = MatchRanker::new(
            Arc::new(FixedScores(vec![40.0, 90.0, 40.0, 10.0, 90.0])),
            good_suggestions(),
        );
        let resume = formatted_doc("cv", DocType::Resume, &["Python"]);
        let results = ranker.rank(&resume, &jobs(5)).await.unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.job_id.as_str()).collect();
        assert_eq!(ids, vec!["job-1", "job-4", "job-0"]);
        assert!(results
            .windows(2)
            .all(|w| w[0].match_score >= w[1].match_score));
    }

    #[tokio::test]
    async fn test_lexical_rank_reports_missing_skills() {
        let ranker = MatchRanker::new(Arc::new(LexicalStrategy), good_suggestions());
        let resume = formatted_doc("cv", DocType::Resume, &["Python", "SQL"]);
        let candidates = vec![
            formatted_doc("job-a", DocType::Job, &["Docker", "Kubernetes"]),
            formatted_doc("job-b", DocType::Job, &["Python", "SQL", "Docker"]),
            formatted_doc("job-c", DocType::Job, &["Python", "SQL"]),
        ];
        let results = ranker.rank(&resume, &candidates).await.unwrap();

        assert_eq!(results[0].job_id, "job-c");
        assert!((results[0].match_score - 100.0).abs() < 1e-9);
        assert_eq!(results[1].job_id, "job-b");
        assert_eq!(results[1].missing_skills, vec!["Docker"]);
        assert_eq!(results[2].match_score, 0.0);
    }

    #[tokio::test]
    async fn test_malformed_suggestions_keep_local_missing_diff() {
        let ranker = MatchRanker::new(
            Arc::new(LexicalStrategy),
            SuggestionGenerator::new(Arc::new(ScriptedOracle::constant("not json at all"))),
        );
        let resume = formatted_doc("cv", DocType::Resume, &["Python"]);
        let candidates = vec![formatted_doc("job-a", DocType::Job, &["Python", "Docker"])];
        let results = ranker.rank(&resume, &candidates).await.unwrap();

        assert_eq!(results[0].suggestions, placeholder_suggestions());
        assert_eq!(results[0].missing_skills, vec!["Docker"]);
    }

    #[tokio::test]
    async fn test_suggestions_only_for_kept_hits() {
        let oracle = Arc::new(ScriptedOracle::constant(r#"{"suggestions": []}"#));
        let ranker = MatchRanker::new(
            Arc::new(FixedScores(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])),
            SuggestionGenerator::new(oracle.clone()),
        );
        let resume = formatted_doc("cv", DocType::Resume, &["Python"]);
        ranker.rank(&resume, &jobs(6)).await.unwrap();
        assert_eq!(oracle.calls(), 3);
    }

    #[tokio::test]
    async fn test_semantic_rank_skips_unknown_jobs() {
        let index = Arc::new(LocalVectorIndex::in_memory());
        let job_index = Arc::new(JobIndex::new(
            index.clone(),
            Arc::new(VocabularyEmbedder::default()),
        ));
        let candidates = vec![
            formatted_doc("job-a", DocType::Job, &["Docker"]),
            formatted_doc("job-b", DocType::Job, &["Python", "SQL"]),
        ];
        for job in &candidates {
            job_index.store_document(job).await.unwrap();
        }
        // stale entry from an earlier batch
        index
            .upsert(
                "ghost",
                vec![1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                EntryMetadata {
                    doc_type: DocType::Job,
                    source_name: String::new(),
                },
            )
            .await
            .unwrap();

        let ranker = MatchRanker::new(
            Arc::new(SemanticIndexStrategy::new(job_index)),
            good_suggestions(),
        );
        let resume = formatted_doc("cv", DocType::Resume, &["Python", "SQL"]);
        let results = ranker.rank(&resume, &candidates).await.unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.job_id.as_str()).collect();
        assert_eq!(ids, vec!["job-b", "job-a"]);
        assert!((results[0].match_score - 100.0).abs() < 1e-6);
        assert_eq!(results[1].match_score, 0.0);
    }

    #[tokio::test]
    async fn test_semantic_rank_of_skill_less_resume_is_empty() {
        let job_index = Arc::new(JobIndex::new(
            Arc::new(LocalVectorIndex::in_memory()),
            Arc::new(VocabularyEmbedder::default()),
        ));
        let ranker = MatchRanker::new(
            Arc::new(SemanticIndexStrategy::new(job_index)),
            good_suggestions(),
        );
        let resume = formatted_doc("cv", DocType::Resume, &[]);
        assert!(ranker.rank(&resume, &jobs(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_semantic_rank_with_failed_embedding_is_empty() {
        let job_index = Arc::new(JobIndex::new(
            Arc::new(LocalVectorIndex::in_memory()),
            Arc::new(EmptyEmbedder),
        ));
        let ranker = MatchRanker::new(
            Arc::new(SemanticIndexStrategy::new(job_index)),
            good_suggestions(),
        );
        let resume = formatted_doc("cv", DocType::Resume, &["Python"]);
        assert!(ranker.rank(&resume, &jobs(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_semantic_rank_keeps_top_five() {
        let job_index = Arc::new(JobIndex::new(
            Arc::new(LocalVectorIndex::in_memory()),
            Arc::new(VocabularyEmbedder::default()),
        ));
        let skill_sets: [&[&str]; 7] = [
            &["Python"],
            &["Python", "SQL"],
            &["Docker"],
            &["SQL", "Statistics"],
            &["Kubernetes"],
            &["Python", "Docker"],
            &["Communication"],
        ];
        let candidates: Vec<FormattedDocument> = skill_sets
            .iter()
            .enumerate()
            .map(|(i, skills)| formatted_doc(&format!("job-{i}"), DocType::Job, skills))
            .collect();
        for job in &candidates {
            job_index.store_document(job).await.unwrap();
        }

        let ranker = MatchRanker::new(
            Arc::new(SemanticIndexStrategy::new(job_index)),
            good_suggestions(),
        );
        let resume = formatted_doc("cv", DocType::Resume, &["Python", "SQL"]);
        let results = ranker.rank(&resume, &candidates).await.unwrap();

        assert_eq!(results.len(), 5);
        assert_eq!(results[0].job_id, "job-1");
        assert!(results
            .windows(2)
            .all(|w| w[0].match_score >= w[1].match_score));
    }
}
