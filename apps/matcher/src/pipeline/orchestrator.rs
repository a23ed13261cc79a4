//! Pipeline Orchestrator: extraction → scoring → ranking → persistence.
//!
//! A batch run resets the job index, processes every job posting first (the
//! candidate pool), then scores, ranks and persists one report per resume.
//! A document that fails is skipped and listed; the batch carries on.

use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::AppError;
use crate::index::JobIndex;
use crate::llm_client::TextOracle;
use crate::matching::{
    CompletenessScorer, LexicalStrategy, MatchMode, MatchRanker, RankingStrategy,
    RelevanceScorer, SemanticIndexStrategy, SuggestionGenerator,
};
use crate::models::document::validate_doc_id;
use crate::models::{
    BatchReport, DocType, FormattedDocument, InputDocument, Metrics, ResumeReport,
    SkippedDocument,
};
use crate::pipeline::source::DocumentSource;
use crate::skills::{SkillExtractor, Taxonomy};
use crate::storage::{matches_key, processed_key, DocumentStore};

#[derive(Clone)]
pub struct Pipeline {
    extractor: SkillExtractor,
    relevance: RelevanceScorer,
    completeness: CompletenessScorer,
    ranker: MatchRanker,
    job_index: Option<Arc<JobIndex>>,
    store: DocumentStore,
}

impl Pipeline {
    /// Wires every component from one oracle. With a job index the ranker
    /// runs in semantic mode, without one in lexical mode.
    pub fn assemble(
        oracle: Arc<dyn TextOracle>,
        taxonomy: Arc<Taxonomy>,
        job_index: Option<Arc<JobIndex>>,
        store: DocumentStore,
    ) -> Self {
        let strategy: Arc<dyn RankingStrategy> = match &job_index {
            Some(index) => Arc::new(SemanticIndexStrategy::new(index.clone())),
            None => Arc::new(LexicalStrategy),
        };
        Self {
            extractor: SkillExtractor::new(oracle.clone(), taxonomy.clone()),
            relevance: RelevanceScorer::new(oracle.clone(), taxonomy.clone()),
            completeness: CompletenessScorer::new(taxonomy),
            ranker: MatchRanker::new(strategy, SuggestionGenerator::new(oracle)),
            job_index,
            store,
        }
    }

    pub fn mode(&self) -> MatchMode {
        self.ranker.mode()
    }

    pub async fn run(
        &self,
        resumes: &dyn DocumentSource,
        jobs: &dyn DocumentSource,
    ) -> Result<BatchReport, AppError> {
        if resumes.doc_type() != DocType::Resume || jobs.doc_type() != DocType::Job {
            return Err(AppError::Validation(
                "Batch run needs a resume source and a job source".to_string(),
            ));
        }
        info!(mode = %self.mode(), "Starting batch run");

        if let Some(index) = &self.job_index {
            index.reset().await?;
        }

        let mut report = BatchReport::default();

        let job_batch = jobs.load().await?;
        report.skipped.extend(job_batch.rejected);
        let mut pool = Vec::with_capacity(job_batch.documents.len());
        for input in job_batch.documents {
            let doc_id = input.doc_id.clone();
            match self.process(input, DocType::Job).await {
                Ok(job) => {
                    self.index_job(&job).await;
                    pool.push(job);
                }
                Err(e) => skip(&mut report, doc_id, DocType::Job, e),
            }
        }

        let resume_batch = resumes.load().await?;
        report.skipped.extend(resume_batch.rejected);

        let mut critical = Vec::with_capacity(pool.len());
        if !resume_batch.documents.is_empty() {
            for job in &pool {
                critical.push(self.relevance.critical_skills(job).await);
            }
        }

        for input in resume_batch.documents {
            let doc_id = input.doc_id.clone();
            match self.score_resume(input, &pool, &critical).await {
                Ok(resume_report) => report.reports.push(resume_report),
                Err(e) => skip(&mut report, doc_id, DocType::Resume, e),
            }
        }

        info!(
            jobs = pool.len(),
            reports = report.reports.len(),
            skipped = report.skipped.len(),
            "Batch run finished"
        );
        Ok(report)
    }

    /// Processes one uploaded document. Job postings also go into the index.
    pub async fn ingest(&self, input: InputDocument) -> Result<FormattedDocument, AppError> {
        let doc_type = input.doc_type;
        let doc = self.process(input, doc_type).await?;
        if doc_type == DocType::Job {
            self.index_job(&doc).await;
        }
        Ok(doc)
    }

    pub async fn document(&self, doc_id: &str) -> Result<Option<FormattedDocument>, AppError> {
        validate_doc_id(doc_id)?;
        self.store.load(&processed_key(doc_id)).await
    }

    pub async fn match_report(&self, doc_id: &str) -> Result<Option<ResumeReport>, AppError> {
        validate_doc_id(doc_id)?;
        self.store.load(&matches_key(doc_id)).await
    }

    async fn process(
        &self,
        input: InputDocument,
        expected: DocType,
    ) -> Result<FormattedDocument, AppError> {
        input.validate_as(expected)?;
        let skills = self.extractor.extract(&input.text).await;
        let doc = FormattedDocument::from_input(input, skills);
        self.store.save(&processed_key(&doc.doc_id), &doc).await?;
        Ok(doc)
    }

    async fn index_job(&self, job: &FormattedDocument) {
        if let Some(index) = &self.job_index {
            if let Err(e) = index.store_document(job).await {
                warn!(job_id = %job.doc_id, "Job not indexed: {e}");
            }
        }
    }

    async fn score_resume(
        &self,
        input: InputDocument,
        pool: &[FormattedDocument],
        critical: &[Vec<String>],
    ) -> Result<ResumeReport, AppError> {
        let resume = self.process(input, DocType::Resume).await?;

        let mut relevance = 0.0_f64;
        for (job, job_critical) in pool.iter().zip(critical) {
            let score = self
                .relevance
                .score_with_critical(
                    &resume.skills,
                    &job.skills,
                    job_critical,
                    &resume.text,
                    &job.text,
                )
                .await;
            relevance = relevance.max(score);
        }
        let completeness = self.completeness.score(&resume.skills);
        let job_matches = self.ranker.rank(&resume, pool).await?;

        let report = ResumeReport {
            doc_id: resume.doc_id,
            doc_type: resume.doc_type,
            skills: resume.skills,
            metrics: Metrics {
                relevance_score: relevance,
                completeness_score: completeness,
            },
            job_matches,
        };
        self.store.save(&matches_key(&report.doc_id), &report).await?;
        info!(
            resume_id = %report.doc_id,
            relevance = report.metrics.relevance_score,
            completeness = report.metrics.completeness_score,
            matches = report.job_matches.len(),
            "Resume processed"
        );
        Ok(report)
    }
}

fn skip(report: &mut BatchReport, doc_id: String, doc_type: DocType, error: AppError) {
    warn!(%doc_id, %doc_type, "Skipping document: {error}");
    report.skipped.push(SkippedDocument {
        doc_id,
        doc_type,
        reason: error.to_string(),
    });
}
