//! Deterministic stand-ins for the oracles and the blob store. Compiled for tests only.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::AppError;
use crate::llm_client::embedding::EmbeddingOracle;
use crate::llm_client::{LlmError, TextOracle};
use crate::matching::prompts::{CRITICAL_SKILLS_SYSTEM, SIMILARITY_SYSTEM, SUGGESTIONS_SYSTEM};
use crate::models::{DocType, FormattedDocument, InputDocument, Skill};
use crate::skills::prompts::SKILL_EXTRACTION_SYSTEM;
use crate::skills::taxonomy::Taxonomy;
use crate::storage::BlobStore;

pub const SAMPLE_TAXONOMY: &str = r#"{
    "programming_languages": ["Python", "SQL"],
    "cloud_devops": ["Docker", "Kubernetes"],
    "data_science": ["Machine Learning", "Statistics"],
    "soft_skills": ["Communication"],
    "critical_skills": ["Python", "SQL"],
    "synonyms": {"Py": "Python", "K8s": "Kubernetes", "ML": "Machine Learning"}
}"#;

pub fn sample_taxonomy() -> Arc<Taxonomy> {
    Arc::new(Taxonomy::from_json(SAMPLE_TAXONOMY).expect("sample taxonomy is valid"))
}

pub fn input_doc(doc_id: &str, doc_type: DocType, text: &str) -> InputDocument {
    InputDocument {
        doc_id: doc_id.to_string(),
        doc_type,
        text: text.to_string(),
        word_count: text.split_whitespace().count(),
        file_name: Some(format!("{doc_id}.txt")),
        file_size_mb: 0.0,
        job_title: None,
        company: None,
    }
}

pub fn formatted_doc(doc_id: &str, doc_type: DocType, skills: &[&str]) -> FormattedDocument {
    let text = skills.join(", ");
    FormattedDocument::from_input(
        input_doc(doc_id, doc_type, &text),
        skills.iter().map(|s| Skill::new(*s, "")).collect(),
    )
}

type Responder = dyn Fn(&str, &str) -> Result<String, LlmError> + Send + Sync;

/// Answers every call through a closure over `(prompt, system)`.
pub struct ScriptedOracle {
    responder: Box<Responder>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new(
        responder: impl Fn(&str, &str) -> Result<String, LlmError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn constant(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_, _| Ok(text.clone()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextOracle for ScriptedOracle {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.responder)(prompt, system)
    }
}

pub fn unavailable() -> LlmError {
    LlmError::Api {
        status: 503,
        message: "oracle unavailable".to_string(),
    }
}

/// A whole-pipeline oracle: extraction reports every taxonomy name that
/// appears in the text, critical skills are empty, similarity is fixed at
/// `similarity`, and suggestions are one well-formed entry.
pub fn pipeline_oracle(taxonomy: Arc<Taxonomy>, similarity: u32) -> ScriptedOracle {
    ScriptedOracle::new(move |prompt, system| {
        if system == SKILL_EXTRACTION_SYSTEM {
            let text = prompt
                .rsplit_once("TEXT:\n")
                .map(|(_, t)| t.to_lowercase())
                .unwrap_or_default();
            let found: Vec<serde_json::Value> = taxonomy
                .categories()
                .iter()
                .flat_map(|(category, names)| {
                    names.iter().map(move |name| (category.clone(), name.clone()))
                })
                .filter(|(_, name)| text.contains(&name.to_lowercase()))
                .map(|(category, name)| serde_json::json!({"name": name, "category": category}))
                .collect();
            Ok(serde_json::Value::Array(found).to_string())
        } else if system == CRITICAL_SKILLS_SYSTEM {
            Ok("[]".to_string())
        } else if system == SIMILARITY_SYSTEM {
            Ok(similarity.to_string())
        } else if system == SUGGESTIONS_SYSTEM {
            Ok(r#"{"match_score": 70, "missing_skills": [], "suggestions": [{"area": "skills", "advice": "Highlight relevant projects"}]}"#.to_string())
        } else {
            Err(unavailable())
        }
    })
}

/// Bag-of-words embedding over a fixed vocabulary.
pub struct VocabularyEmbedder {
    vocabulary: Vec<String>,
    calls: AtomicUsize,
}

impl VocabularyEmbedder {
    pub fn new(vocabulary: &[&str]) -> Self {
        Self {
            vocabulary: vocabulary.iter().map(|w| w.to_lowercase()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for VocabularyEmbedder {
    fn default() -> Self {
        Self::new(&[
            "python",
            "sql",
            "docker",
            "kubernetes",
            "machine",
            "learning",
            "statistics",
            "communication",
        ])
    }
}

#[async_trait]
impl EmbeddingOracle for VocabularyEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let tokens: Vec<String> = text.split_whitespace().map(|t| t.to_lowercase()).collect();
        Ok(self
            .vocabulary
            .iter()
            .map(|w| tokens.iter().filter(|t| *t == w).count() as f32)
            .collect())
    }
}

/// Returns a well-formed but empty vector.
pub struct EmptyEmbedder;

#[async_trait]
impl EmbeddingOracle for EmptyEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
        Ok(Vec::new())
    }
}

/// Vocabulary embedding, except that any text containing `marker` embeds to nothing.
pub struct BlankingEmbedder {
    inner: VocabularyEmbedder,
    marker: String,
}

impl BlankingEmbedder {
    pub fn new(marker: &str) -> Self {
        Self {
            inner: VocabularyEmbedder::default(),
            marker: marker.to_string(),
        }
    }
}

#[async_trait]
impl EmbeddingOracle for BlankingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        if text.contains(&self.marker) {
            return Ok(Vec::new());
        }
        self.inner.embed(text).await
    }
}

/// In-memory blob store that can be told to fail its next N operations.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Bytes>>,
    failing_puts: AtomicUsize,
    failing_gets: AtomicUsize,
    puts: AtomicUsize,
    gets: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_puts(&self, n: usize) {
        self.failing_puts.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_gets(&self, n: usize) {
        self.failing_gets.store(n, Ordering::SeqCst);
    }

    pub fn put_calls(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(key)
    }

    pub fn insert(&self, key: &str, body: &str) {
        self.blobs
            .lock()
            .unwrap()
            .insert(key.to_string(), Bytes::from(body.to_string()));
    }
}

fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, body: Bytes) -> Result<(), AppError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.failing_puts) {
            return Err(AppError::Storage(format!("injected put failure for {key}")));
        }
        self.blobs.lock().unwrap().insert(key.to_string(), body);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, AppError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.failing_gets) {
            return Err(AppError::Storage(format!("injected get failure for {key}")));
        }
        Ok(self.blobs.lock().unwrap().get(key).cloned())
    }
}
