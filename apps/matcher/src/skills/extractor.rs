//! Skill Extractor: raw document text → ordered, deduplicated canonical skills.
//!
//! The oracle proposes `{name, category}` pairs; only names the taxonomy knows
//! survive, in canonical casing. Extraction never fails: an unreachable oracle
//! or unusable output yields an empty list.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::llm_client::prompts::excerpt;
use crate::llm_client::{parse_json_response, TextOracle};
use crate::models::Skill;
use crate::skills::prompts::{SKILL_EXTRACTION_PROMPT, SKILL_EXTRACTION_SYSTEM};
use crate::skills::taxonomy::Taxonomy;

/// Only this many leading characters of a document are sent to the oracle.
pub const EXTRACTION_TEXT_LIMIT: usize = 2000;

fn pair_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""name"\s*:\s*"([^"]+)"\s*,\s*"category"\s*:\s*"([^"]*)""#)
            .expect("valid skill pair regex")
    })
}

#[derive(Clone)]
pub struct SkillExtractor {
    oracle: Arc<dyn TextOracle>,
    taxonomy: Arc<Taxonomy>,
}

impl SkillExtractor {
    pub fn new(oracle: Arc<dyn TextOracle>, taxonomy: Arc<Taxonomy>) -> Self {
        Self { oracle, taxonomy }
    }

    pub async fn extract(&self, text: &str) -> Vec<Skill> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let prompt = SKILL_EXTRACTION_PROMPT
            .replace("{taxonomy}", &self.taxonomy.prompt_listing())
            .replace("{text}", excerpt(text, EXTRACTION_TEXT_LIMIT));

        let raw = match self.oracle.complete(&prompt, SKILL_EXTRACTION_SYSTEM).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Skill extraction oracle call failed: {e}");
                return Vec::new();
            }
        };
        debug!(response_len = raw.len(), "Skill extraction response received");

        let candidates = parse_candidates(&raw);
        let skills = dedupe_skills(self.validate(candidates));
        info!(count = skills.len(), "Extracted skills");
        skills
    }

    /// Keeps only taxonomy skills, rewritten to their canonical names.
    fn validate(&self, candidates: Vec<(String, String)>) -> Vec<Skill> {
        candidates
            .into_iter()
            .filter_map(|(name, category)| match self.taxonomy.resolve(&name) {
                Some((canonical, taxonomy_category)) => {
                    let category = if category.trim().is_empty() {
                        taxonomy_category.to_string()
                    } else {
                        category
                    };
                    Some(Skill::new(canonical, category))
                }
                None => {
                    debug!(skill = %name, "Dropping skill outside the taxonomy");
                    None
                }
            })
            .collect()
    }
}

/// Reads `(name, category)` pairs from the oracle output. Falls back to a
/// regex scan when the payload is not a JSON array.
fn parse_candidates(raw: &str) -> Vec<(String, String)> {
    match parse_json_response::<Vec<Value>>(raw) {
        Ok(items) => items
            .iter()
            .filter_map(|item| {
                let name = item.get("name")?.as_str()?.to_string();
                let category = item
                    .get("category")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Some((name, category))
            })
            .collect(),
        Err(e) => {
            let pairs: Vec<(String, String)> = pair_regex()
                .captures_iter(raw)
                .map(|c| (c[1].to_string(), c[2].to_string()))
                .collect();
            if pairs.is_empty() {
                warn!("Unusable skill extraction output: {e}");
            } else {
                warn!(recovered = pairs.len(), "Skill extraction output was not valid JSON, recovered pairs by pattern scan");
            }
            pairs
        }
    }
}

/// First occurrence wins per canonical name, keeping its category.
pub fn dedupe_skills(skills: Vec<Skill>) -> Vec<Skill> {
    let mut seen = HashSet::new();
    skills
        .into_iter()
        .filter(|s| seen.insert(s.canonical_name.clone()))
        .collect()
}
