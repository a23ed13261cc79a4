//! Skill taxonomy: the fixed vocabulary every extracted skill is validated against.
//!
//! Loaded once at startup from `config/skills.json` and shared read-only as `Arc<Taxonomy>`.
//! The file maps category → canonical names, plus two reserved keys:
//! `critical_skills` (static fallback for must-haves) and `synonyms` (alias → canonical name).

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::AppError;

/// Category excluded from completeness math.
pub const SOFT_SKILLS_CATEGORY: &str = "soft_skills";

#[derive(Debug, Deserialize)]
struct TaxonomyFile {
    #[serde(default)]
    critical_skills: Vec<String>,
    #[serde(default)]
    synonyms: HashMap<String, String>,
    #[serde(flatten)]
    categories: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone)]
struct Entry {
    canonical: String,
    category: String,
}

#[derive(Debug, Clone)]
pub struct Taxonomy {
    categories: BTreeMap<String, Vec<String>>,
    critical_skills: Vec<String>,
    /// Lowercased name or alias → canonical entry.
    lookup: HashMap<String, Entry>,
    hard_skills: HashSet<String>,
}

impl Taxonomy {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Configuration(format!(
                "Cannot read skill taxonomy at {}: {e}",
                path.display()
            ))
        })?;
        let taxonomy = Self::from_json(&raw)?;
        info!(
            path = %path.display(),
            categories = taxonomy.categories.len(),
            skills = taxonomy.lookup_names().count(),
            "Skill taxonomy loaded"
        );
        Ok(taxonomy)
    }

    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let file: TaxonomyFile = serde_json::from_str(raw)
            .map_err(|e| AppError::Configuration(format!("Invalid skill taxonomy: {e}")))?;
        let taxonomy = Self::from_parts(file.categories, file.critical_skills, file.synonyms);
        if taxonomy.lookup.is_empty() {
            return Err(AppError::Configuration(
                "Skill taxonomy contains no skills".to_string(),
            ));
        }
        Ok(taxonomy)
    }

    pub fn from_parts(
        categories: BTreeMap<String, Vec<String>>,
        critical_skills: Vec<String>,
        synonyms: HashMap<String, String>,
    ) -> Self {
        let mut lookup: HashMap<String, Entry> = HashMap::new();
        let mut hard_skills = HashSet::new();

        for (category, names) in &categories {
            for name in names {
                let key = name.trim().to_lowercase();
                if key.is_empty() || lookup.contains_key(&key) {
                    continue;
                }
                if category != SOFT_SKILLS_CATEGORY {
                    hard_skills.insert(name.clone());
                }
                lookup.insert(
                    key,
                    Entry {
                        canonical: name.clone(),
                        category: category.clone(),
                    },
                );
            }
        }

        for (alias, target) in &synonyms {
            let Some(entry) = lookup.get(&target.trim().to_lowercase()).cloned() else {
                warn!(alias = %alias, target = %target, "Synonym points outside the taxonomy, ignoring");
                continue;
            };
            lookup.entry(alias.trim().to_lowercase()).or_insert(entry);
        }

        let mut taxonomy = Self {
            categories,
            critical_skills: Vec::new(),
            lookup,
            hard_skills,
        };
        taxonomy.critical_skills = taxonomy.canonicalize(&critical_skills);
        taxonomy
    }

    /// Resolves a name or alias (case-insensitive) to `(canonical_name, category)`.
    pub fn resolve(&self, name: &str) -> Option<(&str, &str)> {
        self.lookup
            .get(&name.trim().to_lowercase())
            .map(|e| (e.canonical.as_str(), e.category.as_str()))
    }

    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        self.resolve(name).map(|(canonical, _)| canonical)
    }

    /// Maps names to canonical form, dropping unknown names and duplicates.
    pub fn canonicalize<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        let mut seen = HashSet::new();
        names
            .iter()
            .filter_map(|n| self.canonical_name(n.as_ref()))
            .filter(|c| seen.insert(*c))
            .map(str::to_owned)
            .collect()
    }

    pub fn critical_skills(&self) -> &[String] {
        &self.critical_skills
    }

    /// All canonical names outside the soft-skills category.
    pub fn hard_skills(&self) -> &HashSet<String> {
        &self.hard_skills
    }

    pub fn categories(&self) -> &BTreeMap<String, Vec<String>> {
        &self.categories
    }

    /// Category → names as pretty JSON, for embedding in prompts.
    pub fn prompt_listing(&self) -> String {
        serde_json::to_string_pretty(&self.categories).unwrap_or_default()
    }

    fn lookup_names(&self) -> impl Iterator<Item = &str> {
        self.categories.values().flatten().map(String::as_str)
    }
}
