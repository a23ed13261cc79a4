use std::collections::HashSet;
use std::sync::Arc;

use crate::models::Skill;
use crate::skills::taxonomy::Taxonomy;

/// Share of the taxonomy's hard skills a resume covers, as 0 – 100.
/// Soft skills count toward neither side of the ratio.
#[derive(Clone)]
pub struct CompletenessScorer {
    taxonomy: Arc<Taxonomy>,
}

impl CompletenessScorer {
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self { taxonomy }
    }

    pub fn score(&self, resume_skills: &[Skill]) -> f64 {
        let hard = self.taxonomy.hard_skills();
        if hard.is_empty() {
            return 0.0;
        }
        let covered: HashSet<&str> = resume_skills
            .iter()
            .map(|s| s.canonical_name.as_str())
            .filter(|name| hard.contains(*name))
            .collect();
        covered.len() as f64 / hard.len() as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_taxonomy;
    use std::collections::{BTreeMap, HashMap};

    fn skills(names: &[&str]) -> Vec<Skill> {
        names.iter().map(|n| Skill::new(*n, "")).collect()
    }

    #[test]
    fn test_soft_skills_do_not_count() {
        // 6 hard skills in the sample taxonomy
        let scorer = CompletenessScorer::new(sample_taxonomy());
        assert_eq!(scorer.score(&skills(&["Communication"])), 0.0);
        assert_eq!(scorer.score(&skills(&["Python", "SQL", "Docker"])), 50.0);
    }

    #[test]
    fn test_full_coverage_is_hundred() {
        let scorer = CompletenessScorer::new(sample_taxonomy());
        let all = skills(&[
            "Python",
            "SQL",
            "Docker",
            "Kubernetes",
            "Machine Learning",
            "Statistics",
            "Communication",
        ]);
        assert_eq!(scorer.score(&all), 100.0);
    }

    #[test]
    fn test_duplicates_and_unknown_names_are_ignored() {
        let scorer = CompletenessScorer::new(sample_taxonomy());
        assert_eq!(
            scorer.score(&skills(&["Python", "Python", "Fortran", "SQL", "Docker"])),
            50.0
        );
    }

    #[test]
    fn test_score_is_non_decreasing_as_skills_grow() {
        let scorer = CompletenessScorer::new(sample_taxonomy());
        let order = [
            "Communication",
            "Python",
            "Fortran",
            "SQL",
            "Python",
            "Docker",
            "Kubernetes",
            "Machine Learning",
            "Statistics",
        ];
        let mut previous = 0.0;
        for i in 0..=order.len() {
            let current = scorer.score(&skills(&order[..i]));
            assert!(current >= previous, "score dropped at step {i}");
            previous = current;
        }
        assert_eq!(previous, 100.0);
    }

    #[test]
    fn test_only_soft_skills_taxonomy_scores_zero() {
        let mut categories = BTreeMap::new();
        categories.insert("soft_skills".to_string(), vec!["Teamwork".to_string()]);
        let taxonomy = Taxonomy::from_parts(categories, vec![], HashMap::new());
        let scorer = CompletenessScorer::new(Arc::new(taxonomy));
        assert_eq!(scorer.score(&skills(&["Teamwork"])), 0.0);
    }
}
