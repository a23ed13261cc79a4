pub mod completeness;
pub mod lexical;
pub mod prompts;
pub mod ranker;
pub mod relevance;
pub mod suggestions;

pub use completeness::CompletenessScorer;
pub use ranker::{LexicalStrategy, MatchMode, MatchRanker, RankingStrategy, SemanticIndexStrategy};
pub use relevance::RelevanceScorer;
pub use suggestions::SuggestionGenerator;
