pub mod extractor;
pub mod prompts;
pub mod taxonomy;

pub use extractor::{dedupe_skills, SkillExtractor};
pub use taxonomy::Taxonomy;
