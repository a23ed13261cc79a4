pub mod document;
pub mod report;

pub use document::{DocType, FormattedDocument, InputDocument, Skill};
pub use report::{BatchReport, MatchResult, Metrics, ResumeReport, SkippedDocument, Suggestion};
