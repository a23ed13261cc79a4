pub mod ingest;
pub mod orchestrator;
pub mod source;

pub use orchestrator::Pipeline;
pub use source::{DirectorySource, DocumentSource, StaticSource};
