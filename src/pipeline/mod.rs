// Pipeline module for the extract-transform-load flow
pub mod extractor;
pub mod loader;
pub mod orchestrator;
pub mod sink;
pub mod sql;
pub mod transformer;

// Re-export main types
pub use extractor::{ExtractedRowSet, Extractor};
pub use loader::Loader;
pub use orchestrator::{JobOutcome, JobReport, Orchestrator, RunReport};
pub use sink::CsvSink;
pub use transformer::increment_second_field;
