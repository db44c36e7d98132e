//! ragdb-query
//!
//! Everything that talks to providers: ingestion into corpus snapshots,
//! query retrieval, answer composition and the retry policy they share.

pub mod assistant;
pub mod composer;
pub mod corpus;
pub mod engine;
pub mod generate;
pub mod ingest;
pub mod retry;

pub use assistant::Assistant;
pub use composer::AnswerComposer;
pub use corpus::{Corpus, Snapshot};
pub use engine::QueryEngine;
pub use generate::OllamaGenerator;
pub use ingest::IngestPipeline;
pub use retry::{CallKind, RetryPolicy};
