//! ragdb-core
//!
//! Shared vocabulary of the retrieval engine: error kinds, domain types,
//! provider and index traits, the chunker, corpus loaders and configuration.

pub mod chunker;
pub mod config;
pub mod data_processor;
pub mod error;
pub mod traits;
pub mod types;

pub use chunker::{chunk, Chunker};
pub use error::{Error, Result};
