//! Commit module
//!
//! Moves accepted captures into permanent storage and registers them with
//! the media index.

pub mod pipeline;
pub mod types;

pub use pipeline::{commit_percent, CommitPipeline};
pub use types::{CommitOutcome, CommitReport, CommitResult, CommittedFile, Compressor};
