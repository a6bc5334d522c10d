//! Scratch and permanent storage
//!
//! - `strategy`: save strategies, path resolution, URI materialization
//! - `media_index`: registration of committed files

pub mod media_index;
pub mod strategy;

pub use media_index::{LoggingMediaIndex, MediaIndex};
pub use strategy::{DirectoryStorage, SaveStrategy, StorageConfig, StoragePaths};
