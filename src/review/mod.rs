//! Portfolio and interview-audio review.
//!
//! Validates uploads, sends them to the analysis service, and keeps a small
//! per-kind history of results in key-value storage.

pub mod client;
pub mod display;
pub mod encode;
pub mod error;
pub mod flow;
pub mod history;
pub mod media;
pub mod schema;
pub mod storage;

pub use client::{AnalysisClient, HttpAnalysisClient};
pub use error::ReviewError;
pub use flow::{open_file, Reopened, Submission, UploadFlow};
pub use history::{HistoryStore, SaveOutcome};
pub use schema::{Analysis, ContentKind, HistoryRecord, UploadFile};
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, StorageError};
