//! DesignPilot review client.
//!
//! Uploads a portfolio PDF or an interview recording to the analysis
//! service and keeps a short, quota-aware history of the results.

pub mod config;
pub mod review;

pub use config::Config;
pub use review::{ContentKind, HistoryRecord, HistoryStore, UploadFlow};
