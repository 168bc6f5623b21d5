//! Upload → analyze → persist.
//!
//! `submit` hands back the in-progress record right away and runs the remote
//! call on a spawned task. The task owns the record id, so its store write
//! lands on the right record no matter what the caller did in between. Tasks
//! are never cancelled; concurrent completions for one kind are persisted in
//! completion order (last write wins).

use super::client::AnalysisClient;
use super::encode::{from_data_url, to_data_url};
use super::error::{Result, ReviewError};
use super::history::{HistoryStore, SaveOutcome, DEFAULT_CAPACITY};
use super::media::{display_name, guess_media_type, validate};
use super::schema::{Analysis, ContentKind, HistoryRecord, UploadFile};
use super::storage::KeyValueStore;
use chrono::{SecondsFormat, Utc};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// An accepted upload whose analysis is still running.
pub struct Submission {
    record: HistoryRecord,
    task: JoinHandle<HistoryRecord>,
}

impl Submission {
    /// The record as it should be shown while analysis is pending.
    pub fn record(&self) -> &HistoryRecord {
        &self.record
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    /// Wait for the terminal record. It has already been persisted.
    pub async fn completed(self) -> Result<HistoryRecord> {
        let id = self.record.id;
        self.task.await.map_err(|e| ReviewError::TaskAborted {
            id,
            reason: e.to_string(),
        })
    }
}

/// What opening a history record led to.
pub enum Reopened {
    /// Results already final; nothing was sent.
    Cached(HistoryRecord),
    /// Results were missing and the file was sent again under the same id.
    Pending(Submission),
    /// Results missing and no file left to send.
    Unavailable(HistoryRecord),
}

pub struct UploadFlow {
    client: Arc<dyn AnalysisClient>,
    portfolio: HistoryStore,
    audio: HistoryStore,
}

impl UploadFlow {
    pub fn new(client: Arc<dyn AnalysisClient>, kv: Arc<dyn KeyValueStore>) -> Self {
        Self::with_capacity(client, kv, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(
        client: Arc<dyn AnalysisClient>,
        kv: Arc<dyn KeyValueStore>,
        capacity: usize,
    ) -> Self {
        Self {
            client,
            portfolio: HistoryStore::with_capacity(ContentKind::Portfolio, kv.clone(), capacity),
            audio: HistoryStore::with_capacity(ContentKind::Audio, kv, capacity),
        }
    }

    pub fn history(&self, kind: ContentKind) -> &HistoryStore {
        match kind {
            ContentKind::Portfolio => &self.portfolio,
            ContentKind::Audio => &self.audio,
        }
    }

    /// Validate `file`, start its analysis and return the in-progress record.
    ///
    /// A rejected file touches neither the store nor the network.
    pub async fn submit(&self, file: UploadFile, kind: ContentKind) -> Result<Submission> {
        if let Err(e) = validate(kind, &file) {
            warn!(
                %kind,
                file_name = %file.file_name,
                media_type = %file.media_type,
                "Rejected upload"
            );
            return Err(e);
        }

        let file = Arc::new(file);
        let mut record = new_record(kind, &file);
        let source = file.clone();
        let payload =
            tokio::task::spawn_blocking(move || to_data_url(&source.media_type, &source.data))
                .await
                .map_err(|e| ReviewError::TaskAborted {
                    id: record.id.clone(),
                    reason: e.to_string(),
                })?;
        record.payload_base64 = payload;
        info!(%kind, id = %record.id, file_name = %record.file_name, "Upload accepted");

        Ok(self.spawn_analysis(kind, record, file))
    }

    /// Show a record, analyzing it only if it never got a final result.
    pub async fn open(&self, kind: ContentKind, record: HistoryRecord) -> Reopened {
        if record.is_analyzed(kind) {
            debug!(%kind, id = %record.id, "Serving cached analysis");
            return Reopened::Cached(record);
        }

        let file = match record.file.clone() {
            Some(file) => Some(file),
            None => cached_file(&record).map(Arc::new),
        };
        match file {
            Some(file) => {
                info!(%kind, id = %record.id, "Re-analyzing record without a result");
                let pending = with_pending_results(kind, record);
                Reopened::Pending(self.spawn_analysis(kind, pending, file))
            }
            None => {
                warn!(%kind, id = %record.id, "No result and no cached payload");
                Reopened::Unavailable(record)
            }
        }
    }

    /// Look up a stored record by id and [`open`](Self::open) it.
    pub async fn reopen(&self, kind: ContentKind, id: &str) -> Result<Reopened> {
        let record = self
            .history(kind)
            .get(id)
            .ok_or_else(|| ReviewError::NotFound {
                kind,
                id: id.to_string(),
            })?;
        Ok(self.open(kind, record).await)
    }

    fn spawn_analysis(
        &self,
        kind: ContentKind,
        pending: HistoryRecord,
        file: Arc<UploadFile>,
    ) -> Submission {
        let client = self.client.clone();
        let store = self.history(kind).clone();
        let view = pending.clone();

        let task = tokio::spawn(async move {
            let outcome = client.analyze(kind, &file).await;
            let finished = apply_analysis(kind, pending, outcome);
            match store.save(&finished) {
                SaveOutcome::Stored => {}
                outcome => {
                    warn!(%kind, id = %finished.id, ?outcome, "History saved in degraded form")
                }
            }
            finished.detached()
        });

        Submission { record: view, task }
    }
}

/// Read a file from disk, taking its media type from `media_type` or its
/// extension.
pub async fn open_file(path: &Path, media_type: Option<&str>) -> Result<UploadFile> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|source| ReviewError::FileRead {
            path: path.display().to_string(),
            source,
        })?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    let media_type = media_type
        .map(str::to_string)
        .unwrap_or_else(|| guess_media_type(&file_name));
    Ok(UploadFile::new(file_name, media_type, data))
}

fn new_record(kind: ContentKind, file: &Arc<UploadFile>) -> HistoryRecord {
    let record = HistoryRecord {
        id: Uuid::now_v7().to_string(),
        name: display_name(&file.file_name),
        file_name: file.file_name.clone(),
        upload_time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        payload_base64: String::new(),
        suggestion_text: String::new(),
        transcription_text: None,
        file: Some(file.clone()),
    };
    with_pending_results(kind, record)
}

fn with_pending_results(kind: ContentKind, record: HistoryRecord) -> HistoryRecord {
    let sentinels = kind.sentinels();
    HistoryRecord {
        suggestion_text: sentinels.suggestion_pending.to_string(),
        transcription_text: kind
            .has_transcription()
            .then(|| sentinels.transcription_pending.to_string()),
        ..record
    }
}

fn cached_file(record: &HistoryRecord) -> Option<UploadFile> {
    if record.payload_base64.is_empty() {
        return None;
    }
    match from_data_url(&record.payload_base64) {
        Ok((media_type, data)) => Some(UploadFile::new(record.file_name.clone(), media_type, data)),
        Err(e) => {
            debug!(id = %record.id, error = %e, "Cached payload unusable");
            None
        }
    }
}

/// Fill result fields from the service outcome. A response with no usable
/// text is recorded as a failure.
fn apply_analysis(
    kind: ContentKind,
    record: HistoryRecord,
    outcome: anyhow::Result<Analysis>,
) -> HistoryRecord {
    let sentinels = kind.sentinels();
    let failed = || HistoryRecord {
        suggestion_text: sentinels.suggestion_failed.to_string(),
        transcription_text: kind
            .has_transcription()
            .then(|| sentinels.transcription_failed.to_string()),
        ..record.clone()
    };

    let analysis = match outcome {
        Ok(analysis) => analysis,
        Err(e) => {
            warn!(%kind, id = %record.id, error = %format!("{e:#}"), "Analysis failed");
            return failed();
        }
    };

    let suggestion = Some(analysis.suggestion).filter(|s| !s.trim().is_empty());
    let transcription = analysis.transcription.filter(|t| !t.trim().is_empty());
    if suggestion.is_none() && (!kind.has_transcription() || transcription.is_none()) {
        warn!(%kind, id = %record.id, "Analysis returned no content");
        return failed();
    }

    info!(%kind, id = %record.id, "Analysis complete");
    HistoryRecord {
        suggestion_text: suggestion.unwrap_or_else(|| sentinels.suggestion_empty.to_string()),
        transcription_text: kind
            .has_transcription()
            .then(|| transcription.unwrap_or_else(|| sentinels.transcription_empty.to_string())),
        ..record
    }
}
