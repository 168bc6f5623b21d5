use super::schema::ContentKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviewError {
    /// The file's type is not on the kind's allow-list.
    #[error("{} (got {media_type:?})", .kind.rejection_message())]
    UnsupportedMediaType { kind: ContentKind, media_type: String },

    /// The selected file could not be read.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No {kind} record with id {id}")]
    NotFound { kind: ContentKind, id: String },

    #[error("Cached payload is not a base64 data URL")]
    InvalidPayload,

    /// The background analysis task ended without producing a record.
    #[error("Analysis task for {id} did not complete: {reason}")]
    TaskAborted { id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ReviewError>;
