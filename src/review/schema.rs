use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Content category. Selects the allow-list, the remote endpoint and the
/// storage namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Portfolio,
    Audio,
}

impl ContentKind {
    /// Key under which the kind's history array is stored.
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Portfolio => "designpilot_projects",
            Self::Audio => "designpilot_audios",
        }
    }

    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Portfolio => "/api/analyze-portfolio",
            Self::Audio => "/api/analyze-audio",
        }
    }

    /// Label for an empty history slot, numbered from 1.
    pub fn placeholder_label(self, slot: usize) -> String {
        match self {
            Self::Portfolio => format!("Project {}", slot),
            Self::Audio => format!("Recording {}", slot),
        }
    }

    /// Shown when a file fails the allow-list.
    pub fn rejection_message(self) -> &'static str {
        match self {
            Self::Portfolio => "Please upload a PDF file",
            Self::Audio => "Please upload an mp3/wav/m4a audio file",
        }
    }

    pub fn sentinels(self) -> &'static Sentinels {
        match self {
            Self::Portfolio => &PORTFOLIO_SENTINELS,
            Self::Audio => &AUDIO_SENTINELS,
        }
    }

    pub fn has_transcription(self) -> bool {
        matches!(self, Self::Audio)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Portfolio => f.write_str("portfolio"),
            Self::Audio => f.write_str("audio"),
        }
    }
}

/// Fixed placeholder texts written into result fields.
#[derive(Debug)]
pub struct Sentinels {
    pub suggestion_pending: &'static str,
    pub suggestion_failed: &'static str,
    pub suggestion_empty: &'static str,
    pub transcription_pending: &'static str,
    pub transcription_failed: &'static str,
    pub transcription_empty: &'static str,
}

const ANALYSIS_FAILED: &str = "AI analysis failed, please try again later";
const NO_SUGGESTIONS: &str = "No AI suggestions available";

static PORTFOLIO_SENTINELS: Sentinels = Sentinels {
    suggestion_pending: "AI is analyzing your portfolio...",
    suggestion_failed: ANALYSIS_FAILED,
    suggestion_empty: NO_SUGGESTIONS,
    transcription_pending: "",
    transcription_failed: "",
    transcription_empty: "",
};

static AUDIO_SENTINELS: Sentinels = Sentinels {
    suggestion_pending: "AI is analyzing your interview...",
    suggestion_failed: ANALYSIS_FAILED,
    suggestion_empty: NO_SUGGESTIONS,
    transcription_pending: "AI is transcribing your audio...",
    transcription_failed: "Audio transcription failed, please try again later",
    transcription_empty: "No transcription available",
};

/// A user-selected file held in memory for the duration of one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub media_type: String,
    pub data: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            data,
        }
    }
}

/// One upload-and-result entry in a kind's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    pub name: String,
    pub file_name: String,
    pub upload_time: String,
    #[serde(default)]
    pub payload_base64: String,
    #[serde(default)]
    pub suggestion_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription_text: Option<String>,
    /// Original file, only present while an upload is in flight.
    #[serde(skip)]
    pub file: Option<Arc<UploadFile>>,
}

impl HistoryRecord {
    /// Copy without the in-memory file handle.
    pub fn detached(&self) -> Self {
        Self {
            file: None,
            ..self.clone()
        }
    }

    /// True when every result field holds a final value. A stored failure
    /// message counts as final.
    pub fn is_analyzed(&self, kind: ContentKind) -> bool {
        let sentinels = kind.sentinels();
        let done = |text: &str, pending: &str| !text.trim().is_empty() && text != pending;

        if !done(&self.suggestion_text, sentinels.suggestion_pending) {
            return false;
        }
        if kind.has_transcription() {
            return self
                .transcription_text
                .as_deref()
                .is_some_and(|t| done(t, sentinels.transcription_pending));
        }
        true
    }
}

impl PartialEq for HistoryRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.file_name == other.file_name
            && self.upload_time == other.upload_time
            && self.payload_base64 == other.payload_base64
            && self.suggestion_text == other.suggestion_text
            && self.transcription_text == other.transcription_text
    }
}

/// Text returned by the analysis service, normalized across kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    pub suggestion: String,
    pub transcription: Option<String>,
}

/// `POST /api/analyze-portfolio` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioAnalysisResponse {
    #[serde(default)]
    pub suggestion: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// `POST /api/analyze-audio` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioAnalysisResponse {
    #[serde(default)]
    pub asr_text: String,
    #[serde(default)]
    pub suggestion: String,
}

impl From<PortfolioAnalysisResponse> for Analysis {
    fn from(resp: PortfolioAnalysisResponse) -> Self {
        Self {
            suggestion: resp.suggestion,
            transcription: None,
        }
    }
}

impl From<AudioAnalysisResponse> for Analysis {
    fn from(resp: AudioAnalysisResponse) -> Self {
        Self {
            suggestion: resp.suggestion,
            transcription: Some(resp.asr_text),
        }
    }
}
