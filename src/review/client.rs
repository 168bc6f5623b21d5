use super::schema::{
    Analysis, AudioAnalysisResponse, ContentKind, PortfolioAnalysisResponse, UploadFile,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::{debug, instrument};

/// Remote analysis service.
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    /// Send one file for analysis. A single attempt; no retries.
    async fn analyze(&self, kind: ContentKind, file: &UploadFile) -> Result<Analysis>;
}

/// Multipart HTTP client for the `/api/analyze-*` endpoints.
pub struct HttpAnalysisClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAnalysisClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url_for(&self, kind: ContentKind) -> String {
        format!("{}{}", self.base_url, kind.endpoint())
    }
}

#[async_trait]
impl AnalysisClient for HttpAnalysisClient {
    #[instrument(skip(self, file), fields(file_name = %file.file_name, size = file.data.len()))]
    async fn analyze(&self, kind: ContentKind, file: &UploadFile) -> Result<Analysis> {
        let url = self.url_for(kind);
        let part = Part::bytes(file.data.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.media_type)
            .or_else(|_| {
                Part::bytes(file.data.clone())
                    .file_name(file.file_name.clone())
                    .mime_str("application/octet-stream")
            })
            .context("Failed to build multipart body")?;
        let form = Form::new().part("file", part);

        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("Analysis service rejected {url}"))?;

        let analysis = match kind {
            ContentKind::Portfolio => resp
                .json::<PortfolioAnalysisResponse>()
                .await
                .context("Invalid portfolio analysis response")?
                .into(),
            ContentKind::Audio => resp
                .json::<AudioAnalysisResponse>()
                .await
                .context("Invalid audio analysis response")?
                .into(),
        };
        debug!(%kind, "Analysis received");
        Ok(analysis)
    }
}
