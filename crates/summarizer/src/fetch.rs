//! Blob storage download

use crate::errors::SummarizeError;
use async_trait::async_trait;
use paperdigest_common::config::StorageConfig;
use paperdigest_common::errors::{AppError, Result};
use reqwest::Url;
use std::time::Duration;
use tracing::debug;

/// Retrieves previously uploaded document bytes
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> std::result::Result<Vec<u8>, SummarizeError>;
}

/// Plain HTTP GET against the blob store's public URL
pub struct HttpDocumentFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpDocumentFetcher {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            max_bytes: config.max_document_bytes,
        })
    }

    fn too_large(&self, size: usize) -> SummarizeError {
        SummarizeError::InvalidInput(format!(
            "document is {} bytes, limit is {} bytes",
            size, self.max_bytes
        ))
    }
}

#[async_trait]
impl DocumentFetcher for HttpDocumentFetcher {
    async fn fetch(&self, url: &Url) -> std::result::Result<Vec<u8>, SummarizeError> {
        let mut response = self.client.get(url.clone()).send().await.map_err(|e| {
            let reason = if e.is_timeout() { "timed out" } else { "request failed" };
            // Signed blob URLs carry credentials in the query string
            SummarizeError::UpstreamUnavailable(format!("Blob fetch {}: {}", reason, e.without_url()))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SummarizeError::UpstreamUnavailable(format!(
                "Blob fetch returned {}",
                status
            )));
        }

        if let Some(len) = response.content_length() {
            if len as usize > self.max_bytes {
                return Err(self.too_large(len as usize));
            }
        }

        // Content-Length is optional (chunked bodies), so the limit is
        // enforced on the bytes actually received
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            SummarizeError::UpstreamUnavailable(format!("Blob body read failed: {}", e.without_url()))
        })? {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(self.too_large(bytes.len() + chunk.len()));
            }
            bytes.extend_from_slice(&chunk);
        }

        debug!(size = bytes.len(), "Document downloaded");
        Ok(bytes)
    }
}
