//! Summarization pipeline
//!
//! fetch → extract → request → parse → persist, strictly in that order and
//! exactly once each. The repository write is the last step, so any earlier
//! failure (or cancellation) leaves nothing behind.

use crate::errors::{PipelineFailure, Stage, SummarizeError};
use crate::fetch::DocumentFetcher;
use crate::llm::LlmClient;
use crate::parser::{fallback_title, SummaryPayloadParser};
use crate::pdf::TextExtractor;
use crate::prompt::SummaryRequestBuilder;
use paperdigest_common::db::models::{NewSummary, Summary};
use paperdigest_common::db::SummaryRepository;
use paperdigest_common::metrics;
use reqwest::Url;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Default bound on the completion call
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(120);

/// Orchestrates one summarization per call.
///
/// Holds no per-request state; a single instance is shared by all handlers.
pub struct SummarizationPipeline {
    fetcher: Arc<dyn DocumentFetcher>,
    extractor: Arc<dyn TextExtractor>,
    builder: SummaryRequestBuilder,
    llm: Arc<dyn LlmClient>,
    parser: SummaryPayloadParser,
    repository: Arc<dyn SummaryRepository>,
    llm_timeout: Duration,
}

impl SummarizationPipeline {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        extractor: Arc<dyn TextExtractor>,
        llm: Arc<dyn LlmClient>,
        repository: Arc<dyn SummaryRepository>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            builder: SummaryRequestBuilder,
            llm,
            parser: SummaryPayloadParser,
            repository,
            llm_timeout: DEFAULT_LLM_TIMEOUT,
        }
    }

    pub fn with_llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = timeout;
        self
    }

    /// Summarize the document at `file_url` on behalf of `owner_id`.
    ///
    /// On success exactly one summary has been written. On failure nothing
    /// has been written and the error carries the stage that failed.
    #[instrument(skip(self, file_url), fields(owner_id = %owner_id, file_url = %without_query(file_url)))]
    pub async fn summarize(&self, owner_id: &str, file_url: &str) -> Result<Summary, PipelineFailure> {
        let start = Instant::now();
        let result = self.run(owner_id, file_url).await;
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(summary) => {
                metrics::record_summarize(elapsed, "success");
                info!(summary_id = %summary.id, duration_secs = elapsed, "Summary stored");
            }
            Err(failure) => {
                metrics::record_summarize(elapsed, failure.error.kind());
                warn!(
                    stage = %failure.stage,
                    kind = failure.error.kind(),
                    error = %failure.error,
                    "Summarization failed"
                );
            }
        }

        result
    }

    async fn run(&self, owner_id: &str, file_url: &str) -> Result<Summary, PipelineFailure> {
        let fail = |stage: Stage| move |error: SummarizeError| PipelineFailure::new(stage, error);

        let file_url = file_url.trim();
        let url = validate(owner_id, file_url).map_err(fail(Stage::Validating))?;

        debug!(stage = %Stage::Fetching, "Fetching document");
        let bytes = self.fetcher.fetch(&url).await.map_err(fail(Stage::Fetching))?;
        metrics::record_document_size(bytes.len());

        debug!(stage = %Stage::Extracting, size = bytes.len(), "Extracting text");
        let extractor = Arc::clone(&self.extractor);
        let text = tokio::task::spawn_blocking(move || extractor.extract(&bytes))
            .await
            .map_err(|e| SummarizeError::Extraction(format!("extraction task failed: {}", e)))
            .and_then(|r| r)
            .map_err(fail(Stage::Extracting))?;

        if text.is_empty() {
            // Image-only documents still go to the model; it decides what to say
            warn!("Document produced no extractable text");
        }

        debug!(stage = %Stage::Requesting, text_len = text.len(), "Requesting summary");
        let request = self.builder.build(&text);
        let draft = tokio::time::timeout(self.llm_timeout, self.llm.complete(&request))
            .await
            .map_err(|_| {
                SummarizeError::UpstreamUnavailable(format!(
                    "LLM call exceeded {}s",
                    self.llm_timeout.as_secs()
                ))
            })
            .and_then(|r| r)
            .map_err(fail(Stage::Requesting))?;

        debug!(stage = %Stage::Parsing, draft_len = draft.len(), "Parsing summary");
        let parsed = self
            .parser
            .parse(&draft, &fallback_title(file_url))
            .map_err(fail(Stage::Parsing))?;

        debug!(stage = %Stage::Persisting, title = %parsed.title, "Persisting summary");
        let summary = self
            .repository
            .create(NewSummary {
                owner_id: owner_id.to_string(),
                title: parsed.title,
                content: draft,
                file_url: file_url.to_string(),
                prompt_version: request.prompt_version.to_string(),
                model: self.llm.model().to_string(),
            })
            .await
            .map_err(|e| SummarizeError::Persistence(e.to_string()))
            .map_err(fail(Stage::Persisting))?;

        debug!(stage = %Stage::Done, "Pipeline complete");
        Ok(summary)
    }
}

/// Locator safe for logs: signed URLs carry their credentials after `?`
fn without_query(file_url: &str) -> &str {
    file_url
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
}

fn validate(owner_id: &str, file_url: &str) -> Result<Url, SummarizeError> {
    if owner_id.trim().is_empty() {
        return Err(SummarizeError::InvalidInput("owner is required".to_string()));
    }
    if file_url.is_empty() {
        return Err(SummarizeError::InvalidInput("fileUrl is required".to_string()));
    }

    let url = Url::parse(file_url)
        .map_err(|e| SummarizeError::InvalidInput(format!("fileUrl is not a valid URL: {}", e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(SummarizeError::InvalidInput(format!(
            "fileUrl scheme '{}' is not supported",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_http_urls() {
        assert!(validate("user-1", "https://blob.example/a.pdf").is_ok());
        assert!(validate("user-1", "http://localhost:9000/a.pdf").is_ok());
    }

    #[test]
    fn test_logged_locator_drops_query() {
        assert_eq!(
            without_query("https://blob.example/u/a.pdf?sig=s3cr3t&exp=1"),
            "https://blob.example/u/a.pdf"
        );
        assert_eq!(without_query("https://blob.example/a.pdf#page=2"), "https://blob.example/a.pdf");
        assert_eq!(without_query("https://blob.example/a.pdf"), "https://blob.example/a.pdf");
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        for (owner, url) in [
            ("", "https://blob.example/a.pdf"),
            ("  ", "https://blob.example/a.pdf"),
            ("user-1", ""),
            ("user-1", "not a url"),
            ("user-1", "file:///etc/passwd"),
            ("user-1", "ftp://blob.example/a.pdf"),
        ] {
            let err = validate(owner, url).unwrap_err();
            assert_eq!(err.kind(), "invalid_input", "owner={owner:?} url={url:?}");
        }
    }
}
