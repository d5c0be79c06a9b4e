//! Shared fixtures for pipeline integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use paperdigest_common::db::models::{NewSummary, Summary};
use paperdigest_common::db::{InMemorySummaryRepository, SummaryRepository};
use paperdigest_common::errors::{AppError, Result};
use paperdigest_summarizer::{
    DocumentFetcher, LlmClient, PdfTextExtractor, SummarizeError, SummaryRequest, TextExtractor,
};
use reqwest::Url;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

pub const TEST_MODEL: &str = "test/model";

pub const REFERENCE_DRAFT: &str =
    "```json\n{\"title\":\"Deep Nets\",\"authors\":[\"A\",\"B\"],\"abstract\":\"**x**\"}\n```";

/// Single-page PDF with one text line per entry
pub fn sample_pdf(lines: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("Td", vec![72.into(), 720.into()]),
    ];
    for line in lines {
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        operations.push(Operation::new("Td", vec![0.into(), (-14).into()]));
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Serves fixed bytes for every URL
pub struct StaticFetcher {
    bytes: Vec<u8>,
    pub calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DocumentFetcher for StaticFetcher {
    async fn fetch(&self, _url: &Url) -> std::result::Result<Vec<u8>, SummarizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.bytes.clone())
    }
}

/// Real extractor with a call counter
#[derive(Default)]
pub struct CountingExtractor {
    pub calls: AtomicUsize,
}

impl TextExtractor for CountingExtractor {
    fn extract(&self, bytes: &[u8]) -> std::result::Result<String, SummarizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        PdfTextExtractor.extract(bytes)
    }
}

/// LLM double that answers from a script and records the prompts it saw
pub struct ScriptedLlm {
    reply: std::result::Result<String, SummarizeError>,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn replying(draft: &str) -> Self {
        Self {
            reply: Ok(draft.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: SummarizeError) -> Self {
        Self {
            reply: Err(error),
            ..Self::replying("")
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: &SummaryRequest) -> std::result::Result<String, SummarizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.user.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone()
    }

    fn model(&self) -> &str {
        TEST_MODEL
    }
}

/// In-memory store that counts writes and can be told to fail them
#[derive(Default)]
pub struct CountingRepository {
    inner: InMemorySummaryRepository,
    fail_writes: bool,
    pub creates: AtomicUsize,
}

impl CountingRepository {
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SummaryRepository for CountingRepository {
    async fn create(&self, summary: NewSummary) -> Result<Summary> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(AppError::Persistence {
                message: "store is read-only".to_string(),
            });
        }
        self.inner.create(summary).await
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Summary>> {
        self.inner.list_by_owner(owner_id).await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Summary>> {
        self.inner.get_by_id(id).await
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

pub fn arc<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
