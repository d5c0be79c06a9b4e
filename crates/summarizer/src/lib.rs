//! PaperDigest summarization pipeline
//!
//! Turns an uploaded research paper into a stored, structured summary:
//! 1. Downloads the document from blob storage
//! 2. Extracts plain text from the PDF
//! 3. Asks an LLM for a fenced-JSON summary
//! 4. Validates the answer and persists it for the owner

pub mod errors;
pub mod fetch;
pub mod llm;
pub mod parser;
pub mod pdf;
pub mod pipeline;
pub mod prompt;

pub use errors::{PipelineFailure, Stage, SummarizeError};
pub use fetch::{DocumentFetcher, HttpDocumentFetcher};
pub use llm::{ChatCompletionClient, LlmClient};
pub use parser::{ParsedSummary, SummaryPayloadParser};
pub use pdf::{PdfTextExtractor, TextExtractor};
pub use pipeline::SummarizationPipeline;
pub use prompt::{SummaryRequest, SummaryRequestBuilder, PROMPT_VERSION};
