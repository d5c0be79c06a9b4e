//! Prompt contract for the summary completion
//!
//! The wording here is what makes the model's answer machine-parseable, so
//! any change to it must bump [`PROMPT_VERSION`]. Stored summaries record
//! the version that produced them.

use serde::Serialize;

/// Identifier of the current prompt template
pub const PROMPT_VERSION: &str = "summary-v1";

/// Keys the model is told to emit, in order
pub const SUMMARY_KEYS: [&str; 8] = [
    "title",
    "authors",
    "abstract",
    "introduction",
    "model",
    "experiments",
    "results",
    "conclusion",
];

const SYSTEM_PROMPT: &str = "You are an expert research paper summarizer. From the given research \
paper, summarize each topic briefly and mention any important points such as the datasets \
used and the algorithms used. Return a single JSON object wrapped in a markdown code \
block (```json). Include the fields: title, authors (always as a list []), abstract, \
introduction, model, experiments, results, conclusion. Use full markdown syntax (#, ##, \
**bold**, *italic*) within string values.";

const USER_PREFIX: &str = "Summarize this research paper:\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// System and user messages for one summarization call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRequest {
    pub system: String,
    pub user: String,
    pub prompt_version: &'static str,
}

impl SummaryRequest {
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage {
                role: Role::System,
                content: self.system.clone(),
            },
            ChatMessage {
                role: Role::User,
                content: self.user.clone(),
            },
        ]
    }
}

/// Composes the request sent to the LLM. Pure: same text, same request.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryRequestBuilder;

impl SummaryRequestBuilder {
    /// The extracted text is embedded verbatim; length policy belongs to the
    /// client's token budget.
    pub fn build(&self, text: &str) -> SummaryRequest {
        let mut user = String::with_capacity(USER_PREFIX.len() + text.len());
        user.push_str(USER_PREFIX);
        user.push_str(text);

        SummaryRequest {
            system: SYSTEM_PROMPT.to_string(),
            user,
            prompt_version: PROMPT_VERSION,
        }
    }
}
