//! SeaORM entity models

mod summary;

pub use summary::{
    Entity as SummaryEntity,
    Model as Summary,
    ActiveModel as SummaryActiveModel,
    Column as SummaryColumn,
};

/// Fields supplied by the caller when persisting a summary.
///
/// `id` and `created_at` are assigned by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSummary {
    pub owner_id: String,
    pub title: String,
    pub content: String,
    pub file_url: String,
    pub prompt_version: String,
    pub model: String,
}
