//! Summary entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "summaries")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Authenticated requester at creation time; never changes
    #[sea_orm(column_type = "Text")]
    pub owner_id: String,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    /// Raw model response, markdown with the fenced JSON block left intact
    #[sea_orm(column_type = "Text")]
    pub content: String,

    #[sea_orm(column_type = "Text")]
    pub file_url: String,

    /// Prompt template that produced `content`
    #[sea_orm(column_type = "Text")]
    pub prompt_version: String,

    /// Model identifier the completion was pinned to
    #[sea_orm(column_type = "Text")]
    pub model: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
