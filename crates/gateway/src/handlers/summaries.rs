//! Summary handlers

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use paperdigest_common::{
    auth::AuthContext,
    db::models::Summary,
    errors::{AppError, Result},
};

/// Body of `POST /v1/summaries`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeRequest {
    /// Public URL of the uploaded PDF
    #[serde(default)]
    #[validate(length(min = 1, max = 2048, message = "fileUrl is required"))]
    pub file_url: String,
}

#[derive(Serialize)]
pub struct SummarizeResponse {
    pub message: &'static str,
    pub summary: Summary,
}

#[derive(Serialize)]
pub struct SummaryListResponse {
    pub summaries: Vec<Summary>,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub summary: Summary,
}

/// Summarize an uploaded paper and store the result for the caller
pub async fn summarize(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: std::result::Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<SummarizeResponse>> {
    let Json(request) = payload.map_err(|e| AppError::InvalidFormat {
        message: e.body_text(),
    })?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("fileUrl".to_string()),
    })?;

    let summary = state
        .pipeline
        .summarize(&auth.owner_id, &request.file_url)
        .await
        .map_err(AppError::from)?;

    tracing::info!(
        request_id = %auth.request_id,
        summary_id = %summary.id,
        owner_id = %auth.owner_id,
        "File summarized"
    );

    Ok(Json(SummarizeResponse {
        message: "File summarized",
        summary,
    }))
}

/// List the caller's summaries, newest first
pub async fn list_summaries(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<SummaryListResponse>> {
    let summaries = state.repository.list_by_owner(&auth.owner_id).await?;

    Ok(Json(SummaryListResponse { summaries }))
}

/// Fetch one of the caller's summaries
pub async fn get_summary(
    State(state): State<AppState>,
    auth: AuthContext,
    id: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SummaryResponse>> {
    let Path(id) = id.map_err(|e| AppError::InvalidFormat {
        message: e.body_text(),
    })?;

    let summary = state
        .repository
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::SummaryNotFound { id: id.to_string() })?;

    if summary.owner_id != auth.owner_id {
        return Err(AppError::Forbidden {
            message: "Summary belongs to another user".to_string(),
        });
    }

    Ok(Json(SummaryResponse { summary }))
}
