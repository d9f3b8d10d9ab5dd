use serde::{Deserialize, Serialize};

use crate::models::domain::{ActivityEvent, ChangeLogEntry, FeedbackPayload};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>, status_code: u16) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status_code,
        }
    }
}

/// One line of the tenders listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenderSummary {
    pub id: String,
    /// Path segment that resolves back to this tender
    pub slug: String,
    pub tender_id: String,
    pub title: String,
    pub client: String,
    pub status: String,
    pub assignee: String,
    pub due: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_meta: Option<String>,
    pub response: String,
}

/// Tenders listing, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenderListResponse {
    pub tenders: Vec<TenderSummary>,
    pub total_results: usize,
}

/// Newly generated tender code
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTenderIdResponse {
    pub tender_id: String,
}

/// Created tender
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenderResponse {
    pub id: String,
    pub tender_id: String,
}

/// Result of a field edit
#[derive(Debug, Clone, Serialize)]
pub struct UpdateFieldResponse {
    pub value: String,
    pub log: ChangeLogEntry,
}

/// Recorded activity entry
#[derive(Debug, Clone, Serialize)]
pub struct RecordActivityResponse {
    pub event: ActivityEvent,
}

/// Encoded feedback token and the preview link that carries it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeFeedbackResponse {
    pub token: String,
    pub preview_path: String,
}

/// Whether usable feedback was found in the preview link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewStatus {
    Provided,
    Empty,
    Tolerated,
}

/// Decoded feedback preview
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackPreviewResponse {
    pub status: PreviewStatus,
    pub feedback: Option<FeedbackPayload>,
    pub total_weight: Option<f64>,
    pub balanced: Option<bool>,
}
