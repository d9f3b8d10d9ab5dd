use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::AttachmentMeta;

/// Request to create a tender
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenderRequest {
    #[validate(length(min = 1, message = "Missing tender ID."))]
    pub tender_id: String,
    #[validate(length(min = 1, message = "Please provide a tender name."))]
    pub tender_name: String,
    #[serde(default)]
    pub private_client: String,
    #[serde(default)]
    pub authority_client: String,
    #[serde(default)]
    pub reference_number: String,
    #[serde(default)]
    pub tender_value: String,
    #[serde(default)]
    pub tender_url: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub submission_due_date: String,
    #[serde(default)]
    pub response_date: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub assign: String,
    #[serde(default)]
    pub assign_name: Option<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub background: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentMeta>,
}

/// Request to edit a free-text tender field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFieldRequest {
    #[serde(default)]
    pub tender_record_id: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub previous_value: Option<String>,
    #[serde(default)]
    pub changed_by: Option<String>,
    #[serde(default)]
    pub changed_by_id: Option<String>,
}

/// Request to add a note to a tender's activity log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordActivityRequest {
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tender_id: Option<String>,
}

/// Query string of the feedback preview route
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewQuery {
    pub data: Option<String>,
}
