use serde::{Deserialize, Deserializer, Serialize};

/// Tender row as stored in the `tenders` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenderRecord {
    /// Primary key (uuid)
    pub id: String,
    /// Human-assigned code, e.g. `TEN-20251110-0I0G`
    #[serde(default)]
    pub tender_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub client_display: Option<String>,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub submission_due_date: Option<String>,
    #[serde(default)]
    pub response_date: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub tender_value: Option<f64>,
    #[serde(default)]
    pub assigned_to_name: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub organization_id: Option<String>,
}

impl TenderRecord {
    /// Columns selected whenever a full tender row is fetched
    pub const COLUMNS: &'static str = "id,tender_id,title,status,client_display,reference_number,\
submission_due_date,response_date,start_date,tender_value,assigned_to_name,background,description,organization_id";
}

/// Tender row as read for the tenders listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenderListRow {
    pub id: String,
    #[serde(default)]
    pub tender_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub assigned_to_name: Option<String>,
    #[serde(default)]
    pub submission_due_date: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub response_date: Option<String>,
    #[serde(default)]
    pub private_client: Option<String>,
    #[serde(default)]
    pub authority_client: Option<String>,
    #[serde(default)]
    pub client_display: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl TenderListRow {
    pub const COLUMNS: &'static str = "id,tender_id,title,status,assigned_to,assigned_to_name,\
submission_due_date,due_date,response_date,private_client,authority_client,client_display,created_at";
}

/// Row inserted when a tender is created
#[derive(Debug, Clone, Serialize)]
pub struct NewTender {
    pub tender_id: String,
    pub title: Option<String>,
    pub status: Option<String>,
    pub assigned_to: Option<String>,
    pub assigned_to_name: Option<String>,
    pub submission_due_date: Option<String>,
    pub due_date: Option<String>,
    pub response_date: Option<String>,
    pub start_date: Option<String>,
    pub tender_url: Option<String>,
    pub reference_number: Option<String>,
    pub tender_value: Option<f64>,
    pub private_client: Option<String>,
    pub authority_client: Option<String>,
    pub client_display: Option<String>,
    pub notes: Option<String>,
    pub background: Option<String>,
    pub description: Option<String>,
    pub attachments_meta: Option<Vec<AttachmentMeta>>,
    pub created_by: Option<String>,
    pub organization_id: Option<String>,
}

/// File metadata kept alongside a tender (never the bytes)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentMeta {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "type", default)]
    pub mime_type: String,
}

/// Row in the `people` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
}

/// Entry in `tender_change_logs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub id: String,
    pub field: String,
    #[serde(rename(serialize = "previousValue"), default)]
    pub previous_value: Option<String>,
    #[serde(rename(serialize = "newValue"), default)]
    pub new_value: Option<String>,
    #[serde(rename(serialize = "changedBy"), default)]
    pub changed_by: Option<String>,
    #[serde(rename(serialize = "changedById"), default)]
    pub changed_by_id: Option<String>,
    #[serde(rename(serialize = "changedAt"), default)]
    pub changed_at: Option<String>,
}

/// Row inserted into `tender_change_logs`
#[derive(Debug, Clone, Serialize)]
pub struct NewChangeLog {
    pub tender_id: String,
    pub field: String,
    pub previous_value: Option<String>,
    pub new_value: String,
    pub changed_by: String,
    pub changed_by_id: Option<String>,
}

/// Kind of entry in the tender activity log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Upload,
    Comment,
    Status,
    Assign,
    Edit,
    Note,
}

/// Row as returned from `tender_activity_logs`
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityRow {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub status_snapshot: Option<String>,
    #[serde(rename = "type", default)]
    pub activity_type: Option<ActivityType>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_initials: Option<String>,
}

/// Row inserted into `tender_activity_logs`
#[derive(Debug, Clone, Serialize)]
pub struct NewActivity {
    pub tender_id: String,
    pub note: String,
    pub status_snapshot: Option<String>,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub author_id: String,
    pub author_name: String,
    pub author_initials: String,
}

/// Actor shown next to an activity entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub initials: String,
}

/// Activity entry as presented to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: String,
    pub at: String,
    pub actor: Actor,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
}

/// How the evaluation weighting of a feedback form is expressed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationBreakdown {
    #[default]
    Percentage,
    Points,
    Currency,
    #[serde(other)]
    Other,
}

/// One line of an evaluation weighting breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "percentage", default)]
    pub weight: f64,
}

/// Score cells of an evaluation row, one per bidder column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreColumns {
    #[serde(rename = "A", default, skip_serializing_if = "Option::is_none")]
    pub a: Option<String>,
    #[serde(rename = "B", default, skip_serializing_if = "Option::is_none")]
    pub b: Option<String>,
    #[serde(rename = "C", default, skip_serializing_if = "Option::is_none")]
    pub c: Option<String>,
    #[serde(rename = "D", default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    #[serde(rename = "E", default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
}

/// How an evaluation row is emphasised in the scores table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationRowKind {
    Total,
    Ranking,
    #[default]
    #[serde(other)]
    Normal,
}

/// Row of the scored evaluation table carried by older feedback links
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRow {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weighting: Option<String>,
    #[serde(default)]
    pub scores: ScoreColumns,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<EvaluationRowKind>,
}

/// Feedback form contents carried through the preview link
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackPayload {
    #[serde(alias = "clientName", default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(alias = "clientPhone", default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(alias = "clientEmail", default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default)]
    pub comments: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants_count: Option<u32>,
    #[serde(default)]
    pub evaluation_breakdown: EvaluationBreakdown,
    #[serde(default)]
    pub splits: Vec<Split>,
    #[serde(alias = "suppliedDocuments", default, deserialize_with = "deserialize_attachments")]
    pub attachments: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evaluations: Vec<EvaluationRow>,
}

impl FeedbackPayload {
    /// Sum of all split weights
    pub fn total_weight(&self) -> f64 {
        self.splits
            .iter()
            .map(|s| if s.weight.is_finite() { s.weight } else { 0.0 })
            .sum()
    }

    /// True unless the breakdown is in percentages and the splits do not add up to 100
    pub fn is_balanced(&self) -> bool {
        match self.evaluation_breakdown {
            EvaluationBreakdown::Percentage => (self.total_weight() - 100.0).abs() < 1e-9,
            _ => true,
        }
    }
}

/// Attachment entries are plain names in current payloads and
/// `{ id, fileName, url }` objects in older ones.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum AttachmentRef {
    Name(String),
    Document {
        #[serde(rename = "fileName", alias = "name")]
        file_name: String,
    },
}

impl AttachmentRef {
    pub(crate) fn into_name(self) -> String {
        match self {
            AttachmentRef::Name(name) => name,
            AttachmentRef::Document { file_name } => file_name,
        }
    }
}

fn deserialize_attachments<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let refs = Vec::<AttachmentRef>::deserialize(deserializer)?;
    Ok(refs.into_iter().map(AttachmentRef::into_name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_breakdown_maps_to_other() {
        let mode: EvaluationBreakdown = serde_json::from_str("\"weighted\"").unwrap();
        assert_eq!(mode, EvaluationBreakdown::Other);
    }

    #[test]
    fn test_legacy_field_names() {
        let json = r#"{
            "clientName": "Jane Doe",
            "clientEmail": "jane@example.com",
            "suppliedDocuments": [{"id": "d1", "fileName": "scores.pdf"}],
            "splits": [{"id": "split-1", "description": "Quality", "percentage": 100}]
        }"#;
        let payload: FeedbackPayload = serde_json::from_str(json).unwrap();

        assert_eq!(payload.full_name.as_deref(), Some("Jane Doe"));
        assert_eq!(payload.email_address.as_deref(), Some("jane@example.com"));
        assert_eq!(payload.attachments, vec!["scores.pdf"]);
        assert_eq!(payload.splits[0].weight, 100.0);
        assert!(payload.is_balanced());
    }

    #[test]
    fn test_balance_only_checked_for_percentages() {
        let mut payload = FeedbackPayload {
            splits: vec![Split { id: "s1".into(), description: "Price".into(), weight: 30.0 }],
            ..Default::default()
        };
        assert!(!payload.is_balanced());

        payload.evaluation_breakdown = EvaluationBreakdown::Points;
        assert!(payload.is_balanced());
    }

    #[test]
    fn test_legacy_evaluation_rows() {
        let json = r#"{
            "clientName": "Jane Doe",
            "evaluations": [
                {"id": "q", "label": "Quality", "weighting": "60%", "scores": {"A": "48", "B": "42.5"}},
                {"id": "r", "label": "Ranking", "scores": {"A": "1st", "E": "5th"}, "variant": "ranking"}
            ]
        }"#;
        let payload: FeedbackPayload = serde_json::from_str(json).unwrap();

        assert_eq!(payload.evaluations.len(), 2);
        assert_eq!(payload.evaluations[0].weighting.as_deref(), Some("60%"));
        assert_eq!(payload.evaluations[0].scores.b.as_deref(), Some("42.5"));
        assert_eq!(payload.evaluations[0].variant, None);
        assert_eq!(payload.evaluations[1].scores.e.as_deref(), Some("5th"));
        assert_eq!(payload.evaluations[1].variant, Some(EvaluationRowKind::Ranking));

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["evaluations"][0]["scores"]["A"], "48");
    }

    #[test]
    fn test_no_evaluations_not_serialized() {
        let json = serde_json::to_value(FeedbackPayload::default()).unwrap();
        assert!(json.get("evaluations").is_none());
    }

    #[test]
    fn test_tender_record_defaults() {
        let record: TenderRecord =
            serde_json::from_str(r#"{"id": "abc", "tender_id": "TEN-1"}"#).unwrap();
        assert_eq!(record.tender_id, "TEN-1");
        assert!(record.title.is_none());
    }
}
