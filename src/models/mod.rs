// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    ActivityEvent, ActivityRow, ActivityType, Actor, AttachmentMeta, ChangeLogEntry, EvaluationBreakdown,
    EvaluationRow, EvaluationRowKind, FeedbackPayload, NewActivity, NewChangeLog, NewTender, Person,
    ScoreColumns, Split, TenderListRow, TenderRecord,
};
pub use requests::{CreateTenderRequest, PreviewQuery, RecordActivityRequest, UpdateFieldRequest};
pub use responses::{
    CreateTenderResponse, EncodeFeedbackResponse, ErrorResponse, FeedbackPreviewResponse, HealthResponse,
    NewTenderIdResponse, PreviewStatus, RecordActivityResponse, TenderListResponse, TenderSummary,
    UpdateFieldResponse,
};
