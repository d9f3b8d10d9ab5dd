use actix_web::{web, HttpResponse, Responder};

use crate::core::codec::{self, Decoded};
use crate::core::identifier::clean_identifier;
use crate::models::{
    EncodeFeedbackResponse, ErrorResponse, FeedbackPayload, FeedbackPreviewResponse, PreviewQuery, PreviewStatus,
};

/// Configure feedback routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/tenders/{tender_id}/feedback", web::post().to(encode_feedback))
        .route("/tenders/{tender_id}/feedback/preview", web::get().to(preview_feedback));
}

/// Turn a submitted feedback form into a preview link
///
/// POST /api/v1/tenders/{tender_id}/feedback
///
/// Request body:
/// ```json
/// {
///   "fullName": "Jane Doe",
///   "comments": "string",
///   "evaluationBreakdown": "percentage|points|currency|other",
///   "splits": [{"id": "s1", "description": "Quality", "weight": 60}],
///   "attachments": ["scores.pdf"]
/// }
/// ```
async fn encode_feedback(path: web::Path<String>, req: web::Json<FeedbackPayload>) -> impl Responder {
    let tender_id = clean_identifier(&path.into_inner());
    let payload = req.into_inner();

    if !payload.is_balanced() {
        tracing::debug!(
            "Feedback for {} has percentage splits totalling {}",
            tender_id,
            payload.total_weight()
        );
    }

    match codec::encode(&payload) {
        Ok(token) => {
            let preview_path = codec::preview_path(&tender_id, &token);
            HttpResponse::Ok().json(EncodeFeedbackResponse { token, preview_path })
        }
        Err(e) => {
            tracing::error!("Failed to encode feedback for {}: {}", tender_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Failed to encode feedback", e.to_string(), 500))
        }
    }
}

/// Decode the feedback carried in a preview link
///
/// GET /api/v1/tenders/{tender_id}/feedback/preview?data={token}
///
/// Always answers 200; a missing or unreadable token yields `"status": "empty"`.
async fn preview_feedback(query: web::Query<PreviewQuery>) -> impl Responder {
    let decoded = codec::decode(query.data.as_deref());

    let status = match &decoded {
        Decoded::Payload(_) => PreviewStatus::Provided,
        Decoded::Empty => PreviewStatus::Empty,
        Decoded::Tolerated(_) => PreviewStatus::Tolerated,
    };
    let feedback = decoded.into_payload();

    HttpResponse::Ok().json(FeedbackPreviewResponse {
        status,
        total_weight: feedback.as_ref().map(FeedbackPayload::total_weight),
        balanced: feedback.as_ref().map(FeedbackPayload::is_balanced),
        feedback,
    })
}
