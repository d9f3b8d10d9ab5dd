use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::auth::AuthUser;
use crate::core::identifier::clean_identifier;
use crate::core::people::{compute_initials, names_from_metadata};
use crate::core::resolver::{resolve, ResolveError};
use crate::core::tender::{
    client_display, generate_tender_id, normalize_optional, parse_tender_value, summarize_tender, EditableField,
};
use crate::models::{
    ActivityEvent, ActivityType, Actor, CreateTenderRequest, CreateTenderResponse, ErrorResponse, HealthResponse,
    NewActivity, NewChangeLog, NewTender, NewTenderIdResponse, Person, RecordActivityRequest,
    RecordActivityResponse, TenderListResponse, UpdateFieldRequest, UpdateFieldResponse,
};
use crate::services::SupabaseClient;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub supabase: Arc<SupabaseClient>,
}

/// Configure all tender routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/tenders", web::get().to(list_tenders))
        .route("/tenders", web::post().to(create_tender))
        .route("/tenders/new-id", web::get().to(new_tender_id))
        .route("/tenders/{tender_id}", web::get().to(get_tender))
        .route("/tenders/{tender_id}/field", web::post().to(update_field))
        .route("/tenders/{tender_id}/activity", web::post().to(record_activity))
        .route("/people/ensure", web::post().to(ensure_person));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = state.supabase.health_check().await.unwrap_or(false);

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// List tenders, newest first
///
/// GET /api/v1/tenders
async fn list_tenders(state: web::Data<AppState>) -> impl Responder {
    let rows = match state.supabase.list_tenders().await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to load tenders: {}", e);
            return HttpResponse::BadGateway().json(ErrorResponse::new("Unable to load tenders", e.to_string(), 502));
        }
    };

    let today = chrono::Local::now().date_naive();
    let tenders: Vec<_> = rows.iter().map(|row| summarize_tender(row, today)).collect();

    HttpResponse::Ok().json(TenderListResponse {
        total_results: tenders.len(),
        tenders,
    })
}

/// Suggest a fresh tender code
///
/// GET /api/v1/tenders/new-id
async fn new_tender_id() -> impl Responder {
    HttpResponse::Ok().json(NewTenderIdResponse {
        tender_id: generate_tender_id(chrono::Local::now().date_naive()),
    })
}

/// Look up a tender by code or primary key
///
/// GET /api/v1/tenders/{tender_id}
///
/// Case, surrounding whitespace and stray line breaks in the identifier are
/// ignored.
async fn get_tender(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let raw = path.into_inner();

    match resolve(state.supabase.as_ref(), &raw).await {
        Ok(tender) => {
            tracing::info!("Resolved tender {:?} to {}", raw, tender.id);
            HttpResponse::Ok().json(tender)
        }
        Err(ResolveError::NotFound) => {
            tracing::info!("No tender matches {:?}", raw);
            HttpResponse::NotFound().json(ErrorResponse::new(
                "Tender not found",
                format!("No tender matches \"{}\"", clean_identifier(&raw)),
                404,
            ))
        }
        Err(e @ ResolveError::Transport(_)) => HttpResponse::BadGateway().json(ErrorResponse::new(
            "Unable to load tender",
            e.to_string(),
            502,
        )),
    }
}

/// Create a tender
///
/// POST /api/v1/tenders
///
/// Request body:
/// ```json
/// {
///   "tenderId": "TEN-20251110-0I0G",
///   "tenderName": "Community Hub at Gamlingay",
///   "privateClient": "",
///   "authorityClient": "South Cambridgeshire District Council",
///   "tenderValue": "2,100,000",
///   "submissionDueDate": "2025-11-15",
///   "attachments": [{"name": "brief.pdf", "size": 1024, "type": "application/pdf"}]
/// }
/// ```
async fn create_tender(
    state: web::Data<AppState>,
    user: Option<AuthUser>,
    req: web::Json<CreateTenderRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for create_tender request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse::new("Validation failed", errors.to_string(), 400));
    }

    let tender_id = req.tender_id.trim().to_string();
    let title = req.tender_name.trim().to_string();
    if tender_id.is_empty() {
        return HttpResponse::BadRequest().json(ErrorResponse::new("Validation failed", "Missing tender ID.", 400));
    }
    if title.is_empty() {
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "Validation failed",
            "Please provide a tender name.",
            400,
        ));
    }

    match state.supabase.tender_id_exists(&tender_id).await {
        Ok(true) => {
            return HttpResponse::Conflict().json(ErrorResponse::new(
                "Duplicate tender ID",
                "Tender ID already exists. Please regenerate a new ID.",
                409,
            ));
        }
        Ok(false) => {}
        Err(e) => {
            tracing::error!("Failed to check tender id {}: {}", tender_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse::new(
                "Failed to create tender",
                e.to_string(),
                500,
            ));
        }
    }

    let user_id = user.as_ref().map(|u| u.id.clone());

    let organization_id = match &user_id {
        Some(id) => match state.supabase.find_person(id).await {
            Ok(person) => person.and_then(|p| p.organization_id),
            Err(e) => {
                tracing::warn!("Failed to resolve organization for tender: {}", e);
                None
            }
        },
        None => None,
    };

    let due_date = normalize_optional(&req.submission_due_date);

    let tender = NewTender {
        tender_id: tender_id.clone(),
        title: Some(title),
        status: normalize_optional(&req.status),
        assigned_to: normalize_optional(&req.assign),
        assigned_to_name: req.assign_name.as_deref().and_then(normalize_optional),
        submission_due_date: due_date.clone(),
        due_date,
        response_date: normalize_optional(&req.response_date),
        start_date: normalize_optional(&req.start_date),
        tender_url: normalize_optional(&req.tender_url),
        reference_number: normalize_optional(&req.reference_number),
        tender_value: parse_tender_value(&req.tender_value),
        private_client: normalize_optional(&req.private_client),
        authority_client: normalize_optional(&req.authority_client),
        client_display: client_display(&req.private_client, &req.authority_client),
        notes: normalize_optional(&req.notes),
        background: normalize_optional(&req.background),
        description: normalize_optional(&req.description),
        attachments_meta: if req.attachments.is_empty() { None } else { Some(req.attachments.clone()) },
        created_by: user_id,
        organization_id,
    };

    match state.supabase.create_tender(&tender).await {
        Ok(record) => {
            tracing::info!("Created tender {} ({})", record.tender_id, record.id);
            HttpResponse::Created().json(CreateTenderResponse {
                id: record.id,
                tender_id: record.tender_id,
            })
        }
        Err(e) => {
            tracing::error!("Failed to create tender {}: {}", tender_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Failed to create tender", e.to_string(), 500))
        }
    }
}

/// Edit a free-text tender field and record the change
///
/// POST /api/v1/tenders/{tender_id}/field
///
/// Request body:
/// ```json
/// {
///   "tenderRecordId": "uuid",
///   "field": "background|description",
///   "value": "string",
///   "previousValue": "string",
///   "changedBy": "string"
/// }
/// ```
async fn update_field(
    state: web::Data<AppState>,
    _path: web::Path<String>,
    req: web::Json<UpdateFieldRequest>,
) -> impl Responder {
    let req = req.into_inner();

    let Some(record_id) = req.tender_record_id.as_deref().and_then(normalize_optional) else {
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "Validation failed",
            "Missing tender record identifier.",
            400,
        ));
    };

    let field = match req.field.as_deref().unwrap_or("").parse::<EditableField>() {
        Ok(field) => field,
        Err(_) => {
            return HttpResponse::BadRequest().json(ErrorResponse::new(
                "Validation failed",
                "Unsupported field update requested.",
                400,
            ));
        }
    };

    let value = req.value.unwrap_or_default();
    let changed_by = req
        .changed_by
        .as_deref()
        .and_then(normalize_optional)
        .unwrap_or_else(|| "Unknown user".to_string());

    if let Err(e) = state.supabase.update_tender_field(&record_id, field, &value).await {
        tracing::error!("Tender field update failed for {}: {}", record_id, e);
        return HttpResponse::InternalServerError().json(ErrorResponse::new(
            "Unable to update tender.",
            e.to_string(),
            500,
        ));
    }

    let entry = NewChangeLog {
        tender_id: record_id.clone(),
        field: field.to_string(),
        previous_value: req.previous_value,
        new_value: value.clone(),
        changed_by,
        changed_by_id: req.changed_by_id,
    };

    match state.supabase.insert_change_log(&entry).await {
        Ok(log) => {
            tracing::info!("Updated {} of tender {}", field, record_id);
            HttpResponse::Ok().json(UpdateFieldResponse { value, log })
        }
        Err(e) => {
            tracing::error!("Failed to record tender change log for {}: {}", record_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse::new(
                "Tender updated but history entry failed.",
                e.to_string(),
                500,
            ))
        }
    }
}

/// Add a note to a tender's activity log
///
/// POST /api/v1/tenders/{tender_id}/activity
///
/// Request body:
/// ```json
/// {
///   "note": "string",
///   "status": "string",
///   "tenderId": "string"
/// }
/// ```
async fn record_activity(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
    req: web::Json<RecordActivityRequest>,
) -> impl Responder {
    let req = req.into_inner();

    let Some(note) = req.note.as_deref().and_then(normalize_optional) else {
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "Validation failed",
            "Activity note cannot be empty.",
            400,
        ));
    };
    let status_snapshot = req.status.as_deref().and_then(normalize_optional);

    let tender_slug = Some(clean_identifier(&path.into_inner()))
        .filter(|s| !s.is_empty())
        .or_else(|| req.tender_id.as_deref().and_then(normalize_optional));
    let Some(tender_slug) = tender_slug else {
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "Validation failed",
            "Tender reference is required.",
            400,
        ));
    };

    let person_name = match state.supabase.find_person(&user.id).await {
        Ok(person) => person.and_then(|p| p.full_name()),
        Err(e) => {
            tracing::warn!("Activity author lookup failed for {}: {}", user.id, e);
            None
        }
    };

    let author_name = person_name
        .or_else(|| user.metadata_full_name())
        .or_else(|| user.email.clone())
        .unwrap_or_else(|| "Team member".to_string());
    let initials = compute_initials(&author_name);

    let activity = NewActivity {
        tender_id: tender_slug.clone(),
        note: note.clone(),
        status_snapshot,
        activity_type: ActivityType::Note,
        author_id: user.id.clone(),
        author_name: author_name.clone(),
        author_initials: initials.clone(),
    };

    let row = match state.supabase.insert_activity(&activity).await {
        Ok(row) => row,
        Err(e) => {
            tracing::error!("Activity log insert failed for {}: {}", tender_slug, e);
            return HttpResponse::InternalServerError().json(ErrorResponse::new(
                "Failed to record activity.",
                e.to_string(),
                500,
            ));
        }
    };

    let event = ActivityEvent {
        id: row.id,
        at: row.created_at.unwrap_or_else(|| chrono::Utc::now().to_rfc3339()),
        actor: Actor {
            name: row.author_name.unwrap_or(author_name),
            initials: row.author_initials.unwrap_or(initials).to_uppercase(),
        },
        activity_type: row.activity_type.unwrap_or(ActivityType::Note),
        summary: row.note.unwrap_or(note),
        meta: row.status_snapshot.map(|s| format!("Status recorded: {}", s)),
    };

    tracing::info!("Recorded activity on tender {} by {}", tender_slug, user.id);

    HttpResponse::Created().json(RecordActivityResponse { event })
}

/// Create or refresh the caller's people row
///
/// POST /api/v1/people/ensure
async fn ensure_person(state: web::Data<AppState>, user: AuthUser) -> impl Responder {
    let (first_name, last_name) = names_from_metadata(&user.metadata);

    let person = Person {
        user_id: Some(user.id.clone()),
        first_name: Some(first_name),
        last_name: Some(last_name),
        email: user.email.clone(),
        ..Default::default()
    };

    match state.supabase.upsert_person(&person).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "ok": true })),
        Err(e) => {
            tracing::error!("Failed to upsert person for {}: {}", user.id, e);
            HttpResponse::BadRequest().json(ErrorResponse::new("Failed to save person", e.to_string(), 400))
        }
    }
}
