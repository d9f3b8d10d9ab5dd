// Integration tests for Tender Service

use actix_web::{http::StatusCode, test, web, App};
use jsonwebtoken::{EncodingKey, Header};
use mockito::Matcher;
use serde_json::{json, Value};
use std::sync::Arc;
use tender_service::auth::{Claims, JwtVerifier};
use tender_service::models::{
    ActivityEvent, CreateTenderResponse, EncodeFeedbackResponse, ErrorResponse, EvaluationBreakdown,
    FeedbackPayload, FeedbackPreviewResponse, NewTenderIdResponse, PreviewStatus, Split, TenderListResponse,
    TenderRecord,
};
use tender_service::routes::{configure_routes, AppState};
use tender_service::services::{SupabaseClient, SupabaseTables};

fn state(url: String) -> AppState {
    let tables = SupabaseTables {
        tenders: "tenders".to_string(),
        change_logs: "tender_change_logs".to_string(),
        activity_logs: "tender_activity_logs".to_string(),
        people: "people".to_string(),
    };

    AppState {
        supabase: Arc::new(SupabaseClient::new(url, "service_key".to_string(), tables).unwrap()),
    }
}

/// Address nothing listens on; routes that stay local never touch it
fn offline_state() -> AppState {
    state("http://127.0.0.1:9".to_string())
}

const JWT_SECRET: &str = "test-secret";

fn bearer(email: Option<&str>, metadata: Value) -> String {
    let claims = Claims {
        sub: "user-1".to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        aud: Some(json!("authenticated")),
        email: email.map(str::to_string),
        user_metadata: metadata,
    };
    let token = jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes()))
        .unwrap();
    format!("Bearer {}", token)
}

fn verifier() -> web::Data<JwtVerifier> {
    web::Data::new(JwtVerifier::new(JWT_SECRET))
}

fn feedback() -> FeedbackPayload {
    FeedbackPayload {
        full_name: Some("Jane Doe".to_string()),
        email_address: Some("jane@example.com".to_string()),
        comments: "Pricing was 3rd of 5 – quality strong".to_string(),
        evaluation_breakdown: EvaluationBreakdown::Percentage,
        splits: vec![
            Split { id: "s1".to_string(), description: "Quality".to_string(), weight: 60.0 },
            Split { id: "s2".to_string(), description: "Price".to_string(), weight: 40.0 },
        ],
        attachments: vec!["feedback letter.pdf".to_string()],
        ..Default::default()
    }
}

#[actix_web::test]
async fn test_feedback_encode_then_preview() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(offline_state()))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/tenders/TEN-20251110-0I0G/feedback")
        .set_json(feedback())
        .to_request();
    let encoded: EncodeFeedbackResponse = test::call_and_read_body_json(&app, req).await;
    assert!(encoded.preview_path.starts_with("/tenders/TEN-20251110-0I0G/feedback/preview?data="));

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1{}", encoded.preview_path))
        .to_request();
    let preview: FeedbackPreviewResponse = test::call_and_read_body_json(&app, req).await;

    assert_eq!(preview.status, PreviewStatus::Provided);
    assert_eq!(preview.feedback, Some(feedback()));
    assert_eq!(preview.total_weight, Some(100.0));
    assert_eq!(preview.balanced, Some(true));
}

#[actix_web::test]
async fn test_preview_without_data_is_empty() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(offline_state()))
            .configure(configure_routes),
    )
    .await;

    for uri in [
        "/api/v1/tenders/TEN-1/feedback/preview",
        "/api/v1/tenders/TEN-1/feedback/preview?data=",
        "/api/v1/tenders/TEN-1/feedback/preview?data=%25%25%25",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let preview: FeedbackPreviewResponse = test::read_body_json(resp).await;
        assert_eq!(preview.status, PreviewStatus::Empty);
        assert!(preview.feedback.is_none());
    }
}

#[actix_web::test]
async fn test_new_tender_id() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(offline_state()))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/tenders/new-id").to_request();
    let body: NewTenderIdResponse = test::call_and_read_body_json(&app, req).await;
    assert!(body.tender_id.starts_with("TEN-"));
    assert_eq!(body.tender_id.len(), 17);
}

#[actix_web::test]
async fn test_activity_requires_sign_in() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(offline_state()))
            .app_data(web::Data::new(JwtVerifier::new("secret")))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/tenders/TEN-1/activity")
        .set_json(json!({"note": "Called the client"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/v1/tenders/TEN-1/activity")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .set_json(json!({"note": "Called the client"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_field_update_rejects_unknown_field() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(offline_state()))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/tenders/TEN-1/field")
        .set_json(json!({"tenderRecordId": "abc", "field": "title", "value": "x"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.message, "Unsupported field update requested.");
}

#[actix_web::test]
async fn test_get_tender_resolves_through_store() {
    let mut server = mockito::Server::new_async().await;
    let _found = server
        .mock("GET", "/rest/v1/tenders")
        .match_query(Matcher::UrlEncoded("limit".into(), "1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"id": "550e8400-e29b-41d4-a716-446655440000", "tender_id": "TEN-20251110-0I0G", "status": "Draft"}]"#)
        .create_async()
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state(server.url())))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/tenders/ten-20251110-0i0g")
        .to_request();
    let record: TenderRecord = test::call_and_read_body_json(&app, req).await;

    assert_eq!(record.tender_id, "TEN-20251110-0I0G");
    assert_eq!(record.status.as_deref(), Some("Draft"));
}

#[actix_web::test]
async fn test_get_tender_not_found_and_failure() {
    let mut server = mockito::Server::new_async().await;
    let _empty = server
        .mock("GET", "/rest/v1/tenders")
        .match_query(Matcher::Regex("TEN-404".into()))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;
    let _broken = server
        .mock("GET", "/rest/v1/tenders")
        .match_query(Matcher::Regex("TEN-500".into()))
        .with_status(503)
        .with_body("upstream unavailable")
        .create_async()
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state(server.url())))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/tenders/TEN-404").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/api/v1/tenders/TEN-500").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    let body: ErrorResponse = test::read_body_json(resp).await;
    assert!(body.message.contains("503"));
}

#[actix_web::test]
async fn test_list_tenders_fills_display_fallbacks() {
    let mut server = mockito::Server::new_async().await;
    let _list = server
        .mock("GET", "/rest/v1/tenders")
        .match_query(Matcher::UrlEncoded("order".into(), "created_at.desc".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"[
                {"id": "b", "tender_id": "TEN-20251111-AB12", "title": "Depot", "status": "Submitted",
                 "assigned_to_name": "Jane Doe", "authority_client": "Council", "submission_due_date": "2025-11-20"},
                {"id": "a", "tender_id": null}
            ]"#,
        )
        .create_async()
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state(server.url())))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/tenders").to_request();
    let body: TenderListResponse = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body.total_results, 2);
    let first = &body.tenders[0];
    assert_eq!(first.slug, "TEN-20251111-AB12");
    assert_eq!(first.client, "Council");
    assert_eq!(first.assignee, "Jane Doe");
    assert_eq!(first.due, "20/11/25");

    let second = &body.tenders[1];
    assert_eq!(second.tender_id, "a");
    assert_eq!(second.title, "Untitled tender");
    assert_eq!(second.client, "—");
    assert_eq!(second.status, "Draft");
    assert_eq!(second.assignee, "Unassigned");
    assert_eq!(second.due, "Not set");
}

#[actix_web::test]
async fn test_create_tender_attaches_organization() {
    let mut server = mockito::Server::new_async().await;
    let _exists = server
        .mock("GET", "/rest/v1/tenders")
        .match_query(Matcher::UrlEncoded("tender_id".into(), "eq.TEN-20251110-0I0G".into()))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;
    let _person = server
        .mock("GET", "/rest/v1/people")
        .match_query(Matcher::UrlEncoded("user_id".into(), "eq.user-1".into()))
        .with_status(200)
        .with_body(r#"[{"user_id": "user-1", "organization_id": "org-9"}]"#)
        .create_async()
        .await;
    let insert = server
        .mock("POST", "/rest/v1/tenders")
        .match_header("Prefer", "return=representation")
        .match_body(Matcher::PartialJson(json!({
            "tender_id": "TEN-20251110-0I0G",
            "title": "Community Hub",
            "organization_id": "org-9",
            "created_by": "user-1",
            "tender_value": 2100000.0,
            "client_display": "South Cambridgeshire District Council",
            "submission_due_date": "2025-11-15",
            "due_date": "2025-11-15",
            "private_client": null
        })))
        .with_status(201)
        .with_body(r#"[{"id": "new-uuid", "tender_id": "TEN-20251110-0I0G"}]"#)
        .create_async()
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state(server.url())))
            .app_data(verifier())
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/tenders")
        .insert_header(("Authorization", bearer(Some("alex@example.com"), json!({}))))
        .set_json(json!({
            "tenderId": " TEN-20251110-0I0G ",
            "tenderName": "Community Hub",
            "privateClient": "  ",
            "authorityClient": "South Cambridgeshire District Council",
            "tenderValue": "2,100,000",
            "submissionDueDate": "2025-11-15"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: CreateTenderResponse = test::read_body_json(resp).await;
    assert_eq!(body.id, "new-uuid");
    assert_eq!(body.tender_id, "TEN-20251110-0I0G");
    insert.assert_async().await;
}

#[actix_web::test]
async fn test_create_tender_rejects_duplicate_id() {
    let mut server = mockito::Server::new_async().await;
    let _exists = server
        .mock("GET", "/rest/v1/tenders")
        .match_query(Matcher::UrlEncoded("tender_id".into(), "eq.TEN-20251110-0I0G".into()))
        .with_status(200)
        .with_body(r#"[{"id": "existing"}]"#)
        .create_async()
        .await;
    let insert = server
        .mock("POST", "/rest/v1/tenders")
        .expect(0)
        .create_async()
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state(server.url())))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/tenders")
        .set_json(json!({"tenderId": "TEN-20251110-0I0G", "tenderName": "Community Hub"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.message, "Tender ID already exists. Please regenerate a new ID.");
    insert.assert_async().await;
}

/// Record a note and return the event the route answered with
async fn record_note(
    person_status: usize,
    person_body: &str,
    email: Option<&str>,
    metadata: Value,
    author: &str,
) -> ActivityEvent {
    let mut server = mockito::Server::new_async().await;
    let _person = server
        .mock("GET", "/rest/v1/people")
        .match_query(Matcher::UrlEncoded("user_id".into(), "eq.user-1".into()))
        .with_status(person_status)
        .with_body(person_body)
        .create_async()
        .await;
    let insert = server
        .mock("POST", "/rest/v1/tender_activity_logs")
        .match_body(Matcher::PartialJson(json!({
            "tender_id": "TEN-1",
            "note": "Called the client",
            "type": "note",
            "author_id": "user-1",
            "author_name": author
        })))
        .with_status(201)
        .with_body(r#"[{"id": "act-1", "created_at": "2025-11-10T09:00:00Z", "note": "Called the client", "type": "note"}]"#)
        .create_async()
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state(server.url())))
            .app_data(verifier())
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/tenders/TEN-1/activity")
        .insert_header(("Authorization", bearer(email, metadata)))
        .set_json(json!({"note": "  Called the client  "}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    insert.assert_async().await;

    let body: Value = test::read_body_json(resp).await;
    serde_json::from_value(body["event"].clone()).unwrap()
}

#[actix_web::test]
async fn test_activity_author_fallbacks() {
    let metadata = json!({"full_name": "Alex Conner"});

    let person = r#"[{"display_name": "Sam Patel"}]"#;
    let event = record_note(200, person, Some("alex@example.com"), metadata.clone(), "Sam Patel").await;
    assert_eq!(event.id, "act-1");
    assert_eq!(event.summary, "Called the client");
    assert_eq!(event.actor.name, "Sam Patel");
    assert_eq!(event.actor.initials, "SP");

    let event = record_note(200, "[]", Some("alex@example.com"), metadata, "Alex Conner").await;
    assert_eq!(event.actor.name, "Alex Conner");
    assert_eq!(event.actor.initials, "AC");

    let event = record_note(200, "[]", Some("alex@example.com"), json!({}), "alex@example.com").await;
    assert_eq!(event.actor.name, "alex@example.com");
    assert_eq!(event.actor.initials, "A");

    let event = record_note(500, "down", None, json!({}), "Team member").await;
    assert_eq!(event.actor.name, "Team member");
    assert_eq!(event.actor.initials, "TM");
}

#[actix_web::test]
async fn test_ensure_person_upserts_metadata_names() {
    let mut server = mockito::Server::new_async().await;
    let upsert = server
        .mock("POST", "/rest/v1/people")
        .match_query(Matcher::UrlEncoded("on_conflict".into(), "user_id".into()))
        .match_header("Prefer", "resolution=merge-duplicates")
        .match_body(Matcher::Json(json!([{
            "user_id": "user-1",
            "first_name": "Alex",
            "last_name": "Conner",
            "email": "alex@example.com"
        }])))
        .with_status(201)
        .create_async()
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state(server.url())))
            .app_data(verifier())
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/people/ensure")
        .insert_header((
            "Authorization",
            bearer(Some("alex@example.com"), json!({"FirstName": "Alex", "surname": "Conner"})),
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"ok": true}));
    upsert.assert_async().await;

    let req = test::TestRequest::post().uri("/api/v1/people/ensure").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_field_update_records_history() {
    let mut server = mockito::Server::new_async().await;
    let _patch = server
        .mock("PATCH", "/rest/v1/tenders")
        .match_query(Matcher::UrlEncoded("id".into(), "eq.abc".into()))
        .with_status(204)
        .create_async()
        .await;
    let _log = server
        .mock("POST", "/rest/v1/tender_change_logs")
        .match_body(Matcher::PartialJson(json!({
            "tender_id": "abc",
            "field": "background",
            "new_value": "New text",
            "changed_by": "Jane Doe"
        })))
        .with_status(201)
        .with_body(r#"[{"id": "log-1", "field": "background", "new_value": "New text", "changed_by": "Jane Doe"}]"#)
        .create_async()
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state(server.url())))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/tenders/TEN-1/field")
        .set_json(json!({"tenderRecordId": "abc", "field": " Background ", "value": "New text", "changedBy": "Jane Doe"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["value"], "New text");
    assert_eq!(body["log"]["newValue"], "New text");
    assert_eq!(body["log"]["changedBy"], "Jane Doe");
}

#[actix_web::test]
async fn test_field_update_history_failure_is_500() {
    let mut server = mockito::Server::new_async().await;
    let patch = server
        .mock("PATCH", "/rest/v1/tenders")
        .match_query(Matcher::UrlEncoded("id".into(), "eq.abc".into()))
        .with_status(204)
        .create_async()
        .await;
    let _log = server
        .mock("POST", "/rest/v1/tender_change_logs")
        .with_status(500)
        .with_body("insert failed")
        .create_async()
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state(server.url())))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/tenders/TEN-1/field")
        .set_json(json!({"tenderRecordId": "abc", "field": "description", "value": "x"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "Tender updated but history entry failed.");
    patch.assert_async().await;
}
