use crate::core::identifier::{Operator, Predicate, TenderFilter};
use crate::core::resolver::TenderLookup;
use crate::core::tender::EditableField;
use crate::models::{
    ActivityRow, ChangeLogEntry, NewActivity, NewChangeLog, NewTender, Person, TenderListRow, TenderRecord,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with Supabase
#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid service key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Table names in the Supabase project
#[derive(Debug, Clone)]
pub struct SupabaseTables {
    pub tenders: String,
    pub change_logs: String,
    pub activity_logs: String,
    pub people: String,
}

/// Supabase REST (PostgREST) client
///
/// Handles all table access for the service:
/// - Resolving tenders by code or primary key
/// - Creating and editing tenders
/// - Writing change and activity history
/// - Reading and upserting people rows
pub struct SupabaseClient {
    base_url: String,
    api_key: String,
    client: Client,
    tables: SupabaseTables,
}

/// Characters with meaning inside a PostgREST logic tree
const RESERVED: &[char] = &[',', '.', ':', '(', ')', '"', '\\', ' '];

/// Render one value for a logic tree, double-quoting it when needed
pub fn render_value(value: &str) -> String {
    if value.chars().any(|c| RESERVED.contains(&c) || c.is_whitespace()) {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// Backslash-escape `ILIKE` pattern characters so the value matches literally
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Render `field.op.value`
pub fn render_predicate(predicate: &Predicate) -> String {
    let value = match predicate.op {
        Operator::Eq => render_value(&predicate.value),
        Operator::ILike => render_value(&escape_like(&predicate.value)),
    };
    format!("{}.{}.{}", predicate.field.column(), predicate.op.as_str(), value)
}

/// Render the value of an `or=` query parameter
pub fn render_or(predicates: &[Predicate]) -> String {
    let parts = predicates.iter().map(render_predicate).collect::<Vec<_>>();
    format!("({})", parts.join(","))
}

impl SupabaseClient {
    /// Create a new Supabase client
    pub fn new(base_url: String, api_key: String, tables: SupabaseTables) -> Result<Self, SupabaseError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            base_url,
            api_key,
            client,
            tables,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn check(response: Response, action: &str) -> Result<Response, SupabaseError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SupabaseError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Failed to {}: {} - {}", action, status, body);
            return Err(SupabaseError::ApiError(format!("Failed to {}: {}", action, status)));
        }
        Ok(response)
    }

    async fn rows<T: DeserializeOwned>(response: Response, what: &str) -> Result<Vec<T>, SupabaseError> {
        let json: Value = response.json().await?;
        serde_json::from_value(json)
            .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse {}: {}", what, e)))
    }

    async fn insert_returning<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
        what: &str,
    ) -> Result<T, SupabaseError> {
        let response = self
            .authorized(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let response = Self::check(response, &format!("insert {}", what)).await?;

        Self::rows::<T>(response, what)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SupabaseError::InvalidResponse(format!("Insert returned no {}", what)))
    }

    /// First tender matching any predicate of `filter`
    pub async fn find_tender(&self, filter: &TenderFilter) -> Result<Option<TenderRecord>, SupabaseError> {
        let url = format!(
            "{}?select={}&or={}&limit={}",
            self.table_url(&self.tables.tenders),
            urlencoding::encode(TenderRecord::COLUMNS),
            urlencoding::encode(&render_or(&filter.any_of)),
            filter.limit
        );

        tracing::debug!("Querying tenders: {}", url);

        let response = self.authorized(self.client.get(&url)).send().await?;
        let response = Self::check(response, "query tenders").await?;
        let tenders = Self::rows::<TenderRecord>(response, "tenders").await?;

        Ok(tenders.into_iter().next())
    }

    /// Every tender, newest first
    pub async fn list_tenders(&self) -> Result<Vec<TenderListRow>, SupabaseError> {
        let url = format!(
            "{}?select={}&order=created_at.desc",
            self.table_url(&self.tables.tenders),
            urlencoding::encode(TenderListRow::COLUMNS)
        );

        tracing::debug!("Listing tenders: {}", url);

        let response = self.authorized(self.client.get(&url)).send().await?;
        let response = Self::check(response, "list tenders").await?;
        Self::rows::<TenderListRow>(response, "tenders").await
    }

    /// Whether a tender already uses `tender_id`
    pub async fn tender_id_exists(&self, tender_id: &str) -> Result<bool, SupabaseError> {
        let url = format!(
            "{}?select=id&tender_id=eq.{}&limit=1",
            self.table_url(&self.tables.tenders),
            urlencoding::encode(tender_id)
        );

        let response = self.authorized(self.client.get(&url)).send().await?;
        let response = Self::check(response, "check tender id").await?;
        let rows = Self::rows::<Value>(response, "tenders").await?;

        Ok(!rows.is_empty())
    }

    /// Insert a tender and return the stored row
    pub async fn create_tender(&self, tender: &NewTender) -> Result<TenderRecord, SupabaseError> {
        let record: TenderRecord = self.insert_returning(&self.tables.tenders, tender, "tender").await?;
        tracing::debug!("Created tender {} ({})", record.tender_id, record.id);
        Ok(record)
    }

    /// Overwrite one free-text field of a tender
    pub async fn update_tender_field(
        &self,
        record_id: &str,
        field: EditableField,
        value: &str,
    ) -> Result<(), SupabaseError> {
        let url = format!(
            "{}?id=eq.{}",
            self.table_url(&self.tables.tenders),
            urlencoding::encode(record_id)
        );

        let mut body = serde_json::Map::new();
        body.insert(field.column().to_string(), Value::String(value.to_string()));

        let response = self
            .authorized(self.client.patch(&url))
            .json(&body)
            .send()
            .await?;
        Self::check(response, "update tender").await?;

        Ok(())
    }

    /// Record a field edit in the change log
    pub async fn insert_change_log(&self, entry: &NewChangeLog) -> Result<ChangeLogEntry, SupabaseError> {
        self.insert_returning(&self.tables.change_logs, entry, "change log entry").await
    }

    /// Record an activity note
    pub async fn insert_activity(&self, activity: &NewActivity) -> Result<ActivityRow, SupabaseError> {
        self.insert_returning(&self.tables.activity_logs, activity, "activity entry").await
    }

    /// People row for an auth user, if one exists
    pub async fn find_person(&self, user_id: &str) -> Result<Option<Person>, SupabaseError> {
        let url = format!(
            "{}?select=user_id,display_name,first_name,last_name,email,organization_id&user_id=eq.{}&limit=1",
            self.table_url(&self.tables.people),
            urlencoding::encode(user_id)
        );

        let response = self.authorized(self.client.get(&url)).send().await?;
        let response = Self::check(response, "fetch person").await?;
        let people = Self::rows::<Person>(response, "people").await?;

        Ok(people.into_iter().next())
    }

    /// Create or update the people row keyed by `user_id`
    pub async fn upsert_person(&self, person: &Person) -> Result<(), SupabaseError> {
        let url = format!("{}?on_conflict=user_id", self.table_url(&self.tables.people));

        let response = self
            .authorized(self.client.post(&url))
            .header("Prefer", "resolution=merge-duplicates")
            .json(&[person])
            .send()
            .await?;
        Self::check(response, "upsert person").await?;

        Ok(())
    }

    /// Check that the REST endpoint answers with our key
    pub async fn health_check(&self) -> Result<bool, SupabaseError> {
        let url = format!("{}?select=id&limit=1", self.table_url(&self.tables.tenders));
        let response = self.authorized(self.client.get(&url)).send().await?;
        Ok(response.status().is_success())
    }
}

impl TenderLookup for SupabaseClient {
    type Error = SupabaseError;

    async fn find_first(&self, filter: &TenderFilter) -> Result<Option<TenderRecord>, SupabaseError> {
        self.find_tender(filter).await
    }
}
