use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

use crate::models::{TenderListRow, TenderSummary};

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// New tender code of the form `TEN-YYYYMMDD-XXXX`
pub fn generate_tender_id(date: NaiveDate) -> String {
    let suffix: String = uuid::Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(4)
        .map(|b| BASE36[(*b as usize) % BASE36.len()] as char)
        .collect();

    format!(
        "TEN-{:04}{:02}{:02}-{}",
        date.year(),
        date.month(),
        date.day(),
        suffix
    )
}

/// Trimmed text, or `None` when blank
pub fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a money amount typed with thousands separators
pub fn parse_tender_value(value: &str) -> Option<f64> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Client shown in listings: the private client, else the authority
pub fn client_display(private_client: &str, authority_client: &str) -> Option<String> {
    normalize_optional(private_client).or_else(|| normalize_optional(authority_client))
}

/// First value that is present and not blank, trimmed
fn first_filled<'a>(values: &[Option<&'a str>]) -> Option<&'a str> {
    values.iter().flatten().copied().map(str::trim).find(|v| !v.is_empty())
}

/// Read a stored date: ISO dates and timestamps, or `dd/mm/yy[yy]` as typed
/// into older forms
pub fn parse_date_input(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(stamp.date_naive());
    }
    if let Ok(stamp) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(stamp.date());
    }

    let parts: Vec<&str> = trimmed.split('/').collect();
    let [day, month, year] = parts.as_slice() else {
        return None;
    };
    let year: i32 = year.trim().parse().ok()?;
    let year = if year < 100 { 2000 + year } else { year };
    NaiveDate::from_ymd_opt(year, month.trim().parse().ok()?, day.trim().parse().ok()?)
}

/// `dd/mm/yy`, or "Not set"
pub fn format_display_date(value: Option<&str>) -> String {
    value
        .and_then(parse_date_input)
        .map(|date| date.format("%d/%m/%y").to_string())
        .unwrap_or_else(|| "Not set".to_string())
}

fn days(n: i64) -> &'static str {
    if n == 1 {
        "day"
    } else {
        "days"
    }
}

/// Relative due-date hint shown under the due column
pub fn due_meta(value: Option<&str>, today: NaiveDate) -> Option<String> {
    let date = value.and_then(parse_date_input)?;
    let diff = (date - today).num_days();

    Some(match diff {
        0 => "Due today".to_string(),
        d if d > 0 => format!("Due in {} {}", d, days(d)),
        d => format!("Overdue by {} {}", -d, days(-d)),
    })
}

/// Listing line for a stored tender, with display fallbacks filled in
pub fn summarize_tender(row: &TenderListRow, today: NaiveDate) -> TenderSummary {
    let tender_id = first_filled(&[row.tender_id.as_deref()])
        .unwrap_or(row.id.as_str())
        .to_string();
    let due = first_filled(&[row.submission_due_date.as_deref(), row.due_date.as_deref()]);
    let response = row.response_date.as_deref();

    TenderSummary {
        id: row.id.clone(),
        slug: tender_id.clone(),
        tender_id,
        title: first_filled(&[row.title.as_deref()])
            .unwrap_or("Untitled tender")
            .to_string(),
        client: first_filled(&[
            row.client_display.as_deref(),
            row.authority_client.as_deref(),
            row.private_client.as_deref(),
        ])
        .unwrap_or("—")
        .to_string(),
        status: first_filled(&[row.status.as_deref()]).unwrap_or("Draft").to_string(),
        assignee: first_filled(&[row.assigned_to_name.as_deref(), row.assigned_to.as_deref()])
            .unwrap_or("Unassigned")
            .to_string(),
        due: format_display_date(due),
        due_meta: due_meta(due, today),
        response: format_display_date(response),
    }
}

/// Free-text tender fields that may be edited in place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditableField {
    Background,
    Description,
}

impl EditableField {
    pub fn column(&self) -> &'static str {
        match self {
            EditableField::Background => "background",
            EditableField::Description => "description",
        }
    }
}

impl fmt::Display for EditableField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for EditableField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "background" => Ok(EditableField::Background),
            "description" => Ok(EditableField::Description),
            other => Err(format!("Unsupported field: {}", other)),
        }
    }
}
