use serde_json::Value;

use crate::models::Person;

const FIRST_NAME_KEYS: &[&str] = &["first_name", "FirstName", "firstName", "firstname", "first"];
const LAST_NAME_KEYS: &[&str] = &["last_name", "LastName", "lastName", "lastname", "surname", "last"];

/// Up to two uppercase initials, `?` for a blank name
pub fn compute_initials(name: &str) -> String {
    let initials: String = name
        .split_whitespace()
        .take(2)
        .filter_map(|part| part.chars().next())
        .collect();

    if initials.is_empty() {
        "?".to_string()
    } else {
        initials.to_uppercase()
    }
}

impl Person {
    /// Display name, else "first last"
    pub fn full_name(&self) -> Option<String> {
        let display = self.display_name.as_deref().unwrap_or("").trim();
        if !display.is_empty() {
            return Some(display.to_string());
        }

        let combined = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if combined.is_empty() {
            None
        } else {
            Some(combined)
        }
    }
}

fn first_string(metadata: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| metadata.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or("")
        .to_string()
}

/// First and last name from auth user metadata, whichever key spelling was used
pub fn names_from_metadata(metadata: &Value) -> (String, String) {
    (
        first_string(metadata, FIRST_NAME_KEYS),
        first_string(metadata, LAST_NAME_KEYS),
    )
}
