//! Feedback payload codec
//!
//! Feedback forms travel to the preview page inside a single query
//! parameter. New tokens are base64 over the UTF-8 JSON text. Older links in
//! circulation carry one of several other shapes, so decoding first
//! classifies the token into a [`TokenFormat`] and then parses the JSON it
//! yields. Decoding never fails outright: callers get a [`Decoded`] and render
//! an empty state when nothing usable was supplied.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::domain::{AttachmentRef, FeedbackPayload};

/// Accepts tokens with or without `=` padding
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Errors produced while reading a feedback token
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("no feedback data supplied")]
    Empty,

    #[error("token could not be decoded: {0}")]
    DecodeFailure(String),

    #[error("feedback payload has an unexpected shape: {0}")]
    MalformedPayload(String),

    #[error("failed to serialize feedback payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Encodings feedback tokens have been issued in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFormat {
    /// JSON text as-is (the URL layer already decoded it)
    PlainJson,
    /// `encodeURIComponent(JSON)`
    UriEncodedJson,
    /// base64 over UTF-8 JSON bytes; the current format
    Base64Utf8Json,
    /// base64 over Latin-1 JSON bytes (`btoa(JSON)` from older clients)
    Base64Latin1Json,
}

/// A classified token and the JSON text it carried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
    pub format: TokenFormat,
    pub json: String,
}

/// Outcome of decoding a feedback token
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// The token held a well-formed payload
    Payload(FeedbackPayload),
    /// Nothing usable was supplied
    Empty,
    /// JSON object with some fields of the wrong type; those were defaulted
    Tolerated(FeedbackPayload),
}

impl Decoded {
    pub fn payload(&self) -> Option<&FeedbackPayload> {
        match self {
            Decoded::Payload(p) | Decoded::Tolerated(p) => Some(p),
            Decoded::Empty => None,
        }
    }

    pub fn into_payload(self) -> Option<FeedbackPayload> {
        match self {
            Decoded::Payload(p) | Decoded::Tolerated(p) => Some(p),
            Decoded::Empty => None,
        }
    }
}

/// Encode a payload as a URL-safe-ish ASCII token.
///
/// The output is standard base64 with padding; the caller still
/// percent-encodes it when building a URL.
pub fn encode(payload: &FeedbackPayload) -> Result<String, CodecError> {
    let json = serde_json::to_string(payload)?;
    Ok(STANDARD.encode(json.as_bytes()))
}

/// Path of the preview page carrying `token` for `tender_id`
pub fn preview_path(tender_id: &str, token: &str) -> String {
    format!(
        "/tenders/{}/feedback/preview?data={}",
        urlencoding::encode(tender_id),
        urlencoding::encode(token)
    )
}

/// Work out which format `raw` is in and recover the JSON text.
///
/// The formats are disjoint: JSON text starts with `{`, URI-encoded text
/// contains `%`, and neither character is in the base64 alphabet.
pub fn classify(raw: &str) -> Result<DecodedToken, CodecError> {
    let token = raw.trim();
    if token.is_empty() {
        return Err(CodecError::Empty);
    }

    if token.starts_with('{') {
        return Ok(DecodedToken {
            format: TokenFormat::PlainJson,
            json: token.to_string(),
        });
    }

    if token.contains('%') {
        let decoded = urlencoding::decode(token)
            .map_err(|e| CodecError::DecodeFailure(format!("invalid percent-encoding: {}", e)))?;
        let decoded = decoded.trim();

        if decoded.starts_with('{') {
            return Ok(DecodedToken {
                format: TokenFormat::UriEncodedJson,
                json: decoded.to_string(),
            });
        }

        // A base64 token that was percent-encoded one more time than needed
        if !decoded.contains('%') {
            return classify_base64(decoded);
        }

        return Err(CodecError::DecodeFailure("unrecognised percent-encoded token".into()));
    }

    classify_base64(token)
}

fn classify_base64(token: &str) -> Result<DecodedToken, CodecError> {
    // Form decoding turns '+' into ' '; URL-safe clients use '-' and '_'
    let normalized: String = token
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .map(|c| match c {
            ' ' | '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    let bytes = LENIENT_BASE64
        .decode(normalized.as_bytes())
        .map_err(|e| CodecError::DecodeFailure(format!("invalid base64: {}", e)))?;

    match String::from_utf8(bytes) {
        Ok(json) => Ok(DecodedToken {
            format: TokenFormat::Base64Utf8Json,
            json,
        }),
        Err(err) => Ok(DecodedToken {
            format: TokenFormat::Base64Latin1Json,
            json: err.into_bytes().into_iter().map(char::from).collect(),
        }),
    }
}

fn parse_object(raw: &str) -> Result<Map<String, Value>, CodecError> {
    let token = classify(raw)?;
    tracing::debug!("Feedback token classified as {:?}", token.format);

    match serde_json::from_str::<Value>(&token.json) {
        Ok(Value::Object(obj)) => Ok(obj),
        Ok(_) => Err(CodecError::DecodeFailure("JSON is not an object".into())),
        Err(e) => Err(CodecError::DecodeFailure(format!("invalid JSON: {}", e))),
    }
}

/// Decode a token, requiring every present field to have the right type
pub fn decode_strict(raw: &str) -> Result<FeedbackPayload, CodecError> {
    let obj = parse_object(raw)?;
    serde_json::from_value(Value::Object(obj)).map_err(|e| CodecError::MalformedPayload(e.to_string()))
}

/// Decode a token from the query string. Never fails.
pub fn decode(raw: Option<&str>) -> Decoded {
    let Some(raw) = raw else {
        return Decoded::Empty;
    };

    let obj = match parse_object(raw) {
        Ok(obj) => obj,
        Err(e) => {
            tracing::debug!("No usable feedback data: {}", e);
            return Decoded::Empty;
        }
    };

    match FeedbackPayload::deserialize_from(&obj) {
        Ok(payload) => Decoded::Payload(payload),
        Err(e) => {
            tracing::warn!("Feedback payload partially malformed, defaulting bad fields: {}", e);
            Decoded::Tolerated(lenient_payload(&obj))
        }
    }
}

impl FeedbackPayload {
    fn deserialize_from(obj: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(obj.clone()))
    }
}

/// First key present whose value has the right type
fn pick<T: DeserializeOwned>(obj: &Map<String, Value>, keys: &[&str]) -> Option<T> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find_map(|value| serde_json::from_value(value.clone()).ok())
}

/// Array entries that deserialize, skipping the rest
fn pick_items<T: DeserializeOwned>(obj: &Map<String, Value>, keys: &[&str]) -> Vec<T> {
    keys.iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_array))
        .flat_map(|items| items.iter().filter_map(|item| serde_json::from_value(item.clone()).ok()))
        .collect()
}

fn lenient_payload(obj: &Map<String, Value>) -> FeedbackPayload {
    FeedbackPayload {
        full_name: pick(obj, &["fullName", "clientName"]),
        phone_number: pick(obj, &["phoneNumber", "clientPhone"]),
        email_address: pick(obj, &["emailAddress", "clientEmail"]),
        comments: pick(obj, &["comments"]).unwrap_or_default(),
        participants_count: pick(obj, &["participantsCount"]),
        evaluation_breakdown: pick(obj, &["evaluationBreakdown"]).unwrap_or_default(),
        splits: pick_items(obj, &["splits"]),
        attachments: pick_items::<AttachmentRef>(obj, &["attachments", "suppliedDocuments"])
            .into_iter()
            .map(AttachmentRef::into_name)
            .collect(),
        evaluations: pick_items(obj, &["evaluations"]),
    }
}
