use actix_web::http::header::AUTHORIZATION;
use actix_web::http::StatusCode;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest, HttpResponse, ResponseError};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::{ready, Ready};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Audience Supabase puts in tokens of signed-in users
const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// Errors that can occur while authenticating a request
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("You must be signed in")]
    MissingToken,

    #[error("Invalid access token: {0}")]
    InvalidToken(String),

    #[error("Token verification is not configured")]
    NotConfigured,
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken | AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AuthError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse::new("unauthorized", self.to_string(), status.as_u16()))
    }
}

/// Access token claims we rely on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Value>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
}

/// Verifies Supabase-issued access tokens (HS256 with the project JWT secret)
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[AUTHENTICATED_AUDIENCE]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(AuthUser {
            id: data.claims.sub,
            email: data.claims.email,
            metadata: data.claims.user_metadata,
        })
    }
}

/// The signed-in user making a request
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub metadata: Value,
}

impl AuthUser {
    /// `full_name` from the user's auth metadata, if set
    pub fn metadata_full_name(&self) -> Option<String> {
        self.metadata
            .get("full_name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, AuthError> {
    let verifier = req
        .app_data::<web::Data<JwtVerifier>>()
        .ok_or(AuthError::NotConfigured)?;

    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)?;

    verifier.verify(token)
}

impl FromRequest for AuthUser {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = authenticate(req);
        if let Err(e) = &result {
            tracing::debug!("Rejected request to {}: {}", req.path(), e);
        }
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn sign(secret: &str, aud: &str) -> String {
        let claims = Claims {
            sub: "user-1".to_string(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
            aud: Some(json!(aud)),
            email: Some("alex@example.com".to_string()),
            user_metadata: json!({"full_name": "Alex Conner"}),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_verify_valid_token() {
        let verifier = JwtVerifier::new("secret");
        let user = verifier.verify(&sign("secret", "authenticated")).unwrap();

        assert_eq!(user.id, "user-1");
        assert_eq!(user.email.as_deref(), Some("alex@example.com"));
        assert_eq!(user.metadata_full_name().as_deref(), Some("Alex Conner"));
    }

    #[test]
    fn test_reject_wrong_secret_or_audience() {
        let verifier = JwtVerifier::new("secret");
        assert!(verifier.verify(&sign("other", "authenticated")).is_err());
        assert!(verifier.verify(&sign("secret", "anon")).is_err());
    }

    #[test]
    fn test_missing_token_is_unauthorized() {
        assert_eq!(AuthError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
    }
}
