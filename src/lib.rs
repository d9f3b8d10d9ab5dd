//! Tender Service - tender lookup and feedback handling for the tenders workspace
//!
//! This library resolves loosely-typed tender identifiers against the
//! Supabase-backed tender table and encodes feedback forms into tokens that
//! survive a trip through a URL query parameter.

pub mod auth;
pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{codec, resolve, Decoded, MatchCandidateSet, ResolveError, TenderLookup};
pub use crate::models::{EvaluationBreakdown, FeedbackPayload, Split, TenderRecord};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let token = codec::encode(&FeedbackPayload::default()).unwrap();
        assert!(matches!(codec::decode(Some(&token)), Decoded::Payload(_)));
        assert!(MatchCandidateSet::from_raw(" ").is_none());
    }
}
