use std::future::Future;

use thiserror::Error;

use crate::core::identifier::{MatchCandidateSet, TenderFilter};
use crate::models::TenderRecord;

/// Errors that can occur while resolving a tender identifier
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Tender not found")]
    NotFound,

    #[error("Tender lookup failed: {0}")]
    Transport(String),
}

/// Store able to answer a disjunctive tender query
pub trait TenderLookup {
    type Error: std::fmt::Display;

    /// First row matching any predicate of `filter`, if one exists
    fn find_first(
        &self,
        filter: &TenderFilter,
    ) -> impl Future<Output = Result<Option<TenderRecord>, Self::Error>> + Send;
}

/// Resolve a user-supplied tender identifier to a single record
///
/// When several rows match different spellings, the store's row order
/// decides which one comes back.
pub async fn resolve<L: TenderLookup>(lookup: &L, raw: &str) -> Result<TenderRecord, ResolveError> {
    let Some(candidates) = MatchCandidateSet::from_raw(raw) else {
        tracing::debug!("Empty tender identifier, skipping lookup");
        return Err(ResolveError::NotFound);
    };

    let filter = candidates.filter();
    tracing::debug!(
        "Resolving tender {:?} with {} predicates (uuid: {})",
        candidates.cleaned(),
        filter.any_of.len(),
        candidates.is_uuid()
    );

    match lookup.find_first(&filter).await {
        Ok(Some(record)) => Ok(record),
        Ok(None) => Err(ResolveError::NotFound),
        Err(e) => {
            tracing::error!("Tender lookup for {:?} failed: {}", candidates.cleaned(), e);
            Err(ResolveError::Transport(e.to_string()))
        }
    }
}
