use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the page-fetching service.
///
/// None of these escape the update cycle: a failed or timed-out fetch is
/// recovered as an empty candidate set and reported through `CycleStatus`,
/// so callers of `run` never see an `Err`.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("fetch service returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("fetch response was not a listing array: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("fetch did not complete within {0:?}")]
    Timeout(Duration),
}
