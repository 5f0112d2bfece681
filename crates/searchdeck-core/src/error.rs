use thiserror::Error;

/// Failures establishing or using the session handle.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("invalid connection settings: {0}")]
    Misconfigured(String),

    #[error("store unreachable: {0}")]
    Unreachable(String),

    #[error("credentials rejected: {0}")]
    Unauthorized(String),

    #[error("store reachable but not ready: {0}")]
    NotReady(String),
}

/// Failures executing a search. Surfaced as typed values, never panics;
/// presentation is the caller's job.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("collection not found: {0}")]
    InvalidCollection(String),

    #[error("{0} search needs an embedding provider key")]
    ProviderKeyMissing(String),

    #[error("store returned an error: {0}")]
    UpstreamFailure(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),
}
