use axum::http::StatusCode;
use axum::response::IntoResponse;
use thiserror::Error;

/// Everything that can go wrong while building a week's odds table.
///
/// A failed week surfaces the upstream detail (HTTP status and body where
/// available) so the caller can decide whether to retry the whole week.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The requested season/week has no entry in the static lookup tables,
    /// or a static table failed validation at load. Not retryable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network-level failure or non-2xx response from either upstream
    /// endpoint, after bounded retries.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// The odds payload is missing expected arrays or fields (typically an
    /// upstream schema change). Fatal for the requested week.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;

impl IntoResponse for IngestError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            IngestError::Configuration(_) => StatusCode::NOT_FOUND,
            IngestError::Fetch(_) => StatusCode::BAD_GATEWAY,
            IngestError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
        };
        (status, self.to_string()).into_response()
    }
}
