use thiserror::Error;

/// Errors returned by the Apify REST API client.
#[derive(Debug, Error)]
pub enum ApifyError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Apify API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response or request body could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required actor environment variable is not set
    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),
}

pub type Result<T> = std::result::Result<T, ApifyError>;
