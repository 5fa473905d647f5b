//! Error types for CRUD verification

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrudError {
    #[error("{step}: expected status {expected}, got {actual} (body: {body})")]
    UnexpectedStatus {
        step: String,
        expected: String,
        actual: u16,
        body: String,
    },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Record has no identifier; create must run before {0}")]
    MissingIdentifier(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("WebDriver failed to start: {0}")]
    DriverStartup(String),

    #[error("WebDriver health check failed after {0} attempts")]
    DriverHealthCheck(usize),

    #[error("WebDriver error: {0}")]
    WebDriver(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type CrudResult<T> = Result<T, CrudError>;

impl CrudError {
    /// Build an [`CrudError::UnexpectedStatus`] listing every accepted code
    pub fn unexpected_status(step: &str, expected: &[u16], actual: u16, body: &str) -> Self {
        let expected = expected
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" or ");
        CrudError::UnexpectedStatus {
            step: step.to_string(),
            expected,
            actual,
            body: body.chars().take(200).collect(),
        }
    }
}
