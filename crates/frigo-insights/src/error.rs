//! Text-generation error types.

use thiserror::Error;

/// Errors a text generator can return.
///
/// These stay inside the crate's service layer: `InsightService` turns
/// every one of them into a canned message.
#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Text generator not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Remote unreachable: {0}")]
    RemoteUnreachable(String),

    #[error("Generator returned no text")]
    EmptyResponse,
}

impl InsightError {
    /// Failures that mean "no connection" rather than "bad answer".
    pub fn is_offline(&self) -> bool {
        matches!(self, InsightError::RemoteUnreachable(_))
    }
}

impl From<reqwest::Error> for InsightError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            InsightError::RemoteUnreachable(err.to_string())
        } else {
            InsightError::Api(err.to_string())
        }
    }
}

pub type InsightResult<T> = Result<T, InsightError>;
