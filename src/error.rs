use thiserror::Error;

use crate::api_connection::connection::ApiConnectionError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures that can leave a gateway, a handler or the client.
///
/// Completion responses that are not valid JSON never surface here; the
/// completion gateway resolves them to `None` and logs them.
#[derive(Debug, Error)]
pub enum Error {
    /// A missing or malformed request parameter. Reported before any network call.
    #[error("{0}")]
    Validation(String),
    /// The graph store, the completion service or the recipe server failed.
    #[error("{service} error: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            service,
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<ApiConnectionError> for Error {
    fn from(err: ApiConnectionError) -> Self {
        Self::upstream("completion", err.to_string())
    }
}
