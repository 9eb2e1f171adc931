use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClientError {
    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),
    #[error("{0}")]
    Auth(String),
    #[error("Session expired, log in again at {redirect}")]
    SessionExpired { redirect: String },
    #[error("{0}")]
    Authorization(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Network error: {0}")]
    Transport(String),
    #[error("Request timeout. Please check your internet connection.")]
    Timeout,
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },
    #[error("Session storage error: {0}")]
    Session(String),
}

impl ClientError {
    /// Login route to send the user to, when the error means the session is gone.
    pub fn redirect(&self) -> Option<&str> {
        match self {
            ClientError::SessionExpired { redirect } => Some(redirect),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Session(e.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Session(e.to_string())
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ClientError::Validation(crate::error::app_error::validation_messages(&errors))
    }
}
