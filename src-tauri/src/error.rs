use thiserror::Error;

/// Shown for any document-store failure outside the profile fetch.
pub const STORE_RETRY_MESSAGE: &str = "Something went wrong while talking to the server. Please try again.";

#[derive(Debug, Error)]
pub enum VitalWatchError {
    /// Rejected by the credential service. The text is user-facing.
    #[error("{0}")]
    Auth(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("OAuth error: {0}")]
    OAuth(String),
}

pub type Result<T> = std::result::Result<T, VitalWatchError>;

impl VitalWatchError {
    /// Text for the UI. Credential and validation failures pass through as-is,
    /// store failures collapse into a generic retry prompt.
    pub fn user_message(&self) -> String {
        match self {
            VitalWatchError::Auth(msg) | VitalWatchError::Validation(msg) => msg.clone(),
            VitalWatchError::Store(_) | VitalWatchError::NotFound(_) => STORE_RETRY_MESSAGE.to_string(),
            VitalWatchError::Config(msg) => format!("Configuration problem: {}", msg),
            VitalWatchError::OAuth(msg) => format!("Provider sign-in failed: {}", msg),
        }
    }
}

impl From<VitalWatchError> for String {
    fn from(err: VitalWatchError) -> Self {
        err.user_message()
    }
}

impl From<reqwest::Error> for VitalWatchError {
    fn from(err: reqwest::Error) -> Self {
        VitalWatchError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for VitalWatchError {
    fn from(err: serde_json::Error) -> Self {
        VitalWatchError::Store(format!("Malformed document: {}", err))
    }
}
