//! Error types for the dashboard
//!
//! Uses thiserror for ergonomic error definitions.
//! Only the three form errors are recoverable; everything else aborts the
//! screen that raised it.

use thiserror::Error;

/// Custom Result type using our Error
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Dashboard errors
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Registration with a username that already exists
    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    /// A required form field was left empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Unknown username or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Market data provider errors (unknown symbol, bad payload)
    #[error("Market data error: {0}")]
    MarketData(String),

    /// Prediction model errors (unavailable, malformed output)
    #[error("Model error: {0}")]
    Model(String),

    /// Not enough price history to build a single model window
    #[error("Insufficient history: need more than {required} points, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Worker runtime errors
    #[error("Worker error: {0}")]
    Worker(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Password hashing errors
    #[error("Credential error: {0}")]
    Credential(String),
}

impl DashboardError {
    /// Form errors the user can fix and retry; state is left untouched
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DashboardError::UsernameTaken(_)
                | DashboardError::MissingField(_)
                | DashboardError::InvalidCredentials
        )
    }

    /// Short stable tag, rendered as `data-kind` on failure indicators
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardError::UsernameTaken(_)
            | DashboardError::MissingField(_)
            | DashboardError::InvalidCredentials => "form",
            DashboardError::Config(_) => "config",
            DashboardError::MarketData(_) => "market_data",
            DashboardError::Model(_) => "model",
            DashboardError::InsufficientHistory { .. } => "insufficient_history",
            DashboardError::Http(_) => "http",
            DashboardError::Json(_) => "json",
            DashboardError::Worker(_) => "worker",
            DashboardError::Storage(_) => "storage",
            DashboardError::Credential(_) => "credential",
        }
    }

    /// Message shown inline on the page
    pub fn user_message(&self) -> String {
        match self {
            DashboardError::UsernameTaken(_) => {
                "Username already exists. Please choose a different username.".to_string()
            }
            DashboardError::MissingField("username" | "password") => {
                "Please enter a username and password.".to_string()
            }
            DashboardError::MissingField(_) => "Please fill out all fields.".to_string(),
            DashboardError::InvalidCredentials => "Invalid username or password".to_string(),
            _ => "Something went wrong while building this page.".to_string(),
        }
    }
}

impl From<worker::Error> for DashboardError {
    fn from(err: worker::Error) -> Self {
        DashboardError::Worker(err.to_string())
    }
}

impl From<worker::kv::KvError> for DashboardError {
    fn from(err: worker::kv::KvError) -> Self {
        DashboardError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        DashboardError::Http(err.to_string())
    }
}

impl From<DashboardError> for worker::Error {
    fn from(err: DashboardError) -> Self {
        worker::Error::RustError(err.to_string())
    }
}
