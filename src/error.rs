//! Error types for the workspace_sync crate.

use thiserror::Error;

/// Errors that can occur when authorizing or talking to Google Workspace APIs.
#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Authorization was denied: {0}")]
    ConsentDenied(String),

    #[error("Invalid client secret file: {0}")]
    InvalidClientSecret(String),

    #[error("Invalid authorization callback: {0}")]
    InvalidCallback(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid URL or ID: {0}")]
    InvalidUrlOrId(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Token refresh failed: {0}")]
    TokenRefreshError(String),
}

/// Result type alias for WorkspaceError.
pub type Result<T> = std::result::Result<T, WorkspaceError>;
