//! Data models for the token file, the client secret and the Sheets/Docs APIs.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use oauth2::basic::BasicTokenResponse;
use oauth2::TokenResponse;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, WorkspaceError};

/// Google OAuth2 token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Google OAuth2 authorization endpoint.
pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// A grant is treated as expired this long before its real expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

/// An authorized-user grant, stored in the same JSON layout Google's client
/// libraries use for `token.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationGrant {
    #[serde(rename = "token", default)]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl AuthorizationGrant {
    /// Build a grant from a code exchange response.
    pub fn from_token_response(
        response: &BasicTokenResponse,
        secret: &ClientSecret,
        scopes: &[String],
    ) -> Self {
        let mut grant = Self {
            access_token: String::new(),
            refresh_token: None,
            token_uri: secret.token_uri.clone(),
            client_id: secret.client_id.clone(),
            client_secret: secret.client_secret.clone(),
            scopes: scopes.to_vec(),
            expiry: None,
        };
        grant.apply(response);
        grant
    }

    /// Replace the access token and expiry with a fresh token response.
    ///
    /// The refresh token is only replaced when the provider rotates it.
    pub fn apply(&mut self, response: &BasicTokenResponse) {
        self.access_token = response.access_token().secret().clone();
        self.expiry = response
            .expires_in()
            .map(|lifetime| Utc::now() + Duration::seconds(lifetime.as_secs() as i64));
        if let Some(refresh_token) = response.refresh_token() {
            self.refresh_token = Some(refresh_token.secret().clone());
        }
    }

    pub fn is_expired(&self) -> bool {
        match self.expiry {
            Some(expiry) => Utc::now() >= expiry - Duration::seconds(EXPIRY_SKEW_SECS),
            None => false,
        }
    }

    /// Non-empty and not expired.
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.is_expired()
    }
}

/// OAuth client application credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

/// The downloaded client secret file wraps the credentials in an
/// `installed` or `web` section.
#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            WorkspaceError::InvalidClientSecret(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: ClientSecretFile = serde_json::from_str(content)
            .map_err(|e| WorkspaceError::InvalidClientSecret(e.to_string()))?;
        file.installed.or(file.web).ok_or_else(|| {
            WorkspaceError::InvalidClientSecret(
                "expected an \"installed\" or \"web\" section".to_string(),
            )
        })
    }
}

/// Response of `spreadsheets.values.get`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub major_dimension: Option<String>,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl ValueRange {
    pub fn rows(&self) -> Vec<Row> {
        self.values.iter().map(|cells| Row::from_cells(cells)).collect()
    }
}

/// One row of cell values, rendered as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row(pub Vec<String>);

impl Row {
    fn from_cells(cells: &[Value]) -> Self {
        Row(cells
            .iter()
            .map(|cell| match cell {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect())
    }
}

impl std::fmt::Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// A Docs document. Only the title is read; everything else is kept as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub document_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub content: Map<String, Value>,
}

/// A single `documents.batchUpdate` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    InsertText(InsertText),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertText {
    pub text: String,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub index: u32,
}

#[derive(Debug, Serialize)]
pub struct BatchUpdateRequest {
    pub requests: Vec<Request>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateResponse {
    #[serde(default)]
    pub document_id: String,
    #[serde(default)]
    pub replies: Vec<Value>,
}

/// Google API error response.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub code: u16,
    pub message: String,
}
