//! Runtime configuration, built once at startup and passed by reference.

use std::path::{Path, PathBuf};

use crate::error::{Result, WorkspaceError};

/// Where the credential store keeps its token and which grant it asks for.
#[derive(Debug, Clone)]
pub struct CredentialConfig {
    token_path: PathBuf,
    scopes: Vec<String>,
    secret_path: PathBuf,
}

impl CredentialConfig {
    pub fn new(
        token_path: impl Into<PathBuf>,
        scopes: Vec<String>,
        secret_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            token_path: token_path.into(),
            scopes,
            secret_path: secret_path.into(),
        }
    }

    /// Path of the persisted authorization grant.
    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    /// Permission scopes, in the order they were configured.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Path of the OAuth client secret descriptor.
    pub fn secret_path(&self) -> &Path {
        &self.secret_path
    }
}

/// Full application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: CredentialConfig,
    pub spreadsheet_id: Option<String>,
    pub document_id: Option<String>,
}

impl Config {
    /// The configured spreadsheet, or an error naming the variable to set.
    pub fn spreadsheet_id(&self) -> Result<&str> {
        self.spreadsheet_id
            .as_deref()
            .ok_or_else(|| WorkspaceError::MissingEnvVar("SHEET_ID".to_string()))
    }

    /// The configured document, or an error naming the variable to set.
    pub fn document_id(&self) -> Result<&str> {
        self.document_id
            .as_deref()
            .ok_or_else(|| WorkspaceError::MissingEnvVar("DOCUMENT_ID".to_string()))
    }
}

/// Split a comma-separated scope list, dropping blanks.
pub fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scopes() {
        let scopes = parse_scopes(
            "https://www.googleapis.com/auth/spreadsheets.readonly, https://www.googleapis.com/auth/documents",
        );
        assert_eq!(
            scopes,
            vec![
                "https://www.googleapis.com/auth/spreadsheets.readonly",
                "https://www.googleapis.com/auth/documents"
            ]
        );
        assert!(parse_scopes(" , ").is_empty());
    }

    #[test]
    fn test_missing_ids() {
        let config = Config {
            credentials: CredentialConfig::new("token.json", vec![], "secret.json"),
            spreadsheet_id: Some("sheet".to_string()),
            document_id: None,
        };

        assert_eq!(config.spreadsheet_id().unwrap(), "sheet");
        let err = config.document_id().unwrap_err();
        assert!(err.to_string().contains("DOCUMENT_ID"));
    }
}
