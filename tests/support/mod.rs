//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tempfile::TempDir;
use workspace_sync::models::ClientSecret;
use workspace_sync::{AuthorizationFlow, AuthorizationGrant, CredentialConfig, CredentialStore, Result};

pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets.readonly",
    "https://www.googleapis.com/auth/documents",
];

/// Interactive flow stand-in that hands out a fixed grant and counts calls.
#[derive(Clone)]
pub struct CountingFlow {
    calls: Arc<AtomicUsize>,
    grant: AuthorizationGrant,
}

impl CountingFlow {
    pub fn new(grant: AuthorizationGrant) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            grant,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthorizationFlow for CountingFlow {
    async fn authorize(&self, _secret: &ClientSecret, scopes: &[String]) -> Result<AuthorizationGrant> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut grant = self.grant.clone();
        grant.scopes = scopes.to_vec();
        Ok(grant)
    }
}

pub fn scopes() -> Vec<String> {
    SCOPES.iter().map(|s| s.to_string()).collect()
}

pub fn grant(access_token: &str, expiry: DateTime<Utc>, token_uri: &str) -> AuthorizationGrant {
    AuthorizationGrant {
        access_token: access_token.to_string(),
        refresh_token: Some("1//refresh".to_string()),
        token_uri: token_uri.to_string(),
        client_id: "client-id.apps.googleusercontent.com".to_string(),
        client_secret: "client-secret".to_string(),
        scopes: scopes(),
        expiry: Some(expiry),
    }
}

pub fn valid_grant(access_token: &str) -> AuthorizationGrant {
    grant(
        access_token,
        Utc::now() + Duration::hours(1),
        "https://oauth2.googleapis.com/token",
    )
}

pub fn write_grant(path: &Path, grant: &AuthorizationGrant) {
    std::fs::write(path, serde_json::to_string(grant).unwrap()).unwrap();
}

pub fn read_grant(path: &Path) -> AuthorizationGrant {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

pub fn write_secret(dir: &Path) -> PathBuf {
    let path = dir.join("credentials.json");
    let secret = json!({
        "installed": {
            "client_id": "client-id.apps.googleusercontent.com",
            "client_secret": "client-secret",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": "https://oauth2.googleapis.com/token"
        }
    });
    std::fs::write(&path, secret.to_string()).unwrap();
    path
}

pub fn credential_config(dir: &Path) -> CredentialConfig {
    CredentialConfig::new(dir.join("token.json"), scopes(), write_secret(dir))
}

/// A store whose token file already holds a valid grant for `access_token`.
pub fn authorized_store(access_token: &str) -> (TempDir, CredentialStore, CountingFlow) {
    let dir = tempfile::tempdir().unwrap();
    let config = credential_config(dir.path());
    write_grant(config.token_path(), &valid_grant(access_token));

    let flow = CountingFlow::new(valid_grant("unused"));
    let store = CredentialStore::with_flow(config, flow.clone());
    (dir, store, flow)
}
