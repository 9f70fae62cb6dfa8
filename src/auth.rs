//! Credential store: cached grant first, refresh second, interactive consent last.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use oauth2::RefreshToken;
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::CredentialConfig;
use crate::error::{Result, WorkspaceError};
use crate::flow::{
    oauth_client, token_error_message, token_http_client, AuthorizationFlow, InstalledAppFlow,
};
use crate::models::DEFAULT_AUTH_URI;
use crate::models::{AuthorizationGrant, ClientSecret};

/// Owns the user's authorization grant and the token file backing it.
///
/// Cloning is cheap and clones share the same grant. Calls within one
/// process are serialized; separate processes sharing a token path are not
/// coordinated.
#[derive(Clone)]
pub struct CredentialStore {
    config: Arc<CredentialConfig>,
    flow: Arc<dyn AuthorizationFlow>,
    http: Client,
    grant: Arc<Mutex<Option<AuthorizationGrant>>>,
}

impl CredentialStore {
    /// Create a store that falls back to the browser consent flow.
    pub fn new(config: CredentialConfig) -> Self {
        Self::with_flow(config, InstalledAppFlow::new())
    }

    /// Create a store with a custom interactive flow.
    pub fn with_flow<F: AuthorizationFlow + 'static>(config: CredentialConfig, flow: F) -> Self {
        Self {
            config: Arc::new(config),
            flow: Arc::new(flow),
            http: token_http_client(),
            grant: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &CredentialConfig {
        &self.config
    }

    /// Snapshot of the current grant, if one has been acquired.
    pub async fn grant(&self) -> Option<AuthorizationGrant> {
        self.grant.lock().await.clone()
    }

    /// Make sure a valid grant is held and return its access token.
    ///
    /// Any grant that had to be refreshed or newly obtained is written back to
    /// the token file before returning.
    pub async fn ensure_credentials(&self) -> Result<String> {
        let mut held = self.grant.lock().await;
        let token_path = self.config.token_path();

        if token_path.exists() {
            *held = Some(load_grant(token_path, self.config.scopes())?);
        }

        if let Some(grant) = held.as_ref().filter(|g| g.is_valid()) {
            debug!("Using cached authorization grant");
            return Ok(grant.access_token.clone());
        }

        let grant = match held.clone() {
            Some(mut grant) if grant.is_expired() && grant.refresh_token.is_some() => {
                self.refresh(&mut grant).await?;
                grant
            }
            _ => {
                let secret = ClientSecret::from_file(self.config.secret_path())?;
                info!("No usable grant, starting interactive authorization");
                self.flow.authorize(&secret, self.config.scopes()).await?
            }
        };

        save_grant(token_path, &grant)?;
        let access_token = grant.access_token.clone();
        *held = Some(grant);

        Ok(access_token)
    }

    /// Exchange the refresh token for a new access token.
    async fn refresh(&self, grant: &mut AuthorizationGrant) -> Result<()> {
        let refresh_token = grant
            .refresh_token
            .clone()
            .ok_or_else(|| WorkspaceError::TokenRefreshError("no refresh token".to_string()))?;

        // The token file does not record the consent endpoint; it is unused here.
        let client = oauth_client(
            &grant.client_id,
            &grant.client_secret,
            DEFAULT_AUTH_URI,
            &grant.token_uri,
        )?;
        let response = client
            .exchange_refresh_token(&RefreshToken::new(refresh_token))
            .request_async(&self.http)
            .await
            .map_err(|e| WorkspaceError::TokenRefreshError(token_error_message(e)))?;

        grant.apply(&response);
        info!("Refreshed access token");
        Ok(())
    }
}

/// Read a grant from disk, scoped to the configured scopes.
fn load_grant(path: &Path, scopes: &[String]) -> Result<AuthorizationGrant> {
    let content = fs::read_to_string(path)?;
    let mut grant: AuthorizationGrant = serde_json::from_str(&content).map_err(|e| {
        WorkspaceError::AuthenticationError(format!(
            "invalid token file {}: {}",
            path.display(),
            e
        ))
    })?;
    grant.scopes = scopes.to_vec();
    Ok(grant)
}

/// Write the grant next to the token path, then rename it into place.
fn save_grant(path: &Path, grant: &AuthorizationGrant) -> Result<()> {
    let tmp = temp_path(path);
    fs::write(&tmp, serde_json::to_string(grant)?)?;
    fs::rename(&tmp, path)?;
    debug!(path = %path.display(), "Saved authorization grant");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
