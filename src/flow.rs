//! Installed-application OAuth consent flow with a loopback redirect.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use oauth2::basic::{BasicClient, BasicErrorResponse};
use oauth2::url::Url;
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, CsrfToken, EndpointNotSet, EndpointSet,
    RedirectUrl, RequestTokenError, Scope, TokenUrl,
};
use reqwest::Client;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::{Result, WorkspaceError};
use crate::models::{AuthorizationGrant, ClientSecret};

const SUCCESS_MESSAGE: &str =
    "The authentication flow has completed. You may close this window.";

/// OAuth client with authorization and token endpoints configured.
pub(crate) type GoogleClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Build an OAuth client that sends its credentials in the request body, the
/// way Google's installed-app libraries do.
pub(crate) fn oauth_client(
    client_id: &str,
    client_secret: &str,
    auth_uri: &str,
    token_uri: &str,
) -> Result<GoogleClient> {
    let auth_url = AuthUrl::new(auth_uri.to_string())
        .map_err(|e| WorkspaceError::InvalidUrlOrId(format!("{}: {}", auth_uri, e)))?;
    let token_url = TokenUrl::new(token_uri.to_string())
        .map_err(|e| WorkspaceError::InvalidUrlOrId(format!("{}: {}", token_uri, e)))?;

    Ok(BasicClient::new(ClientId::new(client_id.to_string()))
        .set_client_secret(oauth2::ClientSecret::new(client_secret.to_string()))
        .set_auth_uri(auth_url)
        .set_token_uri(token_url)
        .set_auth_type(AuthType::RequestBody))
}

/// HTTP client for token requests. Redirects are not followed.
pub(crate) fn token_http_client() -> Client {
    Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Describe a failed token request, preferring the provider's error code.
pub(crate) fn token_error_message<RE>(err: RequestTokenError<RE, BasicErrorResponse>) -> String
where
    RE: std::error::Error + 'static,
{
    match err {
        RequestTokenError::ServerResponse(response) => {
            let kind: &str = response.error().as_ref();
            match response.error_description() {
                Some(description) => format!("{}: {}", kind, description),
                None => kind.to_string(),
            }
        }
        other => other.to_string(),
    }
}

/// Obtains a brand-new grant from the user.
#[async_trait]
pub trait AuthorizationFlow: Send + Sync {
    async fn authorize(
        &self,
        secret: &ClientSecret,
        scopes: &[String],
    ) -> Result<AuthorizationGrant>;
}

type UrlOpener = Box<dyn Fn(&Url) + Send + Sync>;

/// Browser-based consent: listens on an ephemeral loopback port for the
/// provider's redirect, then exchanges the code for tokens.
pub struct InstalledAppFlow {
    http: Client,
    opener: Option<UrlOpener>,
}

impl InstalledAppFlow {
    pub fn new() -> Self {
        Self {
            http: token_http_client(),
            opener: Some(Box::new(open_in_browser)),
        }
    }

    /// Only print the consent URL.
    pub fn without_browser(mut self) -> Self {
        self.opener = None;
        self
    }

    /// Hand the consent URL to `opener` instead of the system browser.
    pub fn with_url_opener<F>(mut self, opener: F) -> Self
    where
        F: Fn(&Url) + Send + Sync + 'static,
    {
        self.opener = Some(Box::new(opener));
        self
    }

    async fn exchange_code(
        &self,
        client: &GoogleClient,
        secret: &ClientSecret,
        scopes: &[String],
        code: String,
    ) -> Result<AuthorizationGrant> {
        let response = client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(&self.http)
            .await
            .map_err(|e| WorkspaceError::AuthenticationError(token_error_message(e)))?;

        Ok(AuthorizationGrant::from_token_response(&response, secret, scopes))
    }
}

impl Default for InstalledAppFlow {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthorizationFlow for InstalledAppFlow {
    async fn authorize(
        &self,
        secret: &ClientSecret,
        scopes: &[String],
    ) -> Result<AuthorizationGrant> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.map_err(|e| {
            WorkspaceError::AuthenticationError(format!("cannot start callback listener: {}", e))
        })?;
        let port = listener.local_addr()?.port();
        let redirect_uri = format!("http://127.0.0.1:{}/", port);

        let client = oauth_client(
            &secret.client_id,
            &secret.client_secret,
            &secret.auth_uri,
            &secret.token_uri,
        )?
        .set_redirect_uri(
            RedirectUrl::new(redirect_uri.clone())
                .map_err(|e| WorkspaceError::InvalidUrlOrId(format!("{}: {}", redirect_uri, e)))?,
        );

        let (auth_url, csrf_token) = authorization_url(&client, scopes);
        println!(
            "Please visit this URL to authorize this application: {}",
            auth_url
        );
        if let Some(opener) = &self.opener {
            opener(&auth_url);
        }

        info!(port, "Waiting for authorization redirect");
        let callback = wait_for_callback(listener).await?;
        let code = callback.into_code(&csrf_token)?;

        self.exchange_code(&client, secret, scopes, code).await
    }
}

fn open_in_browser(url: &Url) {
    if let Err(e) = webbrowser::open(url.as_str()) {
        warn!("Failed to open browser automatically: {}", e);
    }
}

/// Consent page URL for `scopes`, with a fresh CSRF `state` value.
pub(crate) fn authorization_url(client: &GoogleClient, scopes: &[String]) -> (Url, CsrfToken) {
    client
        .authorize_url(CsrfToken::new_random)
        .add_scopes(scopes.iter().cloned().map(Scope::new))
        .add_extra_param("access_type", "offline")
        .url()
}

/// Query parameters of the provider redirect.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Callback {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

impl Callback {
    fn into_code(self, expected_state: &CsrfToken) -> Result<String> {
        if let Some(error) = self.error {
            return Err(WorkspaceError::ConsentDenied(error));
        }
        if self.state.as_deref() != Some(expected_state.secret().as_str()) {
            return Err(WorkspaceError::InvalidCallback(
                "state parameter does not match".to_string(),
            ));
        }
        self.code
            .ok_or_else(|| WorkspaceError::InvalidCallback("missing code".to_string()))
    }
}

struct CallbackState {
    sender: Mutex<Option<oneshot::Sender<Callback>>>,
}

async fn redirect_handler(
    State(state): State<Arc<CallbackState>>,
    Query(callback): Query<Callback>,
) -> Response {
    if callback.code.is_none() && callback.error.is_none() {
        debug!("Ignoring request without code or error");
        return (StatusCode::BAD_REQUEST, Html("Missing authorization code")).into_response();
    }

    if let Some(sender) = state.sender.lock().ok().and_then(|mut slot| slot.take()) {
        let _ = sender.send(callback);
    }
    Html(SUCCESS_MESSAGE).into_response()
}

/// Serve the redirect endpoint until the provider calls it. Blocks
/// indefinitely; only a failure of the listener itself ends the wait early.
pub(crate) async fn wait_for_callback(listener: TcpListener) -> Result<Callback> {
    let (sender, receiver) = oneshot::channel();
    let state = Arc::new(CallbackState {
        sender: Mutex::new(Some(sender)),
    });
    let app = Router::new()
        .route("/", get(redirect_handler))
        .with_state(state);

    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = stopped.await;
            })
            .await
    });

    match receiver.await {
        Ok(callback) => {
            let _ = stop.send(());
            if let Err(e) = server.await {
                debug!(error = %e, "Callback server task ended abnormally");
            }
            Ok(callback)
        }
        Err(_) => {
            let reason = match server.await {
                Ok(Err(e)) => e.to_string(),
                Err(e) => e.to_string(),
                Ok(Ok(())) => "server stopped".to_string(),
            };
            Err(WorkspaceError::AuthenticationError(format!(
                "callback listener failed: {}",
                reason
            )))
        }
    }
}
