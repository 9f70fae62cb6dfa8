//! Tests for the CredentialStore acquisition order: cache, refresh, consent.

mod support;

use chrono::{Duration, Utc};
use mockito::Matcher;
use support::*;
use workspace_sync::{CredentialStore, WorkspaceError};

mod cached {
    use super::*;

    #[tokio::test]
    async fn valid_grant_skips_flow_and_refresh() {
        let mut server = mockito::Server::new_async().await;
        let refresh = server.mock("POST", "/token").expect(0).create_async().await;

        let dir = tempfile::tempdir().unwrap();
        let config = credential_config(dir.path());
        let saved = grant(
            "ya29.cached",
            Utc::now() + Duration::hours(1),
            &format!("{}/token", server.url()),
        );
        write_grant(config.token_path(), &saved);
        let before = std::fs::read_to_string(config.token_path()).unwrap();

        let flow = CountingFlow::new(valid_grant("unused"));
        let store = CredentialStore::with_flow(config.clone(), flow.clone());

        assert_eq!(store.ensure_credentials().await.unwrap(), "ya29.cached");
        assert_eq!(flow.calls(), 0);
        refresh.assert_async().await;
        assert_eq!(std::fs::read_to_string(config.token_path()).unwrap(), before);
    }

    #[tokio::test]
    async fn loaded_grant_takes_configured_scopes() {
        let (_dir, store, _flow) = authorized_store("ya29.cached");
        store.ensure_credentials().await.unwrap();

        let grant = store.grant().await.unwrap();
        assert_eq!(grant.scopes, scopes());
    }
}

mod interactive {
    use super::*;

    #[tokio::test]
    async fn missing_token_file_runs_flow_once_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let config = credential_config(dir.path());
        assert!(!config.token_path().exists());

        let flow = CountingFlow::new(valid_grant("ya29.fresh"));
        let store = CredentialStore::with_flow(config.clone(), flow.clone());

        assert_eq!(store.ensure_credentials().await.unwrap(), "ya29.fresh");
        assert_eq!(flow.calls(), 1);

        let saved = read_grant(config.token_path());
        assert_eq!(saved.access_token, "ya29.fresh");
        assert_eq!(saved.scopes, scopes());
    }

    #[tokio::test]
    async fn second_call_uses_persisted_grant() {
        let dir = tempfile::tempdir().unwrap();
        let config = credential_config(dir.path());
        let flow = CountingFlow::new(valid_grant("ya29.fresh"));
        let store = CredentialStore::with_flow(config, flow.clone());

        store.ensure_credentials().await.unwrap();
        store.ensure_credentials().await.unwrap();
        assert_eq!(flow.calls(), 1);
    }

    #[tokio::test]
    async fn expired_grant_without_refresh_token_runs_flow() {
        let dir = tempfile::tempdir().unwrap();
        let config = credential_config(dir.path());
        let mut expired = grant(
            "ya29.old",
            Utc::now() - Duration::hours(1),
            "https://oauth2.googleapis.com/token",
        );
        expired.refresh_token = None;
        write_grant(config.token_path(), &expired);

        let flow = CountingFlow::new(valid_grant("ya29.fresh"));
        let store = CredentialStore::with_flow(config.clone(), flow.clone());

        assert_eq!(store.ensure_credentials().await.unwrap(), "ya29.fresh");
        assert_eq!(flow.calls(), 1);
        assert_eq!(read_grant(config.token_path()).access_token, "ya29.fresh");
    }

    #[tokio::test]
    async fn malformed_secret_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = credential_config(dir.path());
        std::fs::write(config.secret_path(), "{\"neither\": {}}").unwrap();

        let flow = CountingFlow::new(valid_grant("ya29.fresh"));
        let store = CredentialStore::with_flow(config.clone(), flow.clone());

        let err = store.ensure_credentials().await.unwrap_err();
        assert!(matches!(err, WorkspaceError::InvalidClientSecret(_)));
        assert_eq!(flow.calls(), 0);
        assert!(!config.token_path().exists());
    }

    #[tokio::test]
    async fn unwritable_token_path_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = workspace_sync::CredentialConfig::new(
            dir.path().join("missing").join("token.json"),
            scopes(),
            write_secret(dir.path()),
        );

        let flow = CountingFlow::new(valid_grant("ya29.fresh"));
        let store = CredentialStore::with_flow(config, flow);

        assert!(matches!(
            store.ensure_credentials().await,
            Err(WorkspaceError::IoError(_))
        ));
    }
}

mod refresh {
    use super::*;

    #[tokio::test]
    async fn expired_grant_refreshes_once_and_rewrites_file() {
        let mut server = mockito::Server::new_async().await;
        let refresh = server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("refresh_token".into(), "1//refresh".into()),
                Matcher::UrlEncoded(
                    "client_id".into(),
                    "client-id.apps.googleusercontent.com".into(),
                ),
            ]))
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "ya29.refreshed", "expires_in": 3599, "token_type": "Bearer"}"#)
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = credential_config(dir.path());
        write_grant(
            config.token_path(),
            &grant(
                "ya29.old",
                Utc::now() - Duration::minutes(10),
                &format!("{}/token", server.url()),
            ),
        );

        let flow = CountingFlow::new(valid_grant("unused"));
        let store = CredentialStore::with_flow(config.clone(), flow.clone());

        assert_eq!(store.ensure_credentials().await.unwrap(), "ya29.refreshed");
        refresh.assert_async().await;
        assert_eq!(flow.calls(), 0);

        let saved = read_grant(config.token_path());
        assert_eq!(saved.access_token, "ya29.refreshed");
        assert_eq!(saved.refresh_token.as_deref(), Some("1//refresh"));
        assert!(saved.is_valid());
    }

    #[tokio::test]
    async fn failed_refresh_propagates_and_keeps_file() {
        let mut server = mockito::Server::new_async().await;
        let refresh = server
            .mock("POST", "/token")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "invalid_grant", "error_description": "Token has been expired or revoked."}"#)
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = credential_config(dir.path());
        write_grant(
            config.token_path(),
            &grant(
                "ya29.old",
                Utc::now() - Duration::minutes(10),
                &format!("{}/token", server.url()),
            ),
        );
        let before = std::fs::read_to_string(config.token_path()).unwrap();

        let flow = CountingFlow::new(valid_grant("unused"));
        let store = CredentialStore::with_flow(config.clone(), flow.clone());

        let err = store.ensure_credentials().await.unwrap_err();
        assert!(matches!(err, WorkspaceError::TokenRefreshError(ref m) if m.contains("invalid_grant")));
        refresh.assert_async().await;
        assert_eq!(flow.calls(), 0);
        assert_eq!(std::fs::read_to_string(config.token_path()).unwrap(), before);
    }
}

mod malformed {
    use super::*;

    #[tokio::test]
    async fn unreadable_token_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = credential_config(dir.path());
        std::fs::write(config.token_path(), "not json").unwrap();

        let flow = CountingFlow::new(valid_grant("ya29.fresh"));
        let store = CredentialStore::with_flow(config.clone(), flow.clone());

        assert!(matches!(
            store.ensure_credentials().await,
            Err(WorkspaceError::AuthenticationError(_))
        ));
        assert_eq!(flow.calls(), 0);
        assert_eq!(
            std::fs::read_to_string(config.token_path()).unwrap(),
            "not json"
        );
    }
}
