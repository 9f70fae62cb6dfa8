//! Google Docs API client.

use std::io::Write;

use reqwest::Client;
use tracing::{debug, error};

use crate::auth::CredentialStore;
use crate::client::{endpoint, parse_json};
use crate::error::Result;
use crate::models::{
    BatchUpdateRequest, BatchUpdateResponse, Document, InsertText, Location, Request,
};

/// Base URL for Google Docs API v1.
const DOCS_API_BASE: &str = "https://docs.googleapis.com/v1";

/// Text is always inserted right after the start of the document body.
pub const INSERT_INDEX: u32 = 1;

/// Build the request that inserts `text` at [`INSERT_INDEX`].
pub fn insert_text_request(text: &str) -> Request {
    Request::InsertText(InsertText {
        text: text.to_string(),
        location: Location {
            index: INSERT_INDEX,
        },
    })
}

/// Reads and edits one configured document.
pub struct DocsClient {
    document_id: String,
    store: CredentialStore,
    http: Client,
    base_url: String,
}

impl DocsClient {
    /// Create a new DocsClient.
    ///
    /// # Arguments
    /// * `store` - Credential store used before every request
    /// * `document_id` - The document that `insert` writes to
    pub fn new(store: CredentialStore, document_id: String) -> Self {
        Self {
            document_id,
            store,
            http: Client::new(),
            base_url: DOCS_API_BASE.to_string(),
        }
    }

    /// Point the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Get a document, returning every failure to the caller.
    pub async fn get_document(&self, document_id: &str) -> Result<Document> {
        let token = self.store.ensure_credentials().await?;
        self.request_document(&token, document_id).await
    }

    /// Apply a batch of edits, returning every failure to the caller.
    pub async fn batch_update(
        &self,
        document_id: &str,
        requests: Vec<Request>,
    ) -> Result<BatchUpdateResponse> {
        let token = self.store.ensure_credentials().await?;
        self.request_batch_update(&token, document_id, requests)
            .await
    }

    /// Fetch a document and print its title, then insert the document's full
    /// JSON text into the configured document.
    ///
    /// Authorization failures are returned. Remote failures are logged and
    /// yield `None`.
    pub async fn fetch<W: Write>(&self, document_id: &str, out: &mut W) -> Result<Option<Document>> {
        let token = self.store.ensure_credentials().await?;

        let document = match self.request_document(&token, document_id).await {
            Ok(document) => document,
            Err(e) => {
                error!(document_id, error = %e, "Failed to fetch document");
                return Ok(None);
            }
        };

        writeln!(out, "The title of the document is: {}", document.title)?;

        let text = serde_json::to_string(&document)?;
        self.insert(&text).await?;

        Ok(Some(document))
    }

    /// Insert `text` at index 1 of the configured document, ahead of any
    /// existing content.
    ///
    /// Authorization failures are returned. Remote failures are logged and
    /// yield `None`.
    pub async fn insert(&self, text: &str) -> Result<Option<BatchUpdateResponse>> {
        let token = self.store.ensure_credentials().await?;

        match self
            .request_batch_update(&token, &self.document_id, vec![insert_text_request(text)])
            .await
        {
            Ok(response) => {
                debug!(document_id = %self.document_id, chars = text.chars().count(), "Inserted text");
                Ok(Some(response))
            }
            Err(e) => {
                error!(document_id = %self.document_id, error = %e, "Failed to insert text");
                Ok(None)
            }
        }
    }

    async fn request_document(&self, token: &str, document_id: &str) -> Result<Document> {
        let url = endpoint(&self.base_url, &["documents", document_id])?;
        let response = self.http.get(url).bearer_auth(token).send().await?;
        parse_json(response).await
    }

    async fn request_batch_update(
        &self,
        token: &str,
        document_id: &str,
        requests: Vec<Request>,
    ) -> Result<BatchUpdateResponse> {
        let method = format!("{}:batchUpdate", document_id);
        let url = endpoint(&self.base_url, &["documents", &method])?;

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&BatchUpdateRequest { requests })
            .send()
            .await?;
        parse_json(response).await
    }
}
