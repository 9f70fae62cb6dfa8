//! Google Sheets API client.

use std::io::Write;

use reqwest::Client;
use tracing::error;

use crate::auth::CredentialStore;
use crate::client::{endpoint, parse_json};
use crate::error::Result;
use crate::models::{Row, ValueRange};

/// Base URL for Google Sheets API v4.
const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";

/// Reads values from one spreadsheet.
pub struct SheetsClient {
    spreadsheet_id: String,
    store: CredentialStore,
    http: Client,
    base_url: String,
}

impl SheetsClient {
    /// Create a new SheetsClient.
    ///
    /// # Arguments
    /// * `store` - Credential store used before every request
    /// * `spreadsheet_id` - The ID of the spreadsheet to read
    pub fn new(store: CredentialStore, spreadsheet_id: String) -> Self {
        Self {
            spreadsheet_id,
            store,
            http: Client::new(),
            base_url: SHEETS_API_BASE.to_string(),
        }
    }

    /// Point the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// Fetch a range, returning every failure to the caller.
    pub async fn get_values(&self, range: &str) -> Result<ValueRange> {
        let token = self.store.ensure_credentials().await?;
        self.fetch_values(&token, range).await
    }

    /// Read a range and print its rows to `out`.
    ///
    /// Authorization failures are returned. Remote failures are logged and
    /// produce no rows.
    pub async fn read_range<W: Write>(&self, range: &str, out: &mut W) -> Result<Vec<Row>> {
        let token = self.store.ensure_credentials().await?;

        let values = match self.fetch_values(&token, range).await {
            Ok(values) => values,
            Err(e) => {
                error!(range, error = %e, "Failed to read spreadsheet range");
                return Ok(Vec::new());
            }
        };

        let rows = values.rows();
        if rows.is_empty() {
            writeln!(out, "No data found.")?;
            return Ok(rows);
        }

        for row in &rows {
            writeln!(out, "Row: {}", row)?;
        }
        Ok(rows)
    }

    async fn fetch_values(&self, token: &str, range: &str) -> Result<ValueRange> {
        let url = endpoint(
            &self.base_url,
            &["spreadsheets", &self.spreadsheet_id, "values", range],
        )?;
        let response = self.http.get(url).bearer_auth(token).send().await?;
        parse_json(response).await
    }
}
