//! workspace_sync - A CLI tool for reading Google Sheets and editing Google Docs.
//!
//! This library provides functionality to:
//! - Obtain and cache an OAuth grant for a fixed set of scopes
//! - Read a cell range from a spreadsheet
//! - Fetch a document and insert text into it
//!
//! # Example
//!
//! ```no_run
//! use workspace_sync::{CredentialConfig, CredentialStore, SheetsClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = CredentialConfig::new(
//!         "token.json",
//!         vec!["https://www.googleapis.com/auth/spreadsheets.readonly".to_string()],
//!         "credentials.json",
//!     );
//!     let store = CredentialStore::new(config);
//!     let client = SheetsClient::new(store, "spreadsheet-id".to_string());
//!
//!     client.read_range("Sheet1!A1:C10", &mut std::io::stdout()).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
mod client;
pub mod config;
pub mod docs;
pub mod error;
pub mod flow;
pub mod models;
pub mod sheets;
pub mod url_parser;

// Re-exports for convenience
pub use auth::CredentialStore;
pub use config::{Config, CredentialConfig};
pub use docs::DocsClient;
pub use error::{Result, WorkspaceError};
pub use flow::{AuthorizationFlow, InstalledAppFlow};
pub use models::AuthorizationGrant;
pub use sheets::SheetsClient;
pub use url_parser::extract_id;
