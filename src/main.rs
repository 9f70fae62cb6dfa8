//! workspace_sync CLI - Read Google Sheets ranges and edit Google Docs.

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use workspace_sync::config::parse_scopes;
use workspace_sync::{extract_id, Config, CredentialConfig, CredentialStore, DocsClient, SheetsClient};

/// CLI tool for reading Google Sheets and editing Google Docs.
#[derive(Parser)]
#[command(name = "workspace_sync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Comma-separated OAuth scopes to request.
    #[arg(long, env = "SCOPES")]
    scopes: String,

    /// Spreadsheet URL or ID.
    #[arg(long, env = "SHEET_ID")]
    sheet_id: Option<String>,

    /// Document URL or ID.
    #[arg(long, env = "DOCUMENT_ID")]
    document_id: Option<String>,

    /// Path to the OAuth client secret JSON file.
    #[arg(long, env = "SECRET")]
    secret: PathBuf,

    /// Path of the cached token file.
    #[arg(long, env = "TOKEN_JSON")]
    token: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the rows of a range (read from stdin when omitted).
    Read {
        /// Range such as Sheet1!A1:C10.
        range: Option<String>,
    },

    /// Print the document title and insert its content back at index 1.
    Title,

    /// Insert text at index 1 of the document.
    Insert {
        /// Text to insert.
        text: String,
    },
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let scopes = parse_scopes(&self.scopes);
        if scopes.is_empty() {
            anyhow::bail!("SCOPES variable is not set");
        }

        let spreadsheet_id = self
            .sheet_id
            .as_deref()
            .map(extract_id)
            .transpose()
            .context("Invalid SHEET_ID")?;
        let document_id = self
            .document_id
            .as_deref()
            .map(extract_id)
            .transpose()
            .context("Invalid DOCUMENT_ID")?;

        Ok(Config {
            credentials: CredentialConfig::new(&self.token, scopes, &self.secret),
            spreadsheet_id,
            document_id,
        })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config()?;
    let store = CredentialStore::new(config.credentials.clone());
    let mut out = std::io::stdout();

    match cli.command.unwrap_or(Commands::Read { range: None }) {
        Commands::Read { range } => {
            let range = match range {
                Some(range) => range,
                None => read_line().context("Failed to read range from stdin")?,
            };

            let client = SheetsClient::new(store, config.spreadsheet_id()?.to_string());
            client
                .read_range(&range, &mut out)
                .await
                .with_context(|| format!("Failed to read range: {}", range))?;
        }

        Commands::Title => {
            let document_id = config.document_id()?.to_string();
            let client = DocsClient::new(store, document_id.clone());
            client
                .fetch(&document_id, &mut out)
                .await
                .with_context(|| format!("Failed to fetch document: {}", document_id))?;
        }

        Commands::Insert { text } => {
            let client = DocsClient::new(store, config.document_id()?.to_string());
            client
                .insert(&text)
                .await
                .context("Failed to insert text")?;
        }
    }

    Ok(())
}

/// Read one line from stdin without its line ending.
fn read_line() -> std::io::Result<String> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
