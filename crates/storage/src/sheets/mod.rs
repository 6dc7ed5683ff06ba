//! Rating ledger stored in a Google Sheets worksheet (Sheets API v4).

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::repository::{LedgerRow, RatingLedger, StorageError};

mod auth;

pub use auth::{DEFAULT_TOKEN_URI, SHEETS_SCOPE, ServiceAccountKey, TokenSource};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/";

/// Which document and worksheet hold the ledger.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub worksheet: String,
}

impl SheetsConfig {
    /// The first worksheet of a new spreadsheet is called `Sheet1`.
    pub const DEFAULT_WORKSHEET: &'static str = "Sheet1";

    #[must_use]
    pub fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            worksheet: Self::DEFAULT_WORKSHEET.to_string(),
        }
    }

    #[must_use]
    pub fn with_worksheet(mut self, worksheet: impl Into<String>) -> Self {
        self.worksheet = worksheet.into();
        self
    }
}

pub struct SheetsLedger {
    config: SheetsConfig,
    client: Client,
    tokens: TokenSource,
    base: Url,
}

impl SheetsLedger {
    /// # Errors
    ///
    /// Returns `StorageError::Auth` if the service-account key cannot sign.
    pub fn new(config: SheetsConfig, key: ServiceAccountKey) -> Result<Self, StorageError> {
        let client = Client::new();
        let tokens = TokenSource::new(key, client.clone())?;
        let base = Url::parse(SHEETS_API_BASE).map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(Self {
            config,
            client,
            tokens,
            base,
        })
    }

    #[must_use]
    pub fn config(&self) -> &SheetsConfig {
        &self.config
    }

    fn values_url(&self, suffix: &str) -> Result<Url, StorageError> {
        values_url(&self.base, &self.config, suffix)
    }

    async fn append(&self, rows: &[LedgerRow]) -> Result<(), StorageError> {
        let url = append_url(&self.base, &self.config)?;
        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&AppendBody { values: rows })
            .send()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        check_status(response).await?;
        debug!(rows = rows.len(), "appended ledger rows");
        Ok(())
    }
}

#[async_trait]
impl RatingLedger for SheetsLedger {
    async fn get_all_rows(&self) -> Result<Vec<LedgerRow>, StorageError> {
        let url = self.values_url("")?;
        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let response = check_status(response).await?;
        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(range.into_rows())
    }

    async fn append_row(&self, row: &[String]) -> Result<(), StorageError> {
        self.append(&[row.to_vec()]).await
    }

    async fn append_rows(&self, rows: &[LedgerRow]) -> Result<(), StorageError> {
        if rows.is_empty() {
            return Ok(());
        }
        self.append(rows).await
    }
}

fn values_url(base: &Url, config: &SheetsConfig, suffix: &str) -> Result<Url, StorageError> {
    let mut url = base.clone();
    let range = format!("{}{suffix}", config.worksheet);
    url.path_segments_mut()
        .map_err(|()| StorageError::Connection("sheets base url cannot hold a path".into()))?
        .pop_if_empty()
        .extend([
            "spreadsheets",
            config.spreadsheet_id.as_str(),
            "values",
            range.as_str(),
        ]);
    Ok(url)
}

/// Cells are stored verbatim (`RAW`) so names such as `0123` or `=x` read
/// back exactly as written.
fn append_url(base: &Url, config: &SheetsConfig) -> Result<Url, StorageError> {
    let mut url = values_url(base, config, ":append")?;
    url.query_pairs_mut()
        .append_pair("valueInputOption", "RAW")
        .append_pair("insertDataOption", "INSERT_ROWS");
    Ok(url)
}

async fn check_status(response: Response) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    let err = StorageError::from_status(status.as_u16(), message);
    if !err.is_rate_limited() {
        warn!(status = status.as_u16(), "sheets request failed");
    }
    Err(err)
}

#[derive(Serialize)]
struct AppendBody<'a> {
    values: &'a [LedgerRow],
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl ValueRange {
    fn into_rows(self) -> Vec<LedgerRow> {
        self.values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect()
    }
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
