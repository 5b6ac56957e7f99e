//! Google Sheets record store backend.
//!
//! Talks to the Sheets `values` REST API with a bearer token supplied via the
//! environment. One instance addresses one worksheet tab of one spreadsheet.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use async_trait::async_trait;

use super::{HeaderMap, RecordStore, Snapshot, StoreError};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Configuration for the sheets backend.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    /// Spreadsheet document ID (the long token in the sheet URL).
    pub spreadsheet_id: String,
    /// Worksheet tab title, e.g. "wanted" or "사이드".
    pub worksheet: String,
    /// OAuth bearer token with spreadsheets scope.
    pub token: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl SheetsConfig {
    pub fn new(spreadsheet_id: &str, worksheet: &str, token: &str) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.to_string(),
            worksheet: worksheet.to_string(),
            token: token.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Sheets `values` API payload for reads, appends, and single-cell writes.
#[derive(Debug, Serialize, Deserialize)]
struct ValueRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<String>,
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Google Sheets backed record store.
pub struct SheetsStore {
    config: SheetsConfig,
    client: Client,
    /// Header map captured by the most recent `read_all`, used to resolve
    /// column names for `update_cell`.
    headers: RwLock<Option<HeaderMap>>,
}

impl SheetsStore {
    pub fn new(config: SheetsConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(Self {
            config,
            client,
            headers: RwLock::new(None),
        })
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/{}/values/{}",
            SHEETS_API_BASE,
            self.config.spreadsheet_id,
            urlencoding::encode(range)
        )
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(StoreError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl RecordStore for SheetsStore {
    async fn read_all(&self) -> Result<Snapshot, StoreError> {
        let url = self.values_url(&self.config.worksheet);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let resp = Self::check(resp).await?;

        let range: ValueRange = resp
            .json()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        debug!(
            worksheet = %self.config.worksheet,
            rows = range.values.len(),
            "read worksheet"
        );

        let snapshot = match range.values.split_first() {
            None => Snapshot::default(),
            Some((header, rows)) => Snapshot {
                headers: HeaderMap::new(header),
                rows: rows.to_vec(),
            },
        };

        *self.headers.write().await = Some(snapshot.headers.clone());
        Ok(snapshot)
    }

    async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        let url = format!(
            "{}:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
            self.values_url(&self.config.worksheet)
        );
        let body = ValueRange {
            range: None,
            values: rows,
        };
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn update_cell(
        &self,
        row_number: usize,
        column: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        if row_number < 2 {
            return Err(StoreError::RowOutOfRange(row_number));
        }
        let headers = self.headers.read().await;
        let headers = headers.as_ref().ok_or(StoreError::NoHeaders)?;
        let col = headers
            .index_of(column)
            .ok_or_else(|| StoreError::UnknownColumn(column.to_string()))?;

        let cell = format!("{}!{}{}", self.config.worksheet, column_letters(col), row_number);
        let url = format!("{}?valueInputOption=RAW", self.values_url(&cell));
        let body = ValueRange {
            range: Some(cell.clone()),
            values: vec![vec![value.to_string()]],
        };

        debug!(cell = %cell, value, "update cell");

        let resp = self
            .client
            .put(&url)
            .bearer_auth(&self.config.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Self::check(resp).await?;
        Ok(())
    }
}

/// A1-notation column letters for a 0-based column index.
fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).expect("ascii letters")
}
