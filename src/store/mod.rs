//! Record store layer.
//!
//! Durable tabular storage with header-driven column access, abstracting over
//! the concrete spreadsheet backend. The header row is authoritative: all
//! field access goes through a name lookup built once per read, never a fixed
//! position, so column reordering cannot corrupt writes.

mod memory;
mod sheets;

pub use memory::MemoryStore;
pub use sheets::{SheetsConfig, SheetsStore};

use std::collections::HashMap;

use async_trait::async_trait;

use crate::models::Record;

/// Header schema written when the collector finds an empty worksheet.
pub const DEFAULT_HEADERS: &[&str] = &[
    "title",
    "company",
    "location",
    "experience",
    "url",
    "scraped_at",
    "status",
    "publish",
    "identity_match",
];

/// Errors from the record store boundary. Fatal to the current run; partial
/// progress already committed stays committed (no transaction wrapping).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store transport error: {0}")]
    Transport(String),
    #[error("store API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("no header row captured; read the store before writing cells")]
    NoHeaders,
    #[error("worksheet has no {0:?} column")]
    UnknownColumn(String),
    #[error("row number {0} is out of range")]
    RowOutOfRange(usize),
}

/// Name to column-index map built once per store read.
///
/// Header names are trimmed on construction; duplicate names keep the first
/// occurrence, matching how the sheets were read by name historically.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl HeaderMap {
    pub fn new(names: &[String]) -> Self {
        let names: Vec<String> = names.iter().map(|n| n.trim().to_string()).collect();
        let mut index = HashMap::new();
        for (i, name) in names.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        Self { names, index }
    }

    pub fn from_strs(names: &[&str]) -> Self {
        Self::new(&names.iter().map(|n| n.to_string()).collect::<Vec<_>>())
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name.trim()).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Read-only view of one data row through the header map.
///
/// Rows shorter than the header (the sheets API trims trailing blanks) read
/// missing cells as empty strings.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    headers: &'a HeaderMap,
    cells: &'a [String],
}

impl<'a> RowView<'a> {
    pub fn new(headers: &'a HeaderMap, cells: &'a [String]) -> Self {
        Self { headers, cells }
    }

    /// Cell value by column name; `None` only when the column itself is
    /// missing from the header row.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.headers.index_of(column)?;
        Some(self.cells.get(idx).map(String::as_str).unwrap_or(""))
    }
}

/// Full contents of the store at read time.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub headers: HeaderMap,
    pub rows: Vec<Vec<String>>,
}

impl Snapshot {
    /// True when the worksheet holds nothing at all, not even a header row.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    pub fn view(&self, data_index: usize) -> RowView<'_> {
        RowView::new(&self.headers, &self.rows[data_index])
    }

    /// 1-based worksheet row number for a data row index, including the
    /// header row offset (first data row is row 2).
    pub fn row_number(&self, data_index: usize) -> usize {
        data_index + 2
    }
}

/// Map a record into the store's column order. Columns the record does not
/// carry are left blank; record fields with no matching column are dropped.
pub fn record_to_row(record: &Record, headers: &HeaderMap) -> Vec<String> {
    let mut row = vec![String::new(); headers.len()];
    for (i, name) in headers.names().iter().enumerate() {
        if let Some(value) = record.field(name) {
            row[i] = value;
        }
    }
    row
}

/// Tabular backend contract: read-all, append, update-single-cell.
///
/// One store instance addresses one worksheet holding one header schema for
/// its lifetime. No operation retries; failures abort the calling run.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read the whole worksheet. Returns an empty snapshot if the store is
    /// empty. Captures the header map used by later `update_cell` calls.
    async fn read_all(&self) -> Result<Snapshot, StoreError>;

    /// Append raw header-aligned rows after the last data row.
    async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<(), StoreError>;

    /// Write a single cell addressed by 1-based worksheet row number
    /// (header row included, so the first data row is 2) and column name.
    /// Last writer wins; there is no optimistic concurrency check.
    async fn update_cell(
        &self,
        row_number: usize,
        column: &str,
        value: &str,
    ) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: RecordStore + ?Sized> RecordStore for std::sync::Arc<S> {
    async fn read_all(&self) -> Result<Snapshot, StoreError> {
        (**self).read_all().await
    }

    async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<(), StoreError> {
        (**self).append_rows(rows).await
    }

    async fn update_cell(
        &self,
        row_number: usize,
        column: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        (**self).update_cell(row_number, column, value).await
    }
}
