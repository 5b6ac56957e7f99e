//! In-memory record store.
//!
//! Backs the workflow tests and local dry runs with the same contract as the
//! sheets backend, including the 1-based row addressing quirk.

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{HeaderMap, RecordStore, Snapshot, StoreError};

/// In-process store holding raw cells, header row included.
#[derive(Debug, Default)]
pub struct MemoryStore {
    cells: Mutex<Vec<Vec<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with a header row and data rows.
    pub fn with_values(values: Vec<Vec<String>>) -> Self {
        Self {
            cells: Mutex::new(values),
        }
    }

    /// Raw dump of every row, header included.
    pub async fn dump(&self) -> Vec<Vec<String>> {
        self.cells.lock().await.clone()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn read_all(&self) -> Result<Snapshot, StoreError> {
        let cells = self.cells.lock().await;
        match cells.split_first() {
            None => Ok(Snapshot::default()),
            Some((header, rows)) => Ok(Snapshot {
                headers: HeaderMap::new(header),
                rows: rows.to_vec(),
            }),
        }
    }

    async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<(), StoreError> {
        self.cells.lock().await.extend(rows);
        Ok(())
    }

    async fn update_cell(
        &self,
        row_number: usize,
        column: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        // Row 1 is the header; addressing it (or below) is a caller bug.
        if row_number < 2 {
            return Err(StoreError::RowOutOfRange(row_number));
        }
        let mut cells = self.cells.lock().await;
        let headers = match cells.first() {
            Some(header) => HeaderMap::new(header),
            None => return Err(StoreError::NoHeaders),
        };
        let col = headers
            .index_of(column)
            .ok_or_else(|| StoreError::UnknownColumn(column.to_string()))?;
        let row = cells
            .get_mut(row_number - 1)
            .ok_or(StoreError::RowOutOfRange(row_number))?;
        if row.len() <= col {
            row.resize(col + 1, String::new());
        }
        row[col] = value.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> MemoryStore {
        MemoryStore::with_values(vec![
            vec!["title".into(), "url".into(), "status".into()],
            vec!["A".into(), "https://a".into(), "new".into()],
        ])
    }

    #[tokio::test]
    async fn test_read_all_empty() {
        let store = MemoryStore::new();
        let snapshot = store.read_all().await.unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_update_cell_by_name() {
        let store = seeded();
        store.update_cell(2, "status", "published").await.unwrap();
        let dump = store.dump().await;
        assert_eq!(dump[1][2], "published");
    }

    #[tokio::test]
    async fn test_update_cell_unknown_column() {
        let store = seeded();
        let err = store.update_cell(2, "publish", "TRUE").await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownColumn(_)));
    }

    #[tokio::test]
    async fn test_update_cell_rejects_header_and_zero_rows() {
        let store = seeded();
        for row_number in [0, 1] {
            let err = store
                .update_cell(row_number, "status", "published")
                .await
                .unwrap_err();
            assert!(matches!(err, StoreError::RowOutOfRange(n) if n == row_number));
        }
        // Header row untouched.
        assert_eq!(store.dump().await[0][2], "status");
    }

    #[tokio::test]
    async fn test_update_cell_extends_short_row() {
        let store = MemoryStore::with_values(vec![
            vec!["title".into(), "url".into(), "status".into()],
            vec!["A".into()],
        ]);
        store.update_cell(2, "status", "failed").await.unwrap();
        let dump = store.dump().await;
        assert_eq!(dump[1], vec!["A".to_string(), String::new(), "failed".to_string()]);
    }
}
