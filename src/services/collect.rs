//! Collector workflow: extract candidates, dedup by URL, append new rows.

use tracing::{info, warn};

use crate::models::{Record, RecordStatus};
use crate::scrapers::{Candidate, ExtractError, Extractor};
use crate::store::{record_to_row, HeaderMap, RecordStore, StoreError, DEFAULT_HEADERS};

/// Errors fatal to a collector run.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("worksheet has no {0:?} column; cannot dedup")]
    MissingColumn(String),
}

/// Result of one collector pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectReport {
    /// Rows appended this run.
    pub appended: usize,
    /// Candidates skipped because their URL was already stored.
    pub skipped_existing: usize,
    /// Candidates skipped because an earlier candidate in this batch carried
    /// the same URL.
    pub skipped_in_batch: usize,
}

/// One collection pass against one worksheet.
pub struct CollectService<S> {
    store: S,
    initial_status: RecordStatus,
}

impl<S: RecordStore> CollectService<S> {
    pub fn new(store: S, initial_status: RecordStatus) -> Self {
        Self {
            store,
            initial_status,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one pass: extract, dedup against the store and within the batch,
    /// append survivors in a single call.
    pub async fn run(&self, extractor: &dyn Extractor) -> Result<CollectReport, CollectError> {
        let candidates = extractor.extract().await?;
        info!(
            source = extractor.source_id(),
            candidates = candidates.len(),
            "listing extracted"
        );

        let snapshot = self.store.read_all().await?;

        // An empty worksheet gets the default schema ahead of any data rows.
        let bootstrap = snapshot.is_empty();
        let headers = if bootstrap {
            HeaderMap::from_strs(DEFAULT_HEADERS)
        } else {
            if !snapshot.headers.contains("url") {
                return Err(CollectError::MissingColumn("url".to_string()));
            }
            snapshot.headers.clone()
        };

        let mut seen: std::collections::HashSet<String> = (0..snapshot.rows.len())
            .filter_map(|i| snapshot.view(i).get("url"))
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .collect();

        let mut report = CollectReport::default();
        let today = today();
        let mut rows: Vec<Vec<String>> = Vec::new();

        if bootstrap {
            rows.push(DEFAULT_HEADERS.iter().map(|h| h.to_string()).collect());
        }

        for candidate in candidates {
            if seen.contains(&candidate.url) {
                if snapshot_has(&snapshot, &candidate.url) {
                    report.skipped_existing += 1;
                } else {
                    report.skipped_in_batch += 1;
                }
                continue;
            }
            seen.insert(candidate.url.clone());

            let record = self.to_record(candidate, &today);
            rows.push(record_to_row(&record, &headers));
            report.appended += 1;
        }

        if !rows.is_empty() {
            self.store.append_rows(rows).await?;
        } else if report.appended == 0 {
            info!(source = extractor.source_id(), "nothing new to append");
        }

        if report.skipped_existing + report.skipped_in_batch > 0 {
            warn!(
                skipped_existing = report.skipped_existing,
                skipped_in_batch = report.skipped_in_batch,
                "duplicate candidates skipped"
            );
        }

        Ok(report)
    }

    fn to_record(&self, candidate: Candidate, today: &str) -> Record {
        Record {
            title: candidate.title,
            url: candidate.url,
            company: candidate.company,
            location: candidate.location,
            experience: candidate.experience,
            scraped_at: today.to_string(),
            status: self.initial_status,
        }
    }
}

fn snapshot_has(snapshot: &crate::store::Snapshot, url: &str) -> bool {
    (0..snapshot.rows.len()).any(|i| snapshot.view(i).get("url") == Some(url))
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;

    struct FixedExtractor {
        candidates: Vec<Candidate>,
    }

    #[async_trait]
    impl Extractor for FixedExtractor {
        fn source_id(&self) -> &str {
            "fixed"
        }

        async fn extract(&self) -> Result<Vec<Candidate>, ExtractError> {
            Ok(self.candidates.clone())
        }
    }

    fn extractor(urls: &[(&str, &str)]) -> FixedExtractor {
        FixedExtractor {
            candidates: urls
                .iter()
                .map(|(title, url)| Candidate::new(title, url))
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_empty_store_gets_header_row_then_data() {
        let service = CollectService::new(MemoryStore::new(), RecordStatus::New);
        let report = service
            .run(&extractor(&[("A", "https://a"), ("B", "https://b")]))
            .await
            .unwrap();
        assert_eq!(report.appended, 2);

        let snapshot = service.store().read_all().await.unwrap();
        assert_eq!(snapshot.headers.names()[0], "title");
        assert_eq!(snapshot.rows.len(), 2);
        assert_eq!(snapshot.view(0).get("url"), Some("https://a"));
        assert_eq!(snapshot.view(0).get("status"), Some("new"));
        assert_eq!(snapshot.view(1).get("title"), Some("B"));
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let service = CollectService::new(MemoryStore::new(), RecordStatus::New);
        let source = extractor(&[("A", "https://a"), ("B", "https://b")]);

        let first = service.run(&source).await.unwrap();
        assert_eq!(first.appended, 2);

        let second = service.run(&source).await.unwrap();
        assert_eq!(second.appended, 0);
        assert_eq!(second.skipped_existing, 2);

        let snapshot = service.store().read_all().await.unwrap();
        assert_eq!(snapshot.rows.len(), 2);
    }

    #[tokio::test]
    async fn test_in_batch_duplicates_skipped() {
        let service = CollectService::new(MemoryStore::new(), RecordStatus::New);
        let report = service
            .run(&extractor(&[
                ("A", "https://a"),
                ("A again", "https://a"),
                ("B", "https://b"),
            ]))
            .await
            .unwrap();
        assert_eq!(report.appended, 2);
        assert_eq!(report.skipped_in_batch, 1);
        assert_eq!(report.skipped_existing, 0);
    }

    #[tokio::test]
    async fn test_existing_sheet_column_order_is_respected() {
        // url first, title last: values must land by name, not position.
        let store = MemoryStore::with_values(vec![
            vec!["url".to_string(), "status".to_string(), "title".to_string()],
            vec![
                "https://a".to_string(),
                "published".to_string(),
                "Old".to_string(),
            ],
        ]);
        let service = CollectService::new(store, RecordStatus::Archived);
        let report = service
            .run(&extractor(&[("New one", "https://b")]))
            .await
            .unwrap();
        assert_eq!(report.appended, 1);

        let snapshot = service.store().read_all().await.unwrap();
        assert_eq!(snapshot.view(1).get("url"), Some("https://b"));
        assert_eq!(snapshot.view(1).get("title"), Some("New one"));
        assert_eq!(snapshot.view(1).get("status"), Some("archived"));
    }

    #[tokio::test]
    async fn test_missing_url_column_is_an_error() {
        let store = MemoryStore::with_values(vec![vec![
            "title".to_string(),
            "status".to_string(),
        ]]);
        let service = CollectService::new(store, RecordStatus::New);
        let err = service
            .run(&extractor(&[("A", "https://a")]))
            .await
            .unwrap_err();
        assert!(matches!(err, CollectError::MissingColumn(_)));
    }
}
