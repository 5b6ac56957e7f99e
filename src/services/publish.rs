//! Publisher workflow: select eligible rows, enrich, deliver, mark terminal.
//!
//! Terminal statuses are the at-most-once guarantee: a row that reaches
//! `published`, `dropped`, or `failed` never matches the selection predicate
//! again. Concurrent publisher runs against one store can still double-send;
//! that window is accepted rather than locked away.

use tracing::{info, warn};

use crate::llm::{Enricher, Summary};
use crate::models::{publish_flag_set, RecordStatus};
use crate::notify::{compose_blocks, compose_text, Message, Notifier};
use crate::scrapers::page::PageFetcher;
use crate::store::{RecordStore, Snapshot, StoreError};

/// Errors fatal to a publisher run. Everything scoped to a single candidate
/// becomes a [`RowOutcome`] instead.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("worksheet has no {0:?} column")]
    MissingColumn(String),
}

/// How many candidates one run may deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishMode {
    /// Walk candidates until one delivery has been attempted, then stop.
    /// Dropped rows and pre-delivery failures do not end the run.
    FirstSuccess,
    /// Process every eligible candidate.
    All,
}

/// Which payload shape the composed message takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStyle {
    /// Plain-text job posting message.
    Text,
    /// Block Kit article card.
    Blocks,
}

/// A row that matched the selection predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibleRow {
    /// 1-based worksheet row number (header row included).
    pub row_number: usize,
    pub title: String,
    pub url: String,
    pub company: Option<String>,
    pub status: RecordStatus,
}

/// Terminal outcome of one processed candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Published,
    Dropped,
    Failed,
}

#[derive(Debug, Clone)]
pub struct RowOutcome {
    pub row_number: usize,
    pub title: String,
    pub url: String,
    pub outcome: Outcome,
    /// Human-readable cause for dropped/failed rows.
    pub detail: Option<String>,
}

/// Result of one publisher pass.
#[derive(Debug, Default, Clone)]
pub struct PublishReport {
    pub outcomes: Vec<RowOutcome>,
}

impl PublishReport {
    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn published(&self) -> usize {
        self.count(Outcome::Published)
    }
}

/// Select rows eligible for publishing, preserving store order.
///
/// Eligible means: status parses to `new` or `archived`, AND either the sheet
/// has no `publish` column or the row's publish cell is truthy. Rows holding
/// an unrecognized non-empty status are logged and skipped.
pub fn select_candidates(snapshot: &Snapshot) -> Vec<EligibleRow> {
    let mut eligible = Vec::new();

    for i in 0..snapshot.rows.len() {
        let view = snapshot.view(i);
        let row_number = snapshot.row_number(i);

        let Some(status_cell) = view.get("status") else {
            continue;
        };
        let status = match RecordStatus::parse(status_cell) {
            Ok(status) => status,
            Err(_) => {
                if !status_cell.trim().is_empty() {
                    warn!(row = row_number, status = status_cell, "unrecognized status, skipping");
                }
                continue;
            }
        };
        if status.is_terminal() {
            continue;
        }

        if let Some(publish_cell) = view.get("publish") {
            if !publish_flag_set(publish_cell) {
                continue;
            }
        }

        let title = view.get("title").unwrap_or("").to_string();
        let url = view.get("url").unwrap_or("").to_string();
        if url.is_empty() {
            warn!(row = row_number, "eligible row has no url, skipping");
            continue;
        }

        eligible.push(EligibleRow {
            row_number,
            title,
            url,
            company: view
                .get("company")
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            status,
        });
    }

    eligible
}

/// One publishing pass against one worksheet.
pub struct PublishService<S, P, E, N> {
    store: S,
    fetcher: P,
    enricher: E,
    notifier: N,
    mode: PublishMode,
    style: MessageStyle,
    classify: bool,
    limit: Option<usize>,
}

impl<S, P, E, N> PublishService<S, P, E, N>
where
    S: RecordStore,
    P: PageFetcher,
    E: Enricher,
    N: Notifier,
{
    pub fn new(store: S, fetcher: P, enricher: E, notifier: N) -> Self {
        Self {
            store,
            fetcher,
            enricher,
            notifier,
            mode: PublishMode::FirstSuccess,
            style: MessageStyle::Blocks,
            classify: false,
            limit: None,
        }
    }

    pub fn with_mode(mut self, mode: PublishMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_style(mut self, style: MessageStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_classification(mut self, classify: bool) -> Self {
        self.classify = classify;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one pass. Store failures abort; everything else lands in the
    /// report as a per-row outcome.
    pub async fn run(&self) -> Result<PublishReport, PublishError> {
        let snapshot = self.store.read_all().await?;

        for required in ["status", "title", "url"] {
            if !snapshot.headers.is_empty() && !snapshot.headers.contains(required) {
                return Err(PublishError::MissingColumn(required.to_string()));
            }
        }

        let mut candidates = select_candidates(&snapshot);
        if let Some(limit) = self.limit {
            candidates.truncate(limit);
        }
        info!(candidates = candidates.len(), "eligible rows selected");

        let has_identity_column = snapshot.headers.contains("identity_match");
        let mut report = PublishReport::default();

        for row in candidates {
            let (outcome, delivery_attempted) =
                self.process(&row, has_identity_column).await?;
            report.outcomes.push(outcome);

            if self.mode == PublishMode::FirstSuccess && delivery_attempted {
                break;
            }
        }

        Ok(report)
    }

    /// Drive one candidate to its terminal status. Returns the outcome and
    /// whether a delivery was attempted (the stop condition in
    /// [`PublishMode::FirstSuccess`]).
    async fn process(
        &self,
        row: &EligibleRow,
        has_identity_column: bool,
    ) -> Result<(RowOutcome, bool), PublishError> {
        info!(row = row.row_number, title = %row.title, "processing candidate");

        let text = match self.fetcher.fetch_text(&row.url).await {
            Ok(text) => text,
            Err(e) => {
                warn!(row = row.row_number, error = %e, "page fetch failed");
                return Ok((self.mark(row, Outcome::Failed, Some(e.to_string())).await?, false));
            }
        };

        if self.classify {
            match self.enricher.classify(&text, &row.title).await {
                Ok(verdict) => {
                    // Persist the verdict before acting on it so a later
                    // crash cannot lose the judgment.
                    if has_identity_column {
                        let cell = if verdict.is_appropriate { "TRUE" } else { "FALSE" };
                        self.store
                            .update_cell(row.row_number, "identity_match", cell)
                            .await?;
                    }
                    if !verdict.is_appropriate {
                        info!(row = row.row_number, reason = %verdict.reason, "candidate unsuitable");
                        return Ok((
                            self.mark(row, Outcome::Dropped, Some(verdict.reason)).await?,
                            false,
                        ));
                    }
                }
                Err(e) => {
                    warn!(row = row.row_number, error = %e, "classification failed");
                    return Ok((
                        self.mark(row, Outcome::Failed, Some(e.to_string())).await?,
                        false,
                    ));
                }
            }
        }

        let summary = match self.enricher.summarize(&text, &row.title).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(row = row.row_number, error = %e, "summarization failed");
                return Ok((self.mark(row, Outcome::Failed, Some(e.to_string())).await?, false));
            }
        };

        let message = self.compose(row, &summary);
        match self.notifier.deliver(&message).await {
            Ok(()) => {
                info!(row = row.row_number, "message delivered");
                Ok((self.mark(row, Outcome::Published, None).await?, true))
            }
            Err(e) => {
                warn!(row = row.row_number, error = %e, "delivery failed");
                Ok((self.mark(row, Outcome::Failed, Some(e.to_string())).await?, true))
            }
        }
    }

    fn compose(&self, row: &EligibleRow, summary: &Summary) -> Message {
        match self.style {
            MessageStyle::Text => {
                compose_text(&row.title, &row.url, row.company.as_deref(), summary)
            }
            MessageStyle::Blocks => compose_blocks(&row.title, &row.url, summary),
        }
    }

    /// Flip the row's status to its terminal value.
    async fn mark(
        &self,
        row: &EligibleRow,
        outcome: Outcome,
        detail: Option<String>,
    ) -> Result<RowOutcome, PublishError> {
        let status = match outcome {
            Outcome::Published => RecordStatus::Published,
            Outcome::Dropped => RecordStatus::Dropped,
            Outcome::Failed => RecordStatus::Failed,
        };
        self.store
            .update_cell(row.row_number, "status", status.as_str())
            .await?;
        Ok(RowOutcome {
            row_number: row.row_number,
            title: row.title.clone(),
            url: row.url.clone(),
            outcome,
            detail,
        })
    }
}
