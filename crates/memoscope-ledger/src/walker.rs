use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use memoscope_core::{AppError, LedgerWindow, MemoRecord, UserMemoIndex};
use tracing::{error, info, warn};

use crate::aggregator::UserMemoAggregator;
use crate::checkpoint::RecoveryHandler;
use crate::fetcher::{FetchOptions, WindowPager};
use crate::memo::decode_memo;
use crate::service::{LedgerError, LedgerService};
use crate::transaction::{extract_memos, is_relevant_payment, memo_record};

/// Split `[start, end)` into contiguous windows of at most `window_size` ledgers.
pub fn partition_windows(start: u32, end: u32, window_size: NonZeroU32) -> Vec<LedgerWindow> {
    let step = u64::from(window_size.get());
    let end = u64::from(end);
    let mut windows = Vec::new();
    let mut cursor = u64::from(start);
    while cursor < end {
        let next = (cursor + step).min(end);
        // Both bounds are <= `end`, which came from a u32.
        if let Some(window) = LedgerWindow::from_half_open(cursor as u32, next as u32) {
            windows.push(window);
        }
        cursor = next;
    }
    windows
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkRequest {
    pub currency: String,
    /// Account whose history is walked; also the token issuer.
    pub issuer: String,
    pub start_ledger: u32,
    /// Exclusive end; `None` resolves to the current validated ledger.
    pub end_ledger: Option<u32>,
    pub window_size: NonZeroU32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub start_ledger: u32,
    pub end_ledger: u32,
    pub windows_completed: usize,
    pub transactions_seen: usize,
    pub relevant_payments: usize,
    pub records_added: usize,
    pub decode_failures: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("could not determine the current ledger index")]
    CurrentLedger {
        #[source]
        source: LedgerError,
        checkpoint: Option<PathBuf>,
    },

    #[error("failed to fetch ledger window {window}")]
    Window {
        window: LedgerWindow,
        #[source]
        source: LedgerError,
        checkpoint: Option<PathBuf>,
    },
}

impl IngestError {
    /// Where partial results were saved, if the recovery handler succeeded.
    pub fn checkpoint(&self) -> Option<&Path> {
        match self {
            Self::CurrentLedger { checkpoint, .. } | Self::Window { checkpoint, .. } => {
                checkpoint.as_deref()
            }
        }
    }

    pub fn failed_window(&self) -> Option<LedgerWindow> {
        match self {
            Self::Window { window, .. } => Some(*window),
            Self::CurrentLedger { .. } => None,
        }
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        AppError::Transport(Box::new(err))
    }
}

/// Walks an issuer's history window by window and feeds decoded memos into
/// an aggregator.
///
/// A window's records reach the aggregator only after the whole window has
/// been fetched. On the first failure the recovery handler receives a
/// snapshot of the completed windows and the walk stops.
pub struct LedgerRangeWalker<'a, S: LedgerService + ?Sized> {
    service: &'a S,
    options: FetchOptions,
}

impl<'a, S: LedgerService + ?Sized> LedgerRangeWalker<'a, S> {
    pub fn new(service: &'a S, options: FetchOptions) -> Self {
        Self { service, options }
    }

    pub async fn walk(
        &self,
        request: &WalkRequest,
        aggregator: &mut UserMemoAggregator,
        recovery: &dyn RecoveryHandler,
    ) -> Result<WalkSummary, IngestError> {
        let end_ledger = match request.end_ledger {
            Some(end) => end,
            None => match self.service.current_ledger_index().await {
                Ok(index) => index,
                Err(source) => {
                    error!(error = %source, "failed to fetch current ledger index");
                    let checkpoint = recover(recovery, aggregator, request.start_ledger, None);
                    return Err(IngestError::CurrentLedger { source, checkpoint });
                }
            },
        };

        let windows = partition_windows(request.start_ledger, end_ledger, request.window_size);
        info!(
            currency = %request.currency,
            issuer = %request.issuer,
            start = request.start_ledger,
            end = end_ledger,
            windows = windows.len(),
            "starting ledger walk"
        );

        let mut summary = WalkSummary {
            start_ledger: request.start_ledger,
            end_ledger,
            ..WalkSummary::default()
        };
        for (position, window) in windows.iter().copied().enumerate() {
            info!(%window, window_no = position + 1, total = windows.len(), "processing window");
            match self.drain_window(request, window, &mut summary).await {
                Ok(staged) => {
                    summary.records_added += staged.len();
                    aggregator.extend(staged);
                    summary.windows_completed += 1;
                }
                Err(source) => {
                    error!(%window, error = %source, "window fetch failed, aborting walk");
                    let checkpoint =
                        recover(recovery, aggregator, window.start_index, Some(end_ledger));
                    return Err(IngestError::Window {
                        window,
                        source,
                        checkpoint,
                    });
                }
            }
        }

        info!(
            windows = summary.windows_completed,
            transactions = summary.transactions_seen,
            records = summary.records_added,
            decode_failures = summary.decode_failures,
            accounts = aggregator.account_count(),
            "ledger walk complete"
        );
        Ok(summary)
    }

    /// Walk into a fresh aggregator and return the finished index.
    pub async fn collect(
        &self,
        request: &WalkRequest,
        recovery: &dyn RecoveryHandler,
    ) -> Result<UserMemoIndex, IngestError> {
        let mut aggregator = UserMemoAggregator::new();
        self.walk(request, &mut aggregator, recovery).await?;
        Ok(aggregator.into_index())
    }

    async fn drain_window(
        &self,
        request: &WalkRequest,
        window: LedgerWindow,
        summary: &mut WalkSummary,
    ) -> Result<Vec<MemoRecord>, LedgerError> {
        let mut pager = WindowPager::new(self.service, &request.issuer, window, self.options);
        let mut staged = Vec::new();
        while let Some(page) = pager.next_page().await? {
            summary.transactions_seen += page.len();
            for tx in page.iter().filter(|tx| is_relevant_payment(tx, &request.currency)) {
                summary.relevant_payments += 1;
                for raw in extract_memos(tx) {
                    match decode_memo(raw) {
                        Ok(text) => staged.extend(memo_record(tx, text)),
                        Err(err) => {
                            summary.decode_failures += 1;
                            warn!(
                                tx_hash = tx.hash.as_deref().unwrap_or("-"),
                                error = %err,
                                "skipping undecodable memo"
                            );
                        }
                    }
                }
            }
        }
        Ok(staged)
    }
}

fn recover(
    recovery: &dyn RecoveryHandler,
    aggregator: &UserMemoAggregator,
    failing_window_start: u32,
    requested_end: Option<u32>,
) -> Option<PathBuf> {
    match recovery.on_fatal_error(aggregator.snapshot(), failing_window_start, requested_end) {
        Ok(path) => Some(path),
        Err(err) => {
            error!(error = %err, "failed to persist ingestion checkpoint");
            None
        }
    }
}

#[cfg(test)]
#[path = "walker_tests.rs"]
mod tests;
