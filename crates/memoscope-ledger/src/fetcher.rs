use std::time::Duration;

use memoscope_core::LedgerWindow;
use tracing::debug;

use crate::service::{AccountTxRequest, LedgerError, LedgerService, PaginationCursor};
use crate::transaction::RawTransaction;

#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    /// Transactions requested per page.
    pub page_limit: u32,
    /// Pause before every page after the first one of a window.
    pub page_delay: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_limit: 400,
            page_delay: Duration::from_millis(100),
        }
    }
}

/// Pages through one window of an account's history, oldest first.
///
/// The cursor never leaves the window it was issued for. Errors are returned
/// as-is; there are no retries.
pub struct WindowPager<'a, S: LedgerService + ?Sized> {
    service: &'a S,
    request: AccountTxRequest,
    page_delay: Duration,
    pages_fetched: usize,
    done: bool,
}

impl<'a, S: LedgerService + ?Sized> WindowPager<'a, S> {
    pub fn new(service: &'a S, account: &str, window: LedgerWindow, options: FetchOptions) -> Self {
        Self {
            service,
            request: AccountTxRequest::for_window(account, window, options.page_limit),
            page_delay: options.page_delay,
            pages_fetched: 0,
            done: false,
        }
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Next page of transactions, or `None` once the window is drained.
    pub async fn next_page(&mut self) -> Result<Option<Vec<RawTransaction>>, LedgerError> {
        if self.done {
            return Ok(None);
        }
        if self.pages_fetched > 0 && !self.page_delay.is_zero() {
            tokio::time::sleep(self.page_delay).await;
        }

        let page = self.service.account_transactions(&self.request).await?;
        self.pages_fetched += 1;
        debug!(
            ledger_min = self.request.ledger_index_min,
            ledger_max = self.request.ledger_index_max,
            page = self.pages_fetched,
            transactions = page.transactions.len(),
            has_more = page.next_cursor.is_some(),
            "fetched account_tx page"
        );

        if page.transactions.is_empty() {
            self.done = true;
            return Ok(None);
        }
        self.advance(page.next_cursor);
        Ok(Some(page.transactions))
    }

    fn advance(&mut self, cursor: Option<PaginationCursor>) {
        self.done = cursor.is_none();
        self.request.cursor = cursor;
    }
}

/// Drain a whole window into memory.
pub async fn fetch_window<S: LedgerService + ?Sized>(
    service: &S,
    account: &str,
    window: LedgerWindow,
    options: FetchOptions,
) -> Result<Vec<RawTransaction>, LedgerError> {
    let mut pager = WindowPager::new(service, account, window, options);
    let mut transactions = Vec::new();
    while let Some(page) = pager.next_page().await? {
        transactions.extend(page);
    }
    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedLedger, issued_payment};

    fn options(page_limit: u32) -> FetchOptions {
        FetchOptions {
            page_limit,
            page_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_follows_cursor_until_exhausted() {
        let ledger = ScriptedLedger::new(
            (0..5)
                .map(|i| issued_payment("rA", 100 + i, "PFT", &format!("memo {i}")))
                .collect(),
        );
        let window = LedgerWindow::new(100, 199).unwrap();

        let txs = fetch_window(&ledger, "rIssuer1", window, options(2))
            .await
            .unwrap();
        assert_eq!(txs.len(), 5);

        let requests = ledger.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].cursor.is_none());
        assert!(requests[1].cursor.is_some());
        assert!(
            requests
                .iter()
                .all(|r| r.ledger_index_min == 100 && r.ledger_index_max == 199)
        );
    }

    #[tokio::test]
    async fn test_empty_window_makes_one_request() {
        let ledger = ScriptedLedger::new(Vec::new());
        let window = LedgerWindow::new(1, 10).unwrap();
        let txs = fetch_window(&ledger, "rIssuer1", window, options(10))
            .await
            .unwrap();
        assert!(txs.is_empty());
        assert_eq!(ledger.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_error_is_not_retried() {
        let ledger = ScriptedLedger::new(
            (0..4)
                .map(|i| issued_payment("rA", 10 + i, "PFT", "m"))
                .collect(),
        )
        .fail_on_call(2);
        let window = LedgerWindow::new(10, 20).unwrap();

        let err = fetch_window(&ledger, "rIssuer1", window, options(2))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Http { status: 503, .. }));
        assert_eq!(ledger.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_pager_reports_none_after_drain() {
        let ledger = ScriptedLedger::new(vec![issued_payment("rA", 5, "PFT", "m")]);
        let window = LedgerWindow::new(0, 9).unwrap();
        let mut pager = WindowPager::new(&ledger, "rIssuer1", window, options(10));

        assert_eq!(pager.next_page().await.unwrap().map(|p| p.len()), Some(1));
        assert!(pager.next_page().await.unwrap().is_none());
        assert!(pager.next_page().await.unwrap().is_none());
        assert_eq!(pager.pages_fetched(), 1);
    }
}
