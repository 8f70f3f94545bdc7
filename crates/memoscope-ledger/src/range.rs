use tracing::{info, warn};

use crate::service::{AccountTxRequest, LedgerError, LedgerService};

/// Used when the node cannot tell where the account's history begins.
const FALLBACK_EARLIEST_LEDGER: u32 = 1;

/// Ledger index of the account's oldest transaction the node still holds.
///
/// Any failure falls back to ledger 1 with a warning; this only narrows a
/// range, so guessing low is harmless.
pub async fn earliest_ledger<S: LedgerService + ?Sized>(service: &S, account: &str) -> u32 {
    let request = AccountTxRequest {
        account: account.to_string(),
        ledger_index_min: -1,
        ledger_index_max: -1,
        forward: true,
        limit: 1,
        cursor: None,
    };
    match service.account_transactions(&request).await {
        Ok(page) => page
            .transactions
            .first()
            .and_then(|tx| tx.ledger_index)
            .unwrap_or(FALLBACK_EARLIEST_LEDGER),
        Err(err) => {
            warn!(
                error = %err,
                assuming = FALLBACK_EARLIEST_LEDGER,
                "could not determine earliest ledger"
            );
            FALLBACK_EARLIEST_LEDGER
        }
    }
}

/// Clamp `[start, end)` to what the node can actually serve.
///
/// `start` is raised to the account's earliest transaction and `end`
/// (defaulting to the current ledger) lowered to the current ledger. The
/// result never has `start > end`.
pub async fn validate_ledger_range<S: LedgerService + ?Sized>(
    service: &S,
    account: &str,
    start: u32,
    end: Option<u32>,
) -> Result<(u32, u32), LedgerError> {
    let current = service.current_ledger_index().await?;
    let earliest = earliest_ledger(service, account).await;

    let end_adjusted = end.unwrap_or(current).min(current);
    let start_adjusted = start.max(earliest).min(end_adjusted);

    if start_adjusted != start || Some(end_adjusted) != end {
        info!(
            requested_start = start,
            requested_end = ?end,
            start = start_adjusted,
            end = end_adjusted,
            earliest,
            current,
            "adjusted ledger range"
        );
    }
    Ok((start_adjusted, end_adjusted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedLedger, issued_payment};

    #[tokio::test]
    async fn test_range_clamped_to_history_and_current_ledger() {
        let ledger = ScriptedLedger::new(vec![
            issued_payment("rA", 500, "PFT", "first"),
            issued_payment("rA", 900, "PFT", "later"),
        ])
        .with_current_ledger(1_000);

        let range = validate_ledger_range(&ledger, "rIssuer1", 10, Some(5_000))
            .await
            .unwrap();
        assert_eq!(range, (500, 1_000));

        let request = &ledger.requests()[0];
        assert_eq!(request.ledger_index_min, -1);
        assert_eq!(request.limit, 1);
        assert!(request.forward);
    }

    #[tokio::test]
    async fn test_range_inside_bounds_is_unchanged() {
        let ledger = ScriptedLedger::new(vec![issued_payment("rA", 500, "PFT", "m")])
            .with_current_ledger(1_000);
        let range = validate_ledger_range(&ledger, "rIssuer1", 600, Some(700))
            .await
            .unwrap();
        assert_eq!(range, (600, 700));
    }

    #[tokio::test]
    async fn test_missing_end_defaults_to_current() {
        let ledger = ScriptedLedger::new(Vec::new()).with_current_ledger(800);
        let range = validate_ledger_range(&ledger, "rIssuer1", 0, None)
            .await
            .unwrap();
        assert_eq!(range, (1, 800));
    }

    #[tokio::test]
    async fn test_start_never_exceeds_end() {
        let ledger = ScriptedLedger::new(Vec::new()).with_current_ledger(50);
        let range = validate_ledger_range(&ledger, "rIssuer1", 90, None)
            .await
            .unwrap();
        assert_eq!(range, (50, 50));
    }

    #[tokio::test]
    async fn test_earliest_lookup_failure_falls_back() {
        let ledger = ScriptedLedger::new(Vec::new()).fail_on_call(1);
        assert_eq!(earliest_ledger(&ledger, "rIssuer1").await, 1);
    }
}
