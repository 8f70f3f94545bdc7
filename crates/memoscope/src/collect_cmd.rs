use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use memoscope_config::AppConfig;
use memoscope_core::{AppError, UserMemoIndex};
use memoscope_ledger::{
    CheckpointWriter, FetchOptions, JsonRpcLedgerClient, LedgerRangeWalker, RecoveryHandler,
    UserMemoAggregator, WalkRequest, WalkSummary, load_checkpoint, save_snapshot,
    validate_ledger_range,
};
use serde::Serialize;
use tracing::{error, info};

use crate::artifacts::artifact_file_name;
use crate::cli::{CollectArgs, OutputFormat};

#[derive(Debug)]
pub(crate) struct CollectOutcome {
    pub snapshot_path: PathBuf,
    pub index: UserMemoIndex,
    pub summary: WalkSummary,
}

#[derive(Serialize)]
struct CollectReport<'a> {
    snapshot: &'a Path,
    start_ledger: u32,
    end_ledger: u32,
    windows: usize,
    transactions: usize,
    records_added: usize,
    decode_failures: usize,
    accounts: usize,
    total_records: usize,
}

pub(crate) async fn handle_collect(
    config: &AppConfig,
    args: CollectArgs,
    format: OutputFormat,
) -> Result<()> {
    let outcome = collect(config, &args).await?;
    let report = CollectReport {
        snapshot: &outcome.snapshot_path,
        start_ledger: outcome.summary.start_ledger,
        end_ledger: outcome.summary.end_ledger,
        windows: outcome.summary.windows_completed,
        transactions: outcome.summary.transactions_seen,
        records_added: outcome.summary.records_added,
        decode_failures: outcome.summary.decode_failures,
        accounts: outcome.index.len(),
        total_records: outcome.index.values().map(Vec::len).sum(),
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            println!(
                "Collected {} memos from {} accounts over ledgers [{}, {})",
                report.total_records, report.accounts, report.start_ledger, report.end_ledger
            );
            if report.decode_failures > 0 {
                println!("Skipped {} undecodable memos", report.decode_failures);
            }
            println!("Snapshot saved to {}", report.snapshot.display());
        }
    }
    Ok(())
}

/// Run one ledger walk and persist the snapshot.
pub(crate) async fn collect(config: &AppConfig, args: &CollectArgs) -> Result<CollectOutcome> {
    config.validate_ingestion()?;
    let ledger = &config.ledger;

    let window_size = NonZeroU32::new(args.window_size.unwrap_or(ledger.window_size))
        .ok_or_else(|| AppError::Configuration("--window-size must be greater than 0".into()))?;

    let (mut aggregator, currency, issuer, start, end) = match &args.resume {
        Some(path) => {
            let checkpoint = load_checkpoint(path)
                .with_context(|| format!("failed to load checkpoint {}", path.display()))?;
            info!(
                path = %path.display(),
                failed_window_start = checkpoint.failed_window_start,
                accounts = checkpoint.user_memos.len(),
                "resuming from checkpoint"
            );
            let end = args.end.or(checkpoint.requested_end);
            (
                UserMemoAggregator::from_index(checkpoint.user_memos),
                checkpoint.currency,
                checkpoint.issuer,
                checkpoint.failed_window_start,
                end,
            )
        }
        None => (
            UserMemoAggregator::new(),
            ledger.currency.clone(),
            ledger.issuer.clone(),
            args.start.unwrap_or(ledger.start_ledger),
            args.end,
        ),
    };

    let client = JsonRpcLedgerClient::new(&ledger.node_url, ledger.request_timeout())
        .context("failed to build ledger client")?;
    info!(node = client.url(), %currency, %issuer, start, end = ?end, "collecting memos");

    let (start, end) = if args.validate_range {
        let (start, end) = validate_ledger_range(&client, &issuer, start, end)
            .await
            .map_err(|e| AppError::Transport(Box::new(e)))?;
        (start, Some(end))
    } else {
        (start, end)
    };

    let recovery = CheckpointWriter::new(
        &config.output.dir,
        &config.output.checkpoint_prefix,
        &currency,
        &issuer,
    );
    let walker = LedgerRangeWalker::new(
        &client,
        FetchOptions {
            page_limit: ledger.page_limit,
            page_delay: ledger.page_delay(),
        },
    );
    let request = WalkRequest {
        currency,
        issuer,
        start_ledger: start,
        end_ledger: end,
        window_size,
    };

    let summary = match walker.walk(&request, &mut aggregator, &recovery).await {
        Ok(summary) => summary,
        Err(err) => {
            if let Some(path) = err.checkpoint() {
                print_resume_hint("Partial results", path);
            }
            return Err(AppError::from(err).into());
        }
    };

    let index = aggregator.into_index();
    let snapshot_path = args.output.clone().unwrap_or_else(|| {
        config.output.dir.join(artifact_file_name(
            &config.output.memo_prefix,
            None,
            Local::now().naive_local(),
        ))
    });
    if let Err(err) = save_snapshot(&snapshot_path, &index) {
        error!(path = %snapshot_path.display(), error = %err, "failed to save snapshot");
        // Park the finished index as a checkpoint at the end boundary; resuming
        // it walks an empty range and retries the save.
        match recovery.on_fatal_error(index, summary.end_ledger, Some(summary.end_ledger)) {
            Ok(path) => print_resume_hint("Collected memos", &path),
            Err(recovery_err) => {
                error!(error = %recovery_err, "failed to persist ingestion checkpoint");
            }
        }
        return Err(anyhow::Error::new(err)
            .context(format!("failed to save snapshot {}", snapshot_path.display())));
    }

    Ok(CollectOutcome {
        snapshot_path,
        index,
        summary,
    })
}

fn print_resume_hint(what: &str, checkpoint: &Path) {
    eprintln!(
        "{what} saved to {}\n  Resume with: memoscope collect --resume {}",
        checkpoint.display(),
        checkpoint.display()
    );
}

#[cfg(test)]
#[path = "collect_cmd_tests.rs"]
mod tests;
