//! Ledger ingestion: walks an issuer's transaction history window by window,
//! decodes payment memos and groups them by sending account.

pub mod aggregator;
pub mod checkpoint;
pub mod fetcher;
pub mod memo;
pub mod range;
pub mod rpc_client;
pub mod service;
pub mod snapshot;
pub mod transaction;
pub mod walker;

#[cfg(test)]
mod testing;

pub use aggregator::UserMemoAggregator;
pub use checkpoint::{Checkpoint, CheckpointWriter, RecoveryHandler, load_checkpoint};
pub use fetcher::{FetchOptions, WindowPager, fetch_window};
pub use memo::{MemoDecodeError, decode_memo, encode_memo};
pub use range::{earliest_ledger, validate_ledger_range};
pub use rpc_client::JsonRpcLedgerClient;
pub use service::{AccountTxPage, AccountTxRequest, LedgerError, LedgerService, PaginationCursor};
pub use snapshot::{load_snapshot, save_snapshot};
pub use transaction::{RawTransaction, extract_memos, is_relevant_payment, memo_record};
pub use walker::{IngestError, LedgerRangeWalker, WalkRequest, WalkSummary, partition_windows};
