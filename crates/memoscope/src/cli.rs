use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "memoscope", version)]
#[command(about = "Memoscope: ledger memo collector and credibility analyzer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to <config dir>/memoscope/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Walk the issuer's ledger history and save payment memos grouped by sender
    Collect(CollectArgs),

    /// Score every sender's credibility from a memo snapshot
    Analyze(AnalyzeArgs),

    /// Collect over the configured range, then analyze the result
    Run {
        /// Topic the memos are assessed against (defaults to analysis.subject)
        #[arg(long)]
        subject: Option<String>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct CollectArgs {
    /// First ledger index (defaults to ledger.start_ledger)
    #[arg(long)]
    pub start: Option<u32>,

    /// End ledger index, exclusive (defaults to the current validated ledger)
    #[arg(long)]
    pub end: Option<u32>,

    /// Ledgers per query window (defaults to ledger.window_size)
    #[arg(long)]
    pub window_size: Option<u32>,

    /// Clamp the range to the issuer's first transaction and the current ledger
    #[arg(long)]
    pub validate_range: bool,

    /// Continue from a checkpoint written by a failed collection
    #[arg(long, conflicts_with = "start")]
    pub resume: Option<PathBuf>,

    /// Snapshot path (defaults to <output.dir>/<memo_prefix>_<timestamp>.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct AnalyzeArgs {
    /// Memo snapshot to analyze (defaults to the newest one in output.dir)
    #[arg(long)]
    pub memos: Option<PathBuf>,

    /// Topic the memos are assessed against (defaults to analysis.subject)
    #[arg(long)]
    pub subject: Option<String>,

    /// Report path (defaults to <output.dir>/<analysis_prefix>_<subject>_<timestamp>.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration with secrets masked
    Show,

    /// Print the path of the user config file
    Path,
}
