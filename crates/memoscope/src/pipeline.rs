use anyhow::Result;
use memoscope_config::AppConfig;

use crate::analyze_cmd::{analyze, print_outcome};
use crate::cli::{CollectArgs, OutputFormat};
use crate::collect_cmd::collect;

/// Collect over the configured range, then analyze the fresh snapshot.
pub(crate) async fn handle_run(
    config: &AppConfig,
    subject: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    // Fail on missing credentials before spending time on the ledger walk.
    config.validate_ingestion()?;
    config.validate_analysis()?;

    let collected = collect(config, &CollectArgs::default()).await?;
    if format == OutputFormat::Text {
        println!("Memo data saved to {}", collected.snapshot_path.display());
    }

    let subject = subject.unwrap_or_else(|| config.analysis.subject.clone());
    let outcome = analyze(config, &collected.index, &subject, None).await?;
    print_outcome(&outcome, format)
}
