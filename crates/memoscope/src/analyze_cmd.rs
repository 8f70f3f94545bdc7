use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use memoscope_analysis::{
    AnalysisReport, ApiClient, CredibilityAnalyzer, DocumentSource, GoogleDocsClient,
    NoopDocumentSource,
};
use memoscope_config::AppConfig;
use memoscope_core::{AppError, UserMemoIndex};
use memoscope_ledger::load_snapshot;
use tracing::info;

use crate::artifacts::{artifact_file_name, latest_snapshot};
use crate::cli::{AnalyzeArgs, OutputFormat};

pub(crate) struct AnalyzeOutcome {
    pub report_path: PathBuf,
    pub report: AnalysisReport,
}

pub(crate) async fn handle_analyze(
    config: &AppConfig,
    args: AnalyzeArgs,
    format: OutputFormat,
) -> Result<()> {
    config.validate_analysis()?;

    let memos_path = match args.memos {
        Some(path) => path,
        None => latest_snapshot(&config.output.dir, &config.output.memo_prefix)?.ok_or_else(
            || {
                AppError::Configuration(format!(
                    "no {}_*.json snapshot in {}; run `memoscope collect` first or pass --memos",
                    config.output.memo_prefix,
                    config.output.dir.display()
                ))
            },
        )?,
    };
    info!(path = %memos_path.display(), "using memo snapshot");
    let index = load_snapshot(&memos_path)
        .with_context(|| format!("failed to load snapshot {}", memos_path.display()))?;

    let subject = args
        .subject
        .unwrap_or_else(|| config.analysis.subject.clone());
    let outcome = analyze(config, &index, &subject, args.output).await?;
    print_outcome(&outcome, format)
}

pub(crate) fn print_outcome(outcome: &AnalyzeOutcome, format: OutputFormat) -> Result<()> {
    let meta = &outcome.report.analysis_metadata;
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "report": outcome.report_path,
                    "total_users_analyzed": meta.total_users_analyzed,
                    "average_credibility_score": meta.average_credibility_score,
                }))?
            );
        }
        OutputFormat::Text => {
            println!("Analysis saved to {}", outcome.report_path.display());
            println!("Analyzed {} users", meta.total_users_analyzed);
            println!(
                "Average credibility score: {:.2}",
                meta.average_credibility_score
            );
        }
    }
    Ok(())
}

/// Score every account in `index` and save the report.
///
/// Fails with an external-service error when there were accounts to analyze
/// and none of them could be scored.
pub(crate) async fn analyze(
    config: &AppConfig,
    index: &UserMemoIndex,
    subject: &str,
    output: Option<PathBuf>,
) -> Result<AnalyzeOutcome> {
    config.validate_analysis()?;
    let analyzer = build_analyzer(config)?;

    let assessments = analyzer.analyze_all(index, subject).await;
    if !index.is_empty() && assessments.is_empty() {
        return Err(AppError::ExternalService {
            service: "completion".to_string(),
            message: format!("analysis failed for all {} accounts", index.len()),
        }
        .into());
    }

    let report = AnalysisReport::new(subject, analyzer.model(), assessments, Utc::now());
    let report_path = output.unwrap_or_else(|| {
        config.output.dir.join(artifact_file_name(
            &config.output.analysis_prefix,
            Some(subject),
            Local::now().naive_local(),
        ))
    });
    report
        .save(&report_path)
        .with_context(|| format!("failed to save report {}", report_path.display()))?;

    Ok(AnalyzeOutcome {
        report_path,
        report,
    })
}

fn build_analyzer(config: &AppConfig) -> Result<CredibilityAnalyzer> {
    let analysis = &config.analysis;
    let completion = ApiClient::new(
        &analysis.base_url,
        &analysis.api_key,
        &analysis.model,
        analysis.request_timeout(),
    )
    .context("failed to build completion client")?
    .with_referer(&analysis.referer);

    let documents: Box<dyn DocumentSource> = if config.documents.enabled {
        Box::new(
            GoogleDocsClient::new(
                &config.documents.base_url,
                &config.documents.access_token,
                analysis.request_timeout(),
            )
            .context("failed to build documents client")?,
        )
    } else {
        Box::new(NoopDocumentSource)
    };

    Ok(CredibilityAnalyzer::new(Box::new(completion), documents))
}
