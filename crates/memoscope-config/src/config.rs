use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use memoscope_core::AppError;
use serde::{Deserialize, Serialize};

use crate::paths;
use crate::redact::mask_secret;

pub const ENV_API_KEY: &str = "MEMOSCOPE_API_KEY";
pub const ENV_DOCS_TOKEN: &str = "MEMOSCOPE_DOCS_TOKEN";
pub const ENV_NODE_URL: &str = "MEMOSCOPE_NODE_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ledger: LedgerConfig,
    pub output: OutputConfig,
    pub analysis: AnalysisConfig,
    pub documents: DocumentsConfig,
}

/// Ledger node and ingestion range settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint of the ledger node.
    pub node_url: String,
    /// Currency code of the tracked token.
    pub currency: String,
    /// Issuing account; also the account whose history is walked.
    pub issuer: String,
    /// First ledger index of a walk when none is given on the command line.
    pub start_ledger: u32,
    /// Ledgers per query window.
    pub window_size: u32,
    /// Transactions requested per page.
    pub page_limit: u32,
    /// Pause between consecutive page requests.
    pub page_delay_ms: u64,
    /// Per-request timeout for ledger queries.
    pub request_timeout_seconds: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            node_url: "https://xrplcluster.com".to_string(),
            currency: "PFT".to_string(),
            issuer: "rnQUEEg8yyjrwk9FhyXpKavHyCRJM9BDMW".to_string(),
            start_ledger: 83_999_999,
            window_size: 1_000_000,
            page_limit: 400,
            page_delay_ms: 100,
            request_timeout_seconds: 30,
        }
    }
}

impl LedgerConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Where artifacts are written and how they are named.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub memo_prefix: String,
    pub checkpoint_prefix: String,
    pub analysis_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            memo_prefix: "pft_memos".to_string(),
            checkpoint_prefix: "pft_user_memos".to_string(),
            analysis_prefix: "credibility_analysis".to_string(),
        }
    }
}

/// OpenAI-compatible completion endpoint used for credibility scoring.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Topic the memos are assessed against.
    pub subject: String,
    /// Sent as `HTTP-Referer`; some gateways use it for attribution.
    pub referer: String,
    pub request_timeout_seconds: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key: String::new(),
            model: "anthropic/claude-3.5-haiku-20241022".to_string(),
            subject: "PFT".to_string(),
            referer: "http://localhost:8000".to_string(),
            request_timeout_seconds: 120,
        }
    }
}

impl AnalysisConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &mask_secret(&self.api_key))
            .field("model", &self.model)
            .field("subject", &self.subject)
            .field("referer", &self.referer)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

/// Google Docs REST access for expanding document links found in memos.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    pub enabled: bool,
    pub base_url: String,
    /// OAuth bearer token with the `documents.readonly` scope.
    pub access_token: String,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://docs.googleapis.com/v1".to_string(),
            access_token: String::new(),
        }
    }
}

impl fmt::Debug for DocumentsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentsConfig")
            .field("enabled", &self.enabled)
            .field("base_url", &self.base_url)
            .field("access_token", &mask_secret(&self.access_token))
            .finish()
    }
}

impl AppConfig {
    /// Load the effective configuration.
    ///
    /// An explicit path must exist. Without one, the XDG config file is used
    /// when present and defaults otherwise. Environment overrides apply last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from_path(path)?,
            None => match paths::config_file() {
                Some(path) if path.exists() => Self::load_from_path(&path)?,
                _ => {
                    tracing::debug!("no config file found, using defaults");
                    Self::default()
                }
            },
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            AppError::Configuration(format!("failed to parse {}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Apply `MEMOSCOPE_*` overrides. Empty values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(api_key) = non_empty(ENV_API_KEY) {
            self.analysis.api_key = api_key;
        }
        if let Some(token) = non_empty(ENV_DOCS_TOKEN) {
            self.documents.access_token = token;
        }
        if let Some(node_url) = non_empty(ENV_NODE_URL) {
            self.ledger.node_url = node_url;
        }
    }

    /// Check everything ledger ingestion needs before any request is made.
    pub fn validate_ingestion(&self) -> Result<(), AppError> {
        let ledger = &self.ledger;
        require_non_empty("ledger.node_url", &ledger.node_url)?;
        require_non_empty("ledger.currency", &ledger.currency)?;
        require_non_empty("ledger.issuer", &ledger.issuer)?;
        require_positive("ledger.window_size", ledger.window_size)?;
        require_positive("ledger.page_limit", ledger.page_limit)?;
        if ledger.request_timeout_seconds == 0 {
            return Err(AppError::Configuration(
                "ledger.request_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Check the credentials required by the credibility stage.
    pub fn validate_analysis(&self) -> Result<(), AppError> {
        require_non_empty("analysis.base_url", &self.analysis.base_url)?;
        require_non_empty("analysis.model", &self.analysis.model)?;
        if self.analysis.api_key.trim().is_empty() {
            return Err(AppError::Configuration(format!(
                "analysis.api_key is required (set it in the config file or {ENV_API_KEY})"
            )));
        }
        if self.documents.enabled && self.documents.access_token.trim().is_empty() {
            return Err(AppError::Configuration(format!(
                "documents.access_token is required when documents.enabled = true \
                 (set it in the config file or {ENV_DOCS_TOKEN})"
            )));
        }
        Ok(())
    }

    /// Copy with secrets masked, for `config show`.
    pub fn redacted_for_display(&self) -> Self {
        let mut redacted = self.clone();
        redacted.analysis.api_key = mask_secret(&self.analysis.api_key);
        redacted.documents.access_token = mask_secret(&self.documents.access_token);
        redacted
    }
}

fn require_non_empty(key: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Configuration(format!("{key} must not be empty")));
    }
    Ok(())
}

fn require_positive(key: &str, value: u32) -> Result<(), AppError> {
    if value == 0 {
        return Err(AppError::Configuration(format!(
            "{key} must be greater than 0"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
