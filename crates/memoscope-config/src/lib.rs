//! Configuration loading and validation (`~/.config/memoscope/config.toml`).

pub mod config;
pub mod paths;
mod redact;

pub use config::{AnalysisConfig, AppConfig, DocumentsConfig, LedgerConfig, OutputConfig};
pub use redact::mask_secret;
