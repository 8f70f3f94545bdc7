//! Credibility stage: expands document links in memos, asks a completion
//! model for a 0-100 score per account and assembles the report artifact.

pub mod analyzer;
pub mod documents;
pub mod error;
pub mod llm_client;
pub mod report;

pub use analyzer::{CredibilityAnalyzer, build_prompt, extract_score};
pub use documents::{
    DocumentSource, GoogleDocsClient, NoopDocumentSource, expand_document_links,
    extract_document_id,
};
pub use error::AnalysisError;
pub use llm_client::{ApiClient, CompletionClient};
pub use report::{AnalysisMetadata, AnalysisReport, UserAnalysis};
