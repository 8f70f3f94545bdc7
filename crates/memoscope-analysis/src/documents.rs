use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::AnalysisError;

const SERVICE: &str = "documents";

/// Fetches the plain text of a linked document by id.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch_document(&self, document_id: &str) -> Result<String, AnalysisError>;
}

/// Used when document expansion is disabled; links stay as they are.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDocumentSource;

#[async_trait]
impl DocumentSource for NoopDocumentSource {
    async fn fetch_document(&self, _document_id: &str) -> Result<String, AnalysisError> {
        Ok(String::new())
    }
}

/// Google Docs REST v1 reader authenticated with an OAuth bearer token.
pub struct GoogleDocsClient {
    base_url: String,
    access_token: String,
    client: reqwest::Client,
}

impl GoogleDocsClient {
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| AnalysisError::Transport {
                service: SERVICE,
                source,
            })?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            client,
        })
    }
}

#[async_trait]
impl DocumentSource for GoogleDocsClient {
    async fn fetch_document(&self, document_id: &str) -> Result<String, AnalysisError> {
        let url = format!("{}/documents/{document_id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|source| AnalysisError::Transport {
                service: SERVICE,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Document {
                document_id: document_id.to_string(),
                reason: format!("HTTP {status}"),
            });
        }
        let document: GoogleDocument =
            response
                .json()
                .await
                .map_err(|e| AnalysisError::MalformedResponse {
                    service: SERVICE,
                    reason: e.to_string(),
                })?;
        Ok(document.plain_text())
    }
}

#[derive(Debug, Default, Deserialize)]
struct GoogleDocument {
    #[serde(default)]
    body: Option<DocumentBody>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentBody {
    #[serde(default)]
    content: Vec<StructuralElement>,
}

#[derive(Debug, Default, Deserialize)]
struct StructuralElement {
    #[serde(default)]
    paragraph: Option<Paragraph>,
}

#[derive(Debug, Default, Deserialize)]
struct Paragraph {
    #[serde(default)]
    elements: Vec<ParagraphElement>,
}

#[derive(Debug, Default, Deserialize)]
struct ParagraphElement {
    #[serde(rename = "textRun", default)]
    text_run: Option<TextRun>,
}

#[derive(Debug, Default, Deserialize)]
struct TextRun {
    #[serde(default)]
    content: String,
}

impl GoogleDocument {
    /// Concatenated text runs of all top-level paragraphs.
    fn plain_text(&self) -> String {
        self.body
            .iter()
            .flat_map(|body| &body.content)
            .filter_map(|element| element.paragraph.as_ref())
            .flat_map(|paragraph| &paragraph.elements)
            .filter_map(|element| element.text_run.as_ref())
            .map(|run| run.content.as_str())
            .collect()
    }
}

fn document_link_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"https://docs\.google\.com/document/\S+").ok())
        .as_ref()
}

/// Document id from a share URL: the path segment after `/d/`.
pub fn extract_document_id(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("/d/")?;
    let id = rest.split(['/', '?', '#']).next()?;
    (!id.is_empty()).then_some(id)
}

/// Replace every Google Docs link in `memo` with the document's text.
///
/// Links whose id cannot be extracted, whose fetch fails, or whose text is
/// empty are left untouched.
pub async fn expand_document_links(memo: &str, documents: &dyn DocumentSource) -> String {
    let Some(pattern) = document_link_pattern() else {
        return memo.to_string();
    };

    let mut urls: Vec<&str> = Vec::new();
    for found in pattern.find_iter(memo) {
        if !urls.contains(&found.as_str()) {
            urls.push(found.as_str());
        }
    }

    let mut expanded = memo.to_string();
    for url in urls {
        let Some(document_id) = extract_document_id(url) else {
            warn!(url, "could not extract document id from link");
            continue;
        };
        match documents.fetch_document(document_id).await {
            Ok(text) if !text.is_empty() => {
                expanded =
                    expanded.replace(url, &format!("\n--- Google Doc Content ---\n{text}\n---"));
            }
            Ok(_) => debug!(document_id, "linked document is empty"),
            Err(err) => warn!(document_id, error = %err, "failed to fetch linked document"),
        }
    }
    expanded
}
