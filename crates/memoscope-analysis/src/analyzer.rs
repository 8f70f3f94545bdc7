use std::collections::BTreeMap;
use std::sync::OnceLock;

use memoscope_core::{CredibilityAssessment, MemoRecord, UserMemoIndex};
use regex::Regex;
use tracing::{info, warn};

use crate::documents::{DocumentSource, expand_document_links};
use crate::error::AnalysisError;
use crate::llm_client::CompletionClient;

/// Assessment prompt for one account's memos, already link-expanded.
pub fn build_prompt(subject: &str, memos: &[String]) -> String {
    let combined = memos.join("\n---\n");
    format!(
        "Based on the following set of memos from a single user, assess their credibility \
regarding {subject}. Consider factors like:
- Quality and depth of analysis
- Consistency in their views
- Professional knowledge demonstrated
- Objectivity and lack of bias

Please provide:
1. A credibility score from 0-100
2. A brief explanation of the score

Recognize that what they are saying is very likely not directly related to {subject}.

User's memos:
{combined}"
    )
}

fn score_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\b[0-9]{1,3}\b").ok())
        .as_ref()
}

/// First standalone 1-3 digit number in `0..=100`; 0 when there is none.
pub fn extract_score(text: &str) -> u8 {
    let Some(pattern) = score_pattern() else {
        return 0;
    };
    pattern
        .find_iter(text)
        .filter_map(|found| found.as_str().parse::<u8>().ok())
        .find(|score| *score <= 100)
        .unwrap_or(0)
}

pub struct CredibilityAnalyzer {
    completion: Box<dyn CompletionClient>,
    documents: Box<dyn DocumentSource>,
}

impl CredibilityAnalyzer {
    pub fn new(completion: Box<dyn CompletionClient>, documents: Box<dyn DocumentSource>) -> Self {
        Self {
            completion,
            documents,
        }
    }

    pub fn model(&self) -> &str {
        self.completion.model()
    }

    /// Score one account from all of its memos.
    pub async fn analyze_user(
        &self,
        memos: &[MemoRecord],
        subject: &str,
    ) -> Result<CredibilityAssessment, AnalysisError> {
        let first_timestamp = memos
            .iter()
            .map(|memo| memo.timestamp)
            .min()
            .ok_or(AnalysisError::EmptyMemos)?;
        let last_timestamp = memos
            .iter()
            .map(|memo| memo.timestamp)
            .max()
            .ok_or(AnalysisError::EmptyMemos)?;

        let mut processed = Vec::with_capacity(memos.len());
        for memo in memos {
            processed.push(expand_document_links(&memo.memo_text, self.documents.as_ref()).await);
        }

        let explanation = self
            .completion
            .complete(&build_prompt(subject, &processed))
            .await?;
        Ok(CredibilityAssessment {
            score: extract_score(&explanation),
            explanation,
            memo_count: memos.len(),
            first_timestamp,
            last_timestamp,
        })
    }

    /// Analyze every account, skipping those whose analysis fails.
    pub async fn analyze_all(
        &self,
        index: &UserMemoIndex,
        subject: &str,
    ) -> BTreeMap<String, CredibilityAssessment> {
        let mut assessments = BTreeMap::new();
        for (position, (account, memos)) in index.iter().enumerate() {
            info!(
                account = %account,
                memos = memos.len(),
                progress = format!("{}/{}", position + 1, index.len()),
                "analyzing account"
            );
            match self.analyze_user(memos, subject).await {
                Ok(assessment) => {
                    assessments.insert(account.clone(), assessment);
                }
                Err(err) => {
                    warn!(account = %account, error = %err, "credibility analysis failed, skipping account");
                }
            }
        }
        assessments
    }
}

#[cfg(test)]
#[path = "analyzer_tests.rs"]
mod tests;
