use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use memoscope_core::{ArtifactError, CredibilityAssessment, write_json_atomic};
use serde::{Deserialize, Serialize};

/// Persisted output of an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub analysis_metadata: AnalysisMetadata,
    pub user_analyses: BTreeMap<String, UserAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub timestamp: DateTime<Utc>,
    pub subject: String,
    pub model_used: String,
    pub total_users_analyzed: usize,
    /// Mean score over analyzed accounts; 0 when none were analyzed.
    pub average_credibility_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAnalysis {
    pub credibility_score: u8,
    pub explanation: String,
    pub analysis_details: AnalysisDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDetails {
    pub memo_count: usize,
    pub first_memo_date: DateTime<Utc>,
    pub last_memo_date: DateTime<Utc>,
    pub memo_timespan_days: i64,
}

impl From<CredibilityAssessment> for UserAnalysis {
    fn from(assessment: CredibilityAssessment) -> Self {
        let memo_timespan_days = assessment.timespan_days();
        Self {
            credibility_score: assessment.score,
            explanation: assessment.explanation,
            analysis_details: AnalysisDetails {
                memo_count: assessment.memo_count,
                first_memo_date: assessment.first_timestamp,
                last_memo_date: assessment.last_timestamp,
                memo_timespan_days,
            },
        }
    }
}

impl AnalysisReport {
    pub fn new(
        subject: &str,
        model: &str,
        assessments: BTreeMap<String, CredibilityAssessment>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let total = assessments.len();
        let score_sum: u64 = assessments.values().map(|a| u64::from(a.score)).sum();
        let average_credibility_score = if total == 0 {
            0.0
        } else {
            score_sum as f64 / total as f64
        };

        Self {
            analysis_metadata: AnalysisMetadata {
                timestamp,
                subject: subject.to_string(),
                model_used: model.to_string(),
                total_users_analyzed: total,
                average_credibility_score,
            },
            user_analyses: assessments
                .into_iter()
                .map(|(account, assessment)| (account, assessment.into()))
                .collect(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ArtifactError> {
        write_json_atomic(path, self)
    }
}
