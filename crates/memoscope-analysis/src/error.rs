use std::time::Duration;

/// Failures talking to the completion or document services.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("{service} request failed")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("completion service returned HTTP {status}: {body}")]
    Completion { status: u16, body: String },

    #[error("completion service is rate limited{}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    #[error("malformed {service} response: {reason}")]
    MalformedResponse {
        service: &'static str,
        reason: String,
    },

    #[error("document {document_id} unavailable: {reason}")]
    Document { document_id: String, reason: String },

    #[error("no memos to analyze")]
    EmptyMemos,
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(wait) => format!(" (retry after {}s)", wait.as_secs()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_display() {
        let err = AnalysisError::RateLimited {
            retry_after: Some(Duration::from_secs(30)),
        };
        assert_eq!(
            err.to_string(),
            "completion service is rate limited (retry after 30s)"
        );
        let err = AnalysisError::RateLimited { retry_after: None };
        assert_eq!(err.to_string(), "completion service is rate limited");
    }

    #[test]
    fn test_document_display() {
        let err = AnalysisError::Document {
            document_id: "abc".into(),
            reason: "HTTP 404".into(),
        };
        assert_eq!(err.to_string(), "document abc unavailable: HTTP 404");
    }
}
