pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Fatal error classes surfaced to the process boundary.
///
/// Malformed memo payloads and single-item service failures are recovered
/// where they happen and never reach this type.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Ledger ingestion aborted")]
    Transport(#[source] BoxError),

    #[error("External service '{service}' unavailable: {message}")]
    ExternalService { service: String, message: String },
}

impl AppError {
    /// Process exit code for this error class.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 2,
            Self::Transport(_) => 3,
            Self::ExternalService { .. } => 4,
        }
    }

    /// Find the first `AppError` in an error chain.
    pub fn find_in<'a>(err: &'a (dyn std::error::Error + 'static)) -> Option<&'a AppError> {
        let mut current = Some(err);
        while let Some(e) = current {
            if let Some(app) = e.downcast_ref::<AppError>() {
                return Some(app);
            }
            current = e.source();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_configuration() {
        let err = AppError::Configuration("ledger.window_size must be greater than 0".into());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: ledger.window_size must be greater than 0"
        );
    }

    #[test]
    fn test_display_transport_keeps_source() {
        let inner = std::io::Error::other("connection reset");
        let err = AppError::Transport(Box::new(inner));
        assert_eq!(err.to_string(), "Ledger ingestion aborted");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("connection reset"));
    }

    #[test]
    fn test_display_external_service() {
        let err = AppError::ExternalService {
            service: "completion".into(),
            message: "every analysis request failed".into(),
        };
        assert_eq!(
            err.to_string(),
            "External service 'completion' unavailable: every analysis request failed"
        );
    }

    #[test]
    fn test_exit_codes_are_distinct_and_nonzero() {
        let codes = [
            AppError::Configuration(String::new()).exit_code(),
            AppError::Transport(Box::new(std::io::Error::other("x"))).exit_code(),
            AppError::ExternalService {
                service: String::new(),
                message: String::new(),
            }
            .exit_code(),
        ];
        assert!(codes.iter().all(|code| *code != 0));
        assert_ne!(codes[0], codes[1]);
        assert_ne!(codes[1], codes[2]);
    }

    #[test]
    fn test_find_in_walks_source_chain() {
        #[derive(Debug, thiserror::Error)]
        #[error("outer")]
        struct Outer(#[source] AppError);

        let err = Outer(AppError::Configuration("missing api key".into()));
        let found = AppError::find_in(&err).expect("AppError in chain");
        assert_eq!(found.exit_code(), 2);
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AppError>();
    }
}
