use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphiteError {
    #[error("empty target")]
    EmptyTarget,

    #[error("invalid comparator")]
    InvalidComparator,

    #[error("invalid value for comparator")]
    InvalidThreshold,

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request ended with status {status}: {body}")]
    BackendStatus { status: u16, body: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cannot encode series: {0}")]
    Unencodable(String),

    #[error("failed to write output: {0}")]
    Output(String),
}

impl GraphiteError {
    /// Whether a fresh attempt with the same input may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            GraphiteError::Transport(_) => true,
            GraphiteError::BackendStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Short label used for the failure counter.
    pub fn kind(&self) -> &'static str {
        match self {
            GraphiteError::EmptyTarget => "empty_target",
            GraphiteError::InvalidComparator => "invalid_comparator",
            GraphiteError::InvalidThreshold => "invalid_threshold",
            GraphiteError::MalformedResponse(_) => "malformed_response",
            GraphiteError::Transport(_) => "transport",
            GraphiteError::BackendStatus { .. } => "backend_status",
            GraphiteError::InvalidConfig(_) => "invalid_config",
            GraphiteError::Unencodable(_) => "unencodable",
            GraphiteError::Output(_) => "output",
        }
    }

    /// Failure to serialize a result for printing.
    pub fn output(err: serde_json::Error) -> Self {
        GraphiteError::Output(err.to_string())
    }
}

impl From<serde_json::Error> for GraphiteError {
    fn from(err: serde_json::Error) -> Self {
        GraphiteError::MalformedResponse(err.to_string())
    }
}

impl From<prost::DecodeError> for GraphiteError {
    fn from(err: prost::DecodeError) -> Self {
        GraphiteError::MalformedResponse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GraphiteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(!GraphiteError::InvalidThreshold.is_retryable());
        assert!(!GraphiteError::MalformedResponse("x".into()).is_retryable());
        assert!(GraphiteError::BackendStatus { status: 503, body: String::new() }.is_retryable());
        assert!(!GraphiteError::BackendStatus { status: 400, body: String::new() }.is_retryable());
    }

    #[test]
    fn test_backend_status_message() {
        let err = GraphiteError::BackendStatus {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "request ended with status 500: boom");
        assert_eq!(err.kind(), "backend_status");
    }

    #[test]
    fn test_json_error_is_malformed() {
        let err: GraphiteError = serde_json::from_str::<Vec<u8>>("{").unwrap_err().into();
        assert!(matches!(err, GraphiteError::MalformedResponse(_)));
    }

    #[test]
    fn test_output_error_is_not_a_decode_failure() {
        let json_err = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
        let err = GraphiteError::output(json_err);
        assert!(matches!(err, GraphiteError::Output(_)), "got {err}");
        assert_eq!(err.kind(), "output");
        assert!(err.to_string().starts_with("failed to write output: "));
        assert!(!err.is_retryable());
    }
}
