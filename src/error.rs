//! Unified error types.

use thiserror::Error;

/// Errors from a single call to the portfolio endpoint.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Timeout")]
    Timeout,

    #[error("Malformed response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    /// `status.code == "1"`. Bad key, unknown wallet and other server-side
    /// rejections all arrive with this one code.
    #[error("Rejected by server: {text}")]
    Rejected { text: String },
}

impl ApiError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Transport(_) | ApiError::Timeout => FailureKind::Transport,
            ApiError::MalformedResponse(_) => FailureKind::MalformedResponse,
            ApiError::Rejected { .. } => FailureKind::Rejected,
        }
    }
}

/// Errors projecting a snapshot field into a typed value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("Field `{field}` has unexpected value {raw:?}")]
    ValueParse { field: &'static str, raw: String },
}

/// Invalid configuration values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("wallet name must not be empty")]
    EmptyWalletName,

    #[error("API key must not be empty")]
    EmptyApiKey,

    #[error("update interval must be at least {min} minutes, got {got}")]
    IntervalTooShort { min: u64, got: u64 },

    #[error("invalid value for `{key}`: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("missing `{0}`")]
    Missing(&'static str),
}

/// Errors activating an entry.
#[derive(Error, Debug, Clone)]
pub enum SetupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("credential check failed: {0}")]
    InvalidAuth(RefreshFailure),

    /// The first refresh failed; the entry is not activated.
    #[error("first refresh failed: {0}")]
    NotReady(RefreshFailure),
}

/// Coarse classification of a failed refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    MalformedResponse,
    Rejected,
    ValueParse,
    /// The refresh task ended without producing a result (runtime shutdown).
    Aborted,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::Transport => "transport",
            FailureKind::MalformedResponse => "malformed_response",
            FailureKind::Rejected => "rejected",
            FailureKind::ValueParse => "value_parse",
            FailureKind::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// Outcome of a failed refresh as seen by every waiter.
///
/// Cloneable so one in-flight refresh can hand the same result to all of
/// its callers.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}: {message}")]
pub struct RefreshFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<ApiError> for RefreshFailure {
    fn from(e: ApiError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

impl From<ProjectionError> for RefreshFailure {
    fn from(e: ProjectionError) -> Self {
        Self {
            kind: FailureKind::ValueParse,
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_kinds() {
        assert_eq!(ApiError::Timeout.kind(), FailureKind::Transport);
        let rejected = ApiError::Rejected {
            text: "bad key".to_string(),
        };
        assert_eq!(rejected.kind(), FailureKind::Rejected);
        let malformed: ApiError = serde_json::from_str::<serde_json::Value>("{\"a\":")
            .unwrap_err()
            .into();
        assert_eq!(malformed.kind(), FailureKind::MalformedResponse);
    }

    #[test]
    fn test_refresh_failure_keeps_message() {
        let failure = RefreshFailure::from(ApiError::Rejected {
            text: "bad key".to_string(),
        });
        assert_eq!(failure.kind, FailureKind::Rejected);
        assert_eq!(failure.message, "Rejected by server: bad key");
        assert_eq!(failure.to_string(), "rejected: Rejected by server: bad key");
    }

    #[test]
    fn test_projection_error_maps_to_value_parse() {
        let failure = RefreshFailure::from(ProjectionError::ValueParse {
            field: "zmianaW",
            raw: "n/a".to_string(),
        });
        assert_eq!(failure.kind, FailureKind::ValueParse);
    }
}
