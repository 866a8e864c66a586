//! Error types for the Dataset ID API.

use thiserror::Error;

/// Result type alias for service setup and infrastructure.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors raised while configuring or running the service itself.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Server startup error.
    #[error("Server error: {0}")]
    Server(String),

    /// Upstream HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Why one upstream request produced no usable envelope.
///
/// These never propagate past the upstream client: callers only see an
/// absent envelope and skip the branch.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Connection failure, timeout or other transport problem.
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// Upstream answered with a non-2xx status.
    #[error("upstream returned status {status}")]
    Status { status: u16 },

    /// Body was not valid JSON.
    #[error("invalid JSON body: {0}")]
    Parse(#[source] serde_json::Error),
}

impl UpstreamError {
    /// Short label used for log fields and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Status { .. } => "status",
            Self::Parse(_) => "parse",
        }
    }
}

/// Reportable outcomes of an aggregation run other than success.
///
/// Each variant maps onto the domain `code` and `msg` of the response
/// envelope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregateError {
    /// The level-1 catalog request failed outright.
    #[error("cannot reach data source")]
    SourceUnreachable,

    /// Level-1 answered but yielded no ids.
    #[error("no valid level-1 ids")]
    NoLevelOneIds,

    /// Every level-1 id was visited and no level-2 id came back.
    #[error("no valid level-2 data")]
    NoLevelTwoData,

    /// Anything unexpected during the run.
    #[error("internal server error: {0}")]
    Internal(String),
}

impl AggregateError {
    /// Domain status carried in the envelope `code` field.
    pub fn code(&self) -> u16 {
        match self {
            Self::SourceUnreachable | Self::Internal(_) => 500,
            Self::NoLevelOneIds | Self::NoLevelTwoData => 404,
        }
    }
}
