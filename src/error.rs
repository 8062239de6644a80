use thiserror::Error;

/// Configuration-related errors with structured variants.
///
/// Raised at construction time only; a component that accepted its
/// configuration never fails later because of it.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Failure to establish a new connection.
///
/// Never fatal to the pool: the slot stays empty and the next health check
/// retries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DialError {
    #[error("connection refused: {0}")]
    Refused(String),

    #[error("transport setup failed: {0}")]
    Transport(String),
}

/// Stage-composition errors.
///
/// These indicate a wiring defect (a receiver dropped while its upstream was
/// still producing, a stage task that panicked) rather than a runtime
/// condition to recover from.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("stage '{stage}' sent into a channel whose receiver is gone")]
    DownstreamClosed { stage: &'static str },

    #[error("stage '{stage}' aborted: {reason}")]
    StageAborted { stage: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dial(#[from] DialError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for DialError {
    fn from(err: reqwest::Error) -> Self {
        DialError::Transport(err.to_string())
    }
}
