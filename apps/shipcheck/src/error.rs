//! Typed errors for configuration, child processes, and webhook delivery.

use thiserror::Error;

#[derive(Debug, Error)]
/// Fatal configuration problems, reported before any process or network work.
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    MissingEnv(&'static str),
}

#[derive(Debug, Error)]
/// Failures while running an external command.
pub enum RunError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Command timed out after {0}s")]
    TimedOut(u64),
    #[error("wait for `{program}` failed: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("output capture failed: {0}")]
    Capture(#[from] std::io::Error),
}

#[derive(Debug, Error)]
/// Failures that prevent a webhook post from producing an HTTP response.
pub enum NotifyError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),
}
