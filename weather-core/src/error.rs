use thiserror::Error;

/// Why a call to the weather provider produced no reply.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("weather provider did not answer in time")]
    Timeout,

    #[error("could not reach weather provider: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected failure calling weather provider: {0}")]
    Unexpected(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_builder() {
            FetchError::Unexpected(err.to_string())
        } else {
            FetchError::Transport(err)
        }
    }
}
