use std::time::Duration;

use thiserror::Error;

/// Failures while consuming a generation stream. All of them are retryable
/// from the student's point of view.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum StreamError {
    #[error("the tutor's response could not be decoded: {0}")]
    Decode(String),

    #[error("the tutor backend failed mid-stream: {0}")]
    Transport(String),

    #[error("the tutor did not finish responding within {0:?}")]
    Timeout(Duration),
}

impl StreamError {
    pub fn is_transport(&self) -> bool {
        return matches!(self, StreamError::Transport(_) | StreamError::Timeout(_));
    }
}

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("response is missing required field `{0}`")]
    MissingField(&'static str),
}

impl From<ValidationError> for StreamError {
    fn from(err: ValidationError) -> StreamError {
        return StreamError::Decode(err.to_string());
    }
}

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum LedgerError {
    #[error("honey amounts must be at least 1, got {0}")]
    InvalidAmount(u32),

    #[error("not enough honey: {amount} requested, {balance} available")]
    Insufficient { amount: u32, balance: u32 },
}
