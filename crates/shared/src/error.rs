use thiserror::Error;

pub const PARSE_FAILURE_MESSAGE: &str = "failed to parse server response";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("{prefix}: {0}", prefix = PARSE_FAILURE_MESSAGE)]
    Parse(String),
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
