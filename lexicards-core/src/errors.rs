use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("invalid input: {0}")]
    Invalid(&'static str),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid card state: {0}")]
    InvalidState(String),
    #[error("storage error: {0}")]
    Storage(&'static str),
}
