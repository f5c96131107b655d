use thiserror::Error;

pub type Result<T> = std::result::Result<T, FlattenError>;

/// Library error types.
#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("xml parse error: {0}")]
    Parse(String),

    #[error("xml render error: {0}")]
    Render(String),

    #[error("table conversion error: {0}")]
    Arrow(#[from] arrow2::error::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
