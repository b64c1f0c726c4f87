use thiserror::Error;

#[derive(Debug, Error)]
pub enum FillError {
    #[error("fill configuration error: {0}")]
    Configuration(String),
}

pub type FillResult<T> = Result<T, FillError>;
