use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiskError {
    #[error("risk configuration error: {0}")]
    Configuration(String),
}

pub type RiskResult<T> = Result<T, RiskError>;
