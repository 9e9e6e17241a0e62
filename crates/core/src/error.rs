use thiserror::Error;

pub type Result<T> = std::result::Result<T, PricingError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("item not found: {0}")]
    NotFound(String),
}

impl PricingError {
    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::InvalidInput(detail.into())
    }
}
