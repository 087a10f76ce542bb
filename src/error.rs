use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("unauthorized: invalid trigger secret")]
    Unauthorized,
    #[error("validation error: {0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("email dispatch failed: {0}")]
    EmailDispatch(String),
    #[error("payment gateway error: {0}")]
    Gateway(String),
}

pub type Result<T> = std::result::Result<T, BillingError>;
