use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Insufficient {asset} balance. Required: {required}, Available: {available}")]
    InsufficientFunds {
        asset: String,
        required: Decimal,
        available: Decimal,
    },

    #[error("Invalid order parameters: {0}")]
    InvalidOrder(String),

    #[error("No market price has been received yet; market orders are unavailable.")]
    PriceUnavailable,
}
