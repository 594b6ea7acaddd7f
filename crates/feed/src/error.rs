use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Failed to fetch market data: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to deserialize the market data response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from the feed: {0}")]
    InvalidData(String),

    #[error("The feed returned no klines for symbol: {0}")]
    Empty(String),
}
