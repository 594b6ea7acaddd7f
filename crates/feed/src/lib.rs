use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use configuration::settings::Feed as FeedSettings;
use core_types::Kline;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

pub mod error;
pub mod poller;

// --- Public API ---
pub use error::FeedError;
pub use poller::FeedPoller;

/// The generic, abstract interface for a market data source.
///
/// The poller only needs recent candles, so this is the entire contract.
/// Having a trait here lets the integration layer swap the REST client for
/// a canned source in tests.
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Fetches the most recent klines for a symbol, oldest first.
    async fn fetch_recent_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: u16,
    ) -> Result<Vec<Kline>, FeedError>;
}

/// A concrete `MarketDataClient` for a Binance-compatible public kline endpoint.
///
/// Everything this crate requests is public market data, so no request
/// signing or API keys are involved.
#[derive(Clone)]
pub struct BinanceClient {
    client: reqwest::Client,
    base_url: String,
}

impl BinanceClient {
    pub fn new(settings: &FeedSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        }
    }
}

// Intermediate struct for deserializing klines from the Binance API.
// The payload is a JSON array of arrays; numeric fields arrive as strings.
#[derive(Deserialize)]
struct RawKline(i64, String, String, String, String, String, i64, String, i64, String, String, String);

impl RawKline {
    fn into_kline(self, interval: &str) -> Result<Kline, FeedError> {
        let parse = |field: &str, value: &str| {
            Decimal::from_str(value).map_err(|e| {
                FeedError::Deserialization(format!("Invalid {} '{}': {}", field, value, e))
            })
        };

        Ok(Kline {
            open_time: Utc
                .timestamp_millis_opt(self.0)
                .single()
                .ok_or_else(|| FeedError::InvalidData(format!("Invalid open_time: {}", self.0)))?,
            open: parse("open", &self.1)?,
            high: parse("high", &self.2)?,
            low: parse("low", &self.3)?,
            close: parse("close", &self.4)?,
            volume: parse("volume", &self.5)?,
            close_time: Utc
                .timestamp_millis_opt(self.6)
                .single()
                .ok_or_else(|| FeedError::InvalidData(format!("Invalid close_time: {}", self.6)))?,
            interval: interval.to_string(),
        })
    }
}

#[async_trait]
impl MarketDataClient for BinanceClient {
    async fn fetch_recent_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: u16,
    ) -> Result<Vec<Kline>, FeedError> {
        let url = format!("{}/api/v3/klines", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("interval", interval),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<RawKline>>()
            .await?;

        let klines = response
            .into_iter()
            .map(|raw| raw.into_kline(interval))
            .collect::<Result<Vec<Kline>, FeedError>>()?;

        if klines.is_empty() {
            return Err(FeedError::Empty(symbol.to_string()));
        }

        Ok(klines)
    }
}
