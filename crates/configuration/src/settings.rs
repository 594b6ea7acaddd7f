use crate::error::ConfigError;
use rust_decimal::Decimal;
use serde::Deserialize;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub pair: Pair,
    pub account: Account,
    pub feed: Feed,
}

impl Config {
    /// Rejects configurations the simulator cannot start from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.account.initial_quote <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "account.initial_quote must be positive".to_string(),
            ));
        }
        if self.feed.poll_secs == 0 {
            return Err(ConfigError::ValidationError(
                "feed.poll_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Identifies the single instrument the simulator trades.
#[derive(Debug, Clone, Deserialize)]
pub struct Pair {
    /// The exchange symbol used when requesting market data (e.g., "BTCUSDT").
    pub symbol: String,
    /// The asset being bought and sold (e.g., "BTC").
    pub base_asset: String,
    /// The currency the account is denominated in (e.g., "USDT").
    pub quote_asset: String,
}

impl Pair {
    /// The human-readable pair label shown on orders, e.g. "BTC/USDT".
    pub fn label(&self) -> String {
        format!("{}/{}", self.base_asset, self.quote_asset)
    }
}

/// The seed allocation for the virtual account.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    /// Quote currency the account starts with. The base-asset side always
    /// starts at zero.
    pub initial_quote: Decimal,
}

/// Contains parameters for the market data poller.
#[derive(Debug, Clone, Deserialize)]
pub struct Feed {
    /// Base URL of the candle REST endpoint.
    pub base_url: String,
    /// The timeframe interval to request (e.g., "1m").
    pub interval: String,
    /// Seconds between polls for a fresh price.
    pub poll_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn valid_config() -> Config {
        Config {
            pair: Pair {
                symbol: "BTCUSDT".to_string(),
                base_asset: "BTC".to_string(),
                quote_asset: "USDT".to_string(),
            },
            account: Account {
                initial_quote: Decimal::from(10000),
            },
            feed: Feed {
                base_url: "https://api.binance.com".to_string(),
                interval: "1m".to_string(),
                poll_secs: 5,
            },
        }
    }

    #[test]
    fn pair_label_joins_assets() {
        assert_eq!(valid_config().pair.label(), "BTC/USDT");
    }

    #[test]
    fn validate_rejects_unusable_settings() {
        assert!(valid_config().validate().is_ok());

        let mut broke = valid_config();
        broke.account.initial_quote = Decimal::ZERO;
        assert!(broke.validate().is_err());

        let mut stalled = valid_config();
        stalled.feed.poll_secs = 0;
        assert!(stalled.validate().is_err());
    }
}
