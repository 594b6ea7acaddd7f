use crate::MarketDataClient;
use core_types::Kline;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Polls the candle endpoint on a fixed cadence and forwards the latest
/// kline to the engine integration over a channel.
///
/// The engine only ever consumes the scalar close price; the full kline is
/// forwarded so the integration layer can also log candle context. Retry
/// policy lives entirely here: a failed poll is logged and the next cycle
/// tries again, so a flaky endpoint never reaches the engine as anything
/// other than silence.
pub struct FeedPoller {
    client: Arc<dyn MarketDataClient>,
    symbol: String,
    interval: String,
    poll_every: Duration,
}

impl FeedPoller {
    pub fn new(
        client: Arc<dyn MarketDataClient>,
        symbol: impl Into<String>,
        interval: impl Into<String>,
        poll_secs: u64,
    ) -> Self {
        Self {
            client,
            symbol: symbol.into(),
            interval: interval.into(),
            poll_every: Duration::from_secs(poll_secs),
        }
    }

    /// Spawns the polling task and returns a channel Receiver of klines.
    ///
    /// The task stops on its own once the receiver is dropped.
    pub fn subscribe(self) -> mpsc::Receiver<Kline> {
        let (tx, rx) = mpsc::channel(1024);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.poll_every);

            loop {
                ticker.tick().await;

                match self
                    .client
                    .fetch_recent_klines(&self.symbol, &self.interval, 2)
                    .await
                {
                    Ok(klines) => {
                        // The last row is the most recent candle; its close is
                        // the latest traded price.
                        if let Some(kline) = klines.into_iter().last() {
                            tracing::debug!(
                                symbol = %self.symbol,
                                close = %kline.close,
                                "Fetched market price."
                            );
                            if tx.send(kline).await.is_err() {
                                tracing::info!("Feed receiver dropped. Stopping poller.");
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Feed poll failed. Retrying next cycle.");
                    }
                }
            }
        });

        rx
    }
}
