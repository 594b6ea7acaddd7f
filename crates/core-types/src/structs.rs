use crate::enums::{OrderKind, OrderSide, OrderStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The virtual holdings of the simulated account.
///
/// `quote` is the quote-currency amount available for buying, `base` the
/// asset amount available for selling. Funds reserved by open orders have
/// already been debited from here, so both fields are always >= 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub quote: Decimal,
    pub base: Decimal,
}

impl Balance {
    /// Creates the seed allocation: a starting quote amount and no base asset.
    pub fn new(initial_quote: Decimal) -> Self {
        Self {
            quote: initial_quote,
            base: Decimal::ZERO,
        }
    }
}

/// Represents a single candlestick (kline) of market data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kline {
    pub open_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub close_time: DateTime<Utc>,
    pub interval: String,
}

/// A single simulated trading intent.
///
/// Every field except `status` is frozen at creation time. In particular
/// `notional` (`quantity * limit_price`) is the exact quote amount that was
/// reserved or paid when the order was placed, independent of any later
/// price moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    /// Display label for the traded instrument, e.g. "BTC/USDT".
    pub pair: String,
    pub kind: OrderKind,
    pub side: OrderSide,
    /// For `Limit` orders the price the order is willing to transact at.
    /// For `Market` orders the execution price at creation time.
    pub limit_price: Decimal,
    /// Base-asset amount requested. Never partially reduced.
    pub quantity: Decimal,
    /// `quantity * limit_price`, computed once at creation.
    pub notional: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new resting order in the `Open` state.
    pub fn new(
        pair: String,
        kind: OrderKind,
        side: OrderSide,
        quantity: Decimal,
        limit_price: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            pair,
            kind,
            side,
            limit_price,
            quantity,
            notional: quantity * limit_price,
            status: OrderStatus::Open,
            created_at: Utc::now(),
        }
    }

    /// The filled fraction as shown in order tables. With no partial fills
    /// in the simulation this is binary.
    pub fn filled_display(&self) -> &'static str {
        match self.status {
            OrderStatus::Filled => "100.00%",
            _ => "0.00%",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn notional_is_frozen_at_creation() {
        let order = Order::new(
            "BTC/USDT".to_string(),
            OrderKind::Limit,
            OrderSide::Buy,
            dec!(0.1),
            dec!(50000),
        );
        assert_eq!(order.notional, dec!(5000.0));
        assert_eq!(order.status, OrderStatus::Open);
        assert_eq!(order.filled_display(), "0.00%");
    }

    #[test]
    fn seed_balance_has_no_base_asset() {
        let balance = Balance::new(dec!(10000));
        assert_eq!(balance.quote, dec!(10000));
        assert_eq!(balance.base, Decimal::ZERO);
    }
}
