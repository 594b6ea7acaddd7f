//! # Papertrade Engine Crate
//!
//! This crate provides the order-matching and balance-settlement core of the
//! paper-trading simulator. It defines the `PaperEngine` aggregate, which is
//! the single source of truth for the virtual account balance, the order
//! collection, and the last-known market price, plus an `EngineHandle` for
//! sharing the aggregate across async tasks.
//!
//! ## Architectural Principles
//!
//! - **One aggregate, one writer:** `place_order`, `cancel_order` and
//!   `on_price_update` are synchronous `&mut self` methods. Validation and
//!   reservation happen inside the same call, so a balance check can never
//!   race the reservation it guards. Cross-task access goes through
//!   `EngineHandle`, which serializes every command under a single mutex.
//! - **Frozen economics:** an order's `notional` is computed once at
//!   placement and is the exact amount moved on fill or cancel. The tick
//!   price that triggers a fill never changes what a fill pays out.
//!
//! ## Public API
//!
//! - `PaperEngine`: the account + order book state machine.
//! - `EngineHandle`: the clone-able, thread-safe wrapper for async contexts.
//! - `EngineError`: the specific error types that can be returned from this crate.

use core_types::{Balance, Order, OrderKind, OrderSide, OrderStatus};
use rust_decimal::Decimal;
use uuid::Uuid;

// Declare the modules that constitute this crate.
pub mod error;
pub mod handle;

// Re-export the key components to provide a clean, public-facing API.
pub use error::EngineError;
pub use handle::EngineHandle;

/// Manages the state of the simulated trading account: balance, orders and
/// the last-known market price.
///
/// Its sole responsibility is to keep one invariant intact: funds held in
/// the balance plus funds reserved by open orders never exceed what the
/// account owns. Every mutation either completes fully or leaves the state
/// untouched.
#[derive(Debug)]
pub struct PaperEngine {
    base_asset: String,
    quote_asset: String,
    pair: String,
    balance: Balance,
    orders: Vec<Order>,
    /// `None` until the first tick arrives. Market orders are rejected
    /// while the price is unknown.
    last_price: Option<Decimal>,
}

impl PaperEngine {
    /// Creates a new engine seeded with `initial_quote` of the quote
    /// currency and zero base asset.
    pub fn new(
        base_asset: impl Into<String>,
        quote_asset: impl Into<String>,
        initial_quote: Decimal,
    ) -> Self {
        let base_asset = base_asset.into();
        let quote_asset = quote_asset.into();
        let pair = format!("{}/{}", base_asset, quote_asset);

        Self {
            base_asset,
            quote_asset,
            pair,
            balance: Balance::new(initial_quote),
            orders: Vec::new(),
            last_price: None,
        }
    }

    // --- Read surface ---

    pub fn balance(&self) -> Balance {
        self.balance
    }

    /// All orders ever placed, in insertion order. Callers filter by status
    /// and reverse for newest-first display.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn last_price(&self) -> Option<Decimal> {
        self.last_price
    }

    pub fn pair(&self) -> &str {
        &self.pair
    }

    // --- Commands ---

    /// Places a new order against the virtual balance.
    ///
    /// Validation and reservation are one step: the relevant balance side is
    /// checked and debited before the order exists, so no two orders can be
    /// funded by the same money. `Market` orders execute immediately at the
    /// last-known price; `Limit` orders rest as `Open` with their notional
    /// (Buy) or quantity (Sell) held in escrow until they fill or are
    /// canceled.
    pub fn place_order(
        &mut self,
        kind: OrderKind,
        side: OrderSide,
        quantity: Decimal,
        limit_price: Option<Decimal>,
    ) -> Result<Order, EngineError> {
        if quantity <= Decimal::ZERO {
            return Err(EngineError::InvalidOrder(
                "order quantity must be positive".to_string(),
            ));
        }

        // Resolve the execution price. A resting order transacts at its own
        // limit price; a market order transacts at the latest tick.
        let execution_price = match kind {
            OrderKind::Limit => match limit_price {
                Some(price) if price > Decimal::ZERO => price,
                Some(_) => {
                    return Err(EngineError::InvalidOrder(
                        "limit price must be positive".to_string(),
                    ));
                }
                None => {
                    return Err(EngineError::InvalidOrder(
                        "limit order requires a limit price".to_string(),
                    ));
                }
            },
            // The single source of truth for a market execution is the last
            // value accepted by `on_price_update`. Any supplied price is
            // ignored.
            OrderKind::Market => self
                .last_price
                .filter(|price| *price > Decimal::ZERO)
                .ok_or(EngineError::PriceUnavailable)?,
        };

        let notional = quantity * execution_price;

        // Check-and-reserve. Failure must leave the balance untouched.
        match side {
            OrderSide::Buy => {
                if self.balance.quote < notional {
                    return Err(EngineError::InsufficientFunds {
                        asset: self.quote_asset.clone(),
                        required: notional,
                        available: self.balance.quote,
                    });
                }
                self.balance.quote -= notional;
            }
            OrderSide::Sell => {
                if self.balance.base < quantity {
                    return Err(EngineError::InsufficientFunds {
                        asset: self.base_asset.clone(),
                        required: quantity,
                        available: self.balance.base,
                    });
                }
                self.balance.base -= quantity;
            }
        }

        let mut order = Order::new(self.pair.clone(), kind, side, quantity, execution_price);

        if kind == OrderKind::Market {
            // Immediate execution: the reservation and the fill are the same
            // step, so credit the opposite side right away.
            order.status = OrderStatus::Filled;
            match side {
                OrderSide::Buy => self.balance.base += quantity,
                OrderSide::Sell => self.balance.quote += notional,
            }
        }

        tracing::info!(
            id = %order.id,
            kind = ?order.kind,
            side = ?order.side,
            quantity = %order.quantity,
            price = %order.limit_price,
            status = ?order.status,
            "Order placed."
        );

        self.orders.push(order.clone());
        Ok(order)
    }

    /// Records a new market price and fills every open order whose
    /// condition it meets.
    ///
    /// A Buy fills when the market has come down to or below its limit
    /// price; a Sell fills when the market has risen to or above it. Fills
    /// credit the opposite balance side using the order's frozen
    /// notional/quantity, never the triggering tick. All deltas from one
    /// tick are applied as a single combined balance update.
    ///
    /// Returns the orders that filled on this tick.
    pub fn on_price_update(&mut self, price: Decimal) -> Vec<Order> {
        if price <= Decimal::ZERO {
            // The feed is assumed reliable; a non-positive price is a feed
            // fault and must not poison the last-known price.
            tracing::warn!(%price, "Ignoring non-positive price tick.");
            return Vec::new();
        }

        self.last_price = Some(price);

        let mut quote_credit = Decimal::ZERO;
        let mut base_credit = Decimal::ZERO;
        let mut filled = Vec::new();

        for order in self
            .orders
            .iter_mut()
            .filter(|order| order.status == OrderStatus::Open)
        {
            let crossed = match order.side {
                OrderSide::Buy => price <= order.limit_price,
                OrderSide::Sell => price >= order.limit_price,
            };
            if !crossed {
                continue;
            }

            order.status = OrderStatus::Filled;
            match order.side {
                OrderSide::Buy => base_credit += order.quantity,
                OrderSide::Sell => quote_credit += order.notional,
            }
            filled.push(order.clone());
        }

        if !filled.is_empty() {
            self.balance.quote += quote_credit;
            self.balance.base += base_credit;

            for order in &filled {
                tracing::info!(
                    id = %order.id,
                    side = ?order.side,
                    limit_price = %order.limit_price,
                    tick = %price,
                    "Limit order filled."
                );
            }
        }

        filled
    }

    /// Cancels a resting order and releases its reservation.
    ///
    /// Unknown ids and orders that are no longer `Open` are a silent no-op
    /// returning `None`; a double cancel therefore has the same observable
    /// effect as a single one.
    pub fn cancel_order(&mut self, id: Uuid) -> Option<Order> {
        let order = self
            .orders
            .iter_mut()
            .find(|order| order.id == id && !order.status.is_terminal())?;

        order.status = OrderStatus::Canceled;

        // Exactly reverse the debit made at placement time.
        match order.side {
            OrderSide::Buy => self.balance.quote += order.notional,
            OrderSide::Sell => self.balance.base += order.quantity,
        }

        tracing::info!(id = %order.id, "Order canceled, reservation released.");
        Some(order.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn engine_with_price(price: Decimal) -> PaperEngine {
        let mut engine = PaperEngine::new("BTC", "USDT", dec!(10000));
        engine.on_price_update(price);
        engine
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let mut engine = engine_with_price(dec!(40000));
        let result = engine.place_order(
            OrderKind::Limit,
            OrderSide::Buy,
            dec!(0),
            Some(dec!(40000)),
        );
        assert!(matches!(result, Err(EngineError::InvalidOrder(_))));
        assert_eq!(engine.balance().quote, dec!(10000));
        assert!(engine.orders().is_empty());
    }

    #[test]
    fn rejects_limit_order_without_price() {
        let mut engine = engine_with_price(dec!(40000));
        let result = engine.place_order(OrderKind::Limit, OrderSide::Buy, dec!(0.1), None);
        assert!(matches!(result, Err(EngineError::InvalidOrder(_))));
    }

    #[test]
    fn rejects_market_order_before_first_tick() {
        let mut engine = PaperEngine::new("BTC", "USDT", dec!(10000));
        let result = engine.place_order(OrderKind::Market, OrderSide::Buy, dec!(0.1), None);
        assert!(matches!(result, Err(EngineError::PriceUnavailable)));
        assert_eq!(engine.balance().quote, dec!(10000));
    }

    #[test]
    fn market_order_ignores_supplied_price() {
        let mut engine = engine_with_price(dec!(40000));
        let order = engine
            .place_order(
                OrderKind::Market,
                OrderSide::Buy,
                dec!(0.1),
                Some(dec!(99999)),
            )
            .unwrap();
        // Executed at the last tick, not the supplied price.
        assert_eq!(order.limit_price, dec!(40000));
        assert_eq!(order.notional, dec!(4000.0));
    }

    #[test]
    fn status_never_leaves_a_terminal_state() {
        let mut engine = engine_with_price(dec!(40000));
        let order = engine
            .place_order(
                OrderKind::Limit,
                OrderSide::Buy,
                dec!(0.1),
                Some(dec!(39000)),
            )
            .unwrap();

        engine.on_price_update(dec!(38000));
        assert_eq!(engine.orders()[0].status, OrderStatus::Filled);

        // Neither a cancel nor further ticks may touch a filled order.
        assert!(engine.cancel_order(order.id).is_none());
        engine.on_price_update(dec!(37000));
        assert_eq!(engine.orders()[0].status, OrderStatus::Filled);
        assert_eq!(engine.orders().len(), 1);
    }

    #[test]
    fn non_positive_tick_is_ignored() {
        let mut engine = engine_with_price(dec!(40000));
        engine.on_price_update(dec!(0));
        assert_eq!(engine.last_price(), Some(dec!(40000)));
    }

    #[test]
    fn conservation_of_funds_across_place_fill_cancel() {
        let mut engine = engine_with_price(dec!(40000));

        let kept = engine
            .place_order(
                OrderKind::Limit,
                OrderSide::Buy,
                dec!(0.05),
                Some(dec!(39000)),
            )
            .unwrap();
        let canceled = engine
            .place_order(
                OrderKind::Limit,
                OrderSide::Buy,
                dec!(0.05),
                Some(dec!(38000)),
            )
            .unwrap();
        engine.cancel_order(canceled.id);

        // quote + open reservations must equal the seed while nothing filled.
        let open_reserved: Decimal = engine
            .orders()
            .iter()
            .filter(|o| o.status == OrderStatus::Open)
            .map(|o| o.notional)
            .sum();
        assert_eq!(engine.balance().quote + open_reserved, dec!(10000));

        // After the fill the seed has been converted at the limit price.
        engine.on_price_update(dec!(39000));
        assert_eq!(engine.orders()[0].status, OrderStatus::Filled);
        assert_eq!(
            engine.balance().quote + kept.notional,
            dec!(10000),
            "fill must not create or destroy quote funds"
        );
        assert_eq!(engine.balance().base, kept.quantity);
    }
}
