use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Market,
    Limit,
}

/// The lifecycle state of an order.
///
/// Transitions are strictly one-way: `Open -> Filled` or `Open -> Canceled`.
/// Nothing ever leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    Filled,
    Canceled,
}

impl OrderStatus {
    /// Whether the order can still change state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Open)
    }
}
