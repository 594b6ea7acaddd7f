pub mod enums;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{OrderKind, OrderSide, OrderStatus};
pub use structs::{Balance, Kline, Order};
