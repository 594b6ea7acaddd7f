use crate::error::EngineError;
use crate::PaperEngine;
use core_types::{Balance, Order, OrderKind, OrderSide};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// A clone-able, thread-safe handle to the engine for async contexts.
///
/// The feed integration and any front surface each hold a clone; every
/// command and snapshot read acquires the same mutex, which is what makes
/// the engine's check-then-reserve step safe under concurrent callers.
/// Locks are held only for the duration of one synchronous engine call.
#[derive(Clone)]
pub struct EngineHandle {
    inner: Arc<Mutex<PaperEngine>>,
}

impl EngineHandle {
    pub fn new(engine: PaperEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    pub async fn place_order(
        &self,
        kind: OrderKind,
        side: OrderSide,
        quantity: Decimal,
        limit_price: Option<Decimal>,
    ) -> Result<Order, EngineError> {
        self.inner
            .lock()
            .await
            .place_order(kind, side, quantity, limit_price)
    }

    pub async fn cancel_order(&self, id: Uuid) -> Option<Order> {
        self.inner.lock().await.cancel_order(id)
    }

    pub async fn on_price_update(&self, price: Decimal) -> Vec<Order> {
        self.inner.lock().await.on_price_update(price)
    }

    pub async fn balance(&self) -> Balance {
        self.inner.lock().await.balance()
    }

    /// A snapshot of every order ever placed, in insertion order.
    pub async fn orders(&self) -> Vec<Order> {
        self.inner.lock().await.orders().to_vec()
    }

    pub async fn last_price(&self) -> Option<Decimal> {
        self.inner.lock().await.last_price()
    }

    pub async fn pair(&self) -> String {
        self.inner.lock().await.pair().to_string()
    }
}
