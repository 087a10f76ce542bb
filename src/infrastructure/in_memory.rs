use crate::domain::action::{ActionEntry, OrderAction};
use crate::domain::order::{Order, OrderId, OrderStatus};
use crate::domain::ports::{ActionLog, OrderStore, PaymentRequest};
use crate::domain::transition::DunningStep;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory order store.
///
/// Uses `Arc<RwLock<HashMap<OrderId, Order>>>` for shared concurrent access;
/// `Clone` shares the underlying map. Every conditional write takes the write
/// lock once and checks-then-mutates under it, which is what makes the
/// compare-and-set contract of `OrderStore` hold.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        orders.insert(order.id.clone(), order);
        Ok(())
    }

    async fn get(&self, id: &OrderId) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(id).cloned())
    }

    async fn find_by_payment_request(&self, payment_request_id: &str) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .find(|o| o.payment_request_id.as_deref() == Some(payment_request_id))
            .cloned())
    }

    async fn open_orders(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut open: Vec<Order> = orders.values().filter(|o| !o.is_terminal()).cloned().collect();
        open.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.as_str().cmp(b.id.as_str())));
        Ok(open)
    }

    async fn commit_step(
        &self,
        id: &OrderId,
        expected: OrderStatus,
        step: DunningStep,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let mut orders = self.orders.write().await;
        let Some(order) = orders.get_mut(id) else {
            return Ok(false);
        };
        // "update where status = expected AND guard IS NULL"
        if order.status != expected || order.sent_at(step.email_kind()).is_some() {
            return Ok(false);
        }
        order.status = step.next_status();
        order.set_sent_at(step.email_kind(), now);
        order.updated_at = now;
        Ok(true)
    }

    async fn attach_payment_request(
        &self,
        id: &OrderId,
        request: &PaymentRequest,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let mut orders = self.orders.write().await;
        let Some(order) = orders.get_mut(id) else {
            return Ok(false);
        };
        if order.payment_request_id.is_some() {
            return Ok(false);
        }
        order.payment_request_id = Some(request.id.clone());
        order.payment_request_url = Some(request.url.clone());
        order.updated_at = now;
        Ok(true)
    }

    async fn mark_paid(
        &self,
        id: &OrderId,
        provider_status: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let mut orders = self.orders.write().await;
        let Some(order) = orders.get_mut(id) else {
            return Ok(false);
        };
        if order.is_terminal() {
            return Ok(false);
        }
        order.status = OrderStatus::Paid;
        order.paid_at = Some(now);
        order.payment_status = Some(provider_status.to_string());
        order.updated_at = now;
        Ok(true)
    }

    async fn mark_written_off(&self, id: &OrderId, now: DateTime<Utc>) -> Result<bool> {
        let mut orders = self.orders.write().await;
        let Some(order) = orders.get_mut(id) else {
            return Ok(false);
        };
        if order.is_terminal() {
            return Ok(false);
        }
        order.status = OrderStatus::WrittenOff;
        order.updated_at = now;
        Ok(true)
    }

    async fn set_payment_status(
        &self,
        id: &OrderId,
        provider_status: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut orders = self.orders.write().await;
        if let Some(order) = orders.get_mut(id) {
            order.payment_status = Some(provider_status.to_string());
            order.updated_at = now;
        }
        Ok(())
    }
}

/// A thread-safe in-memory audit log that assigns sequential entry ids.
#[derive(Default, Clone)]
pub struct InMemoryActionLog {
    entries: Arc<RwLock<Vec<OrderAction>>>,
}

impl InMemoryActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entry ever appended, across all orders.
    pub async fn all(&self) -> Vec<OrderAction> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl ActionLog for InMemoryActionLog {
    async fn append(&self, order_id: &OrderId, entry: ActionEntry) -> Result<()> {
        let mut entries = self.entries.write().await;
        let id = entries.len() as u64 + 1;
        entries.push(OrderAction {
            id,
            order_id: order_id.clone(),
            action_type: entry.action_type,
            description: entry.description,
            performed_by: entry.performed_by,
            metadata: entry.metadata,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn for_order(&self, order_id: &OrderId) -> Result<Vec<OrderAction>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|a| &a.order_id == order_id)
            .cloned()
            .collect())
    }
}
