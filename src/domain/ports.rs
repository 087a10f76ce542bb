use super::action::{ActionEntry, OrderAction};
use super::order::{Order, OrderId, OrderStatus};
use super::transition::DunningStep;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A hosted payment request minted by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub id: String,
    pub url: String,
}

/// Provider-side outcome of a payment, collapsed to what the pipeline
/// distinguishes. `Open` covers pending/authorized/anything not final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    Paid,
    Failed,
    Open,
}

/// What the provider knows about one payment, including the order it was
/// created for (carried in provider-side metadata).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub id: String,
    pub outcome: PaymentOutcome,
    /// Raw provider status string, persisted verbatim on the order.
    pub provider_status: String,
    pub order_id: Option<OrderId>,
}

/// A rendered transactional email ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Persistence for orders.
///
/// The conditional writes are the concurrency boundary of the whole
/// pipeline: each is an atomic compare-and-set that returns `Ok(false)` when
/// the caller's view was stale, meaning another run already handled the
/// order. Stale is never an error.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: Order) -> Result<()>;
    async fn get(&self, id: &OrderId) -> Result<Option<Order>>;
    async fn find_by_payment_request(&self, payment_request_id: &str) -> Result<Option<Order>>;

    /// All non-terminal orders, in a stable order.
    async fn open_orders(&self) -> Result<Vec<Order>>;

    /// Commit one dunning step: advance the status and set the step's guard
    /// timestamp, only if the status still equals `expected` and the guard is
    /// still unset.
    async fn commit_step(
        &self,
        id: &OrderId,
        expected: OrderStatus,
        step: DunningStep,
        now: DateTime<Utc>,
    ) -> Result<bool>;

    /// Attach a freshly created payment request, only if none exists yet.
    async fn attach_payment_request(
        &self,
        id: &OrderId,
        request: &PaymentRequest,
        now: DateTime<Utc>,
    ) -> Result<bool>;

    /// Settle the order as paid, only if it is not yet terminal.
    async fn mark_paid(
        &self,
        id: &OrderId,
        provider_status: &str,
        now: DateTime<Utc>,
    ) -> Result<bool>;

    /// Administrative write-off, only if the order is not yet terminal.
    async fn mark_written_off(&self, id: &OrderId, now: DateTime<Utc>) -> Result<bool>;

    /// Record the provider's latest status without moving the pipeline.
    async fn set_payment_status(
        &self,
        id: &OrderId,
        provider_status: &str,
        now: DateTime<Utc>,
    ) -> Result<()>;
}

/// Append-only audit trail.
#[async_trait]
pub trait ActionLog: Send + Sync {
    async fn append(&self, order_id: &OrderId, entry: ActionEntry) -> Result<()>;
    async fn for_order(&self, order_id: &OrderId) -> Result<Vec<OrderAction>>;
}

/// Outbound transactional email. A failed send is reported as an error and
/// must leave no trace; the pipeline retries on the next sweep.
#[async_trait]
pub trait EmailDispatcher: Send + Sync {
    async fn send(&self, email: &Email) -> Result<()>;
}

/// The hosted-payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_request(&self, order: &Order) -> Result<PaymentRequest>;
    async fn fetch_payment(&self, payment_id: &str) -> Result<Option<PaymentDetails>>;
}

pub type OrderStoreBox = Box<dyn OrderStore>;
pub type ActionLogBox = Box<dyn ActionLog>;
pub type EmailDispatcherBox = Box<dyn EmailDispatcher>;
pub type PaymentGatewayBox = Box<dyn PaymentGateway>;
