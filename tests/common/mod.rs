#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cv_billing::application::dunning::DunningProcessor;
use cv_billing::application::webhook::WebhookProcessor;
use cv_billing::domain::order::{Amount, Order, OrderId};
use cv_billing::domain::ports::{
    Email, EmailDispatcher, PaymentDetails, PaymentGateway, PaymentRequest,
};
use cv_billing::error::{BillingError, Result};
use cv_billing::infrastructure::in_memory::{InMemoryActionLog, InMemoryOrderStore};
use cv_billing::infrastructure::simulated::SimulatedPaymentGateway;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

pub const SECRET: &str = "cron-s3cret";

pub fn sample_order(id: &str, created_at: DateTime<Utc>) -> Order {
    Order::new(
        OrderId::new(id),
        format!("CV-2026-{id}"),
        format!("{id}@example.com"),
        Amount::new(dec!(14.95)).unwrap(),
        created_at,
    )
}

/// Email dispatcher that records every send and can be switched to fail, for
/// exercising the retry path.
#[derive(Default, Clone)]
pub struct RecordingEmailDispatcher {
    sent: Arc<RwLock<Vec<Email>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingEmailDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<Email> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl EmailDispatcher for RecordingEmailDispatcher {
    async fn send(&self, email: &Email) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BillingError::EmailDispatch("smtp unavailable".to_string()));
        }
        self.sent.write().await.push(email.clone());
        Ok(())
    }
}

/// Gateway whose every call errors, for the always-acknowledge contract.
pub struct FailingGateway;

#[async_trait]
impl PaymentGateway for FailingGateway {
    async fn create_payment_request(&self, _order: &Order) -> Result<PaymentRequest> {
        Err(BillingError::Gateway("provider unreachable".to_string()))
    }

    async fn fetch_payment(&self, _payment_id: &str) -> Result<Option<PaymentDetails>> {
        Err(BillingError::Gateway("provider unreachable".to_string()))
    }
}

pub fn dunning_processor(
    store: &InMemoryOrderStore,
    log: &InMemoryActionLog,
    emails: &RecordingEmailDispatcher,
    gateway: &SimulatedPaymentGateway,
) -> DunningProcessor {
    DunningProcessor::new(
        Box::new(store.clone()),
        Box::new(log.clone()),
        Box::new(emails.clone()),
        Box::new(gateway.clone()),
    )
}

pub fn webhook_processor(
    store: &InMemoryOrderStore,
    log: &InMemoryActionLog,
    emails: &RecordingEmailDispatcher,
    gateway: &SimulatedPaymentGateway,
) -> WebhookProcessor {
    WebhookProcessor::new(
        Box::new(store.clone()),
        Box::new(log.clone()),
        Box::new(emails.clone()),
        Box::new(gateway.clone()),
    )
}
