use crate::domain::order::Order;
use crate::domain::ports::{
    Email, EmailDispatcher, PaymentDetails, PaymentGateway, PaymentOutcome, PaymentRequest,
};
use crate::error::{BillingError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// An email dispatcher that only logs. Stands in for the real transactional
/// mail provider in the demo binary.
#[derive(Default, Clone)]
pub struct LoggingEmailDispatcher;

impl LoggingEmailDispatcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailDispatcher for LoggingEmailDispatcher {
    async fn send(&self, email: &Email) -> Result<()> {
        tracing::info!(to = %email.to, subject = %email.subject, "email dispatched");
        Ok(())
    }
}

/// A payment provider simulator.
///
/// Mints `tr_N` payment requests correlated to the order they were created
/// for, and lets the host settle them paid or failed so webhook deliveries
/// can be exercised end to end. `Clone` shares state.
#[derive(Default, Clone)]
pub struct SimulatedPaymentGateway {
    payments: Arc<RwLock<HashMap<String, PaymentDetails>>>,
    sequence: Arc<AtomicU64>,
}

impl SimulatedPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves a payment to the given outcome, as the provider would after the
    /// customer completed or abandoned checkout.
    pub async fn settle(&self, payment_id: &str, outcome: PaymentOutcome) -> Result<()> {
        let mut payments = self.payments.write().await;
        let payment = payments
            .get_mut(payment_id)
            .ok_or_else(|| BillingError::Gateway(format!("unknown payment {payment_id}")))?;
        payment.outcome = outcome;
        payment.provider_status = match outcome {
            PaymentOutcome::Paid => "paid",
            PaymentOutcome::Failed => "failed",
            PaymentOutcome::Open => "open",
        }
        .to_string();
        Ok(())
    }
}

#[async_trait]
impl PaymentGateway for SimulatedPaymentGateway {
    async fn create_payment_request(&self, order: &Order) -> Result<PaymentRequest> {
        let n = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!("tr_{n}");
        let request = PaymentRequest {
            id: id.clone(),
            url: format!("https://pay.example/{id}"),
        };
        let mut payments = self.payments.write().await;
        payments.insert(
            id.clone(),
            PaymentDetails {
                id,
                outcome: PaymentOutcome::Open,
                provider_status: "open".to_string(),
                order_id: Some(order.id.clone()),
            },
        );
        Ok(request)
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<Option<PaymentDetails>> {
        let payments = self.payments.read().await;
        Ok(payments.get(payment_id).cloned())
    }
}
