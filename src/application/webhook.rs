use super::emails;
use crate::domain::action::{ActionEntry, Actor};
use crate::domain::order::{EmailKind, Order};
use crate::domain::ports::{
    ActionLogBox, EmailDispatcherBox, OrderStoreBox, PaymentDetails, PaymentGatewayBox,
    PaymentOutcome,
};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What one webhook delivery amounted to, for logging and tests. The caller
/// (the provider) never sees this; the endpoint always acknowledges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookOutcome {
    /// Order settled as paid by this delivery.
    Paid,
    /// Payment failed at the provider; the order stays in the pipeline.
    Failed,
    /// Provider status recorded, nothing else to do.
    StatusRecorded,
    /// Order already terminal, or another delivery settled it first.
    AlreadySettled,
    /// Payment unknown or not attributable to an order.
    Ignored,
}

/// Reconciles one asynchronous payment notification with its order.
///
/// Runs concurrently with the dunning sweep and with duplicate deliveries of
/// itself; the terminal check plus the conditional paid-write keep the
/// settlement side effects exactly-once.
pub struct WebhookProcessor {
    orders: OrderStoreBox,
    actions: ActionLogBox,
    emails: EmailDispatcherBox,
    gateway: PaymentGatewayBox,
}

impl WebhookProcessor {
    pub fn new(
        orders: OrderStoreBox,
        actions: ActionLogBox,
        emails: EmailDispatcherBox,
        gateway: PaymentGatewayBox,
    ) -> Self {
        Self {
            orders,
            actions,
            emails,
            gateway,
        }
    }

    pub async fn handle(&self, payment_id: &str, now: DateTime<Utc>) -> Result<WebhookOutcome> {
        let Some(payment) = self.gateway.fetch_payment(payment_id).await? else {
            tracing::warn!(payment_id, "webhook for unknown payment, ignoring");
            return Ok(WebhookOutcome::Ignored);
        };

        let Some(order) = self.resolve_order(&payment).await? else {
            tracing::warn!(payment_id, "payment resolves to no order, ignoring");
            return Ok(WebhookOutcome::Ignored);
        };

        // Repeated "paid" deliveries for a settled order must not touch
        // paid_at, re-send the confirmation, or duplicate audit entries.
        if order.is_terminal() {
            tracing::debug!(order_id = %order.id, "order already terminal, webhook is a no-op");
            return Ok(WebhookOutcome::AlreadySettled);
        }

        match payment.outcome {
            PaymentOutcome::Paid => self.settle_paid(&order, &payment, now).await,
            PaymentOutcome::Failed => {
                self.orders
                    .set_payment_status(&order.id, &payment.provider_status, now)
                    .await?;
                self.actions
                    .append(
                        &order.id,
                        ActionEntry::payment_failed(&payment.id, &payment.provider_status),
                    )
                    .await?;
                Ok(WebhookOutcome::Failed)
            }
            PaymentOutcome::Open => {
                self.orders
                    .set_payment_status(&order.id, &payment.provider_status, now)
                    .await?;
                Ok(WebhookOutcome::StatusRecorded)
            }
        }
    }

    async fn settle_paid(
        &self,
        order: &Order,
        payment: &PaymentDetails,
        now: DateTime<Utc>,
    ) -> Result<WebhookOutcome> {
        let committed = self
            .orders
            .mark_paid(&order.id, &payment.provider_status, now)
            .await?;
        if !committed {
            // A concurrent delivery won the conditional write and owns the
            // side effects.
            return Ok(WebhookOutcome::AlreadySettled);
        }

        self.actions
            .append(
                &order.id,
                ActionEntry::payment_received(&payment.id, &payment.provider_status),
            )
            .await?;

        // The paid state is already committed; a failed confirmation email is
        // only logged, never unwound.
        let email = emails::render(EmailKind::PaymentConfirmation, order);
        match self.emails.send(&email).await {
            Ok(()) => {
                self.actions
                    .append(
                        &order.id,
                        ActionEntry::email_sent(
                            EmailKind::PaymentConfirmation,
                            &email.to,
                            Actor::Webhook,
                        ),
                    )
                    .await?;
            }
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "payment confirmation email failed");
            }
        }

        Ok(WebhookOutcome::Paid)
    }

    /// Provider metadata names the order directly; fall back to our own
    /// payment-request correlation for older payments.
    async fn resolve_order(&self, payment: &PaymentDetails) -> Result<Option<Order>> {
        if let Some(order_id) = &payment.order_id
            && let Some(order) = self.orders.get(order_id).await?
        {
            return Ok(Some(order));
        }
        self.orders.find_by_payment_request(&payment.id).await
    }
}
