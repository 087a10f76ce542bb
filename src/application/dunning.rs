use super::emails;
use crate::domain::action::{ActionEntry, Actor};
use crate::domain::order::Order;
use crate::domain::policy::TimingPolicy;
use crate::domain::ports::{ActionLogBox, EmailDispatcherBox, OrderStoreBox, PaymentGatewayBox};
use crate::domain::transition::decide;
use crate::error::{BillingError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Summary of one sweep. `processed` counts orders actually advanced;
/// `errors` holds one entry per order whose step failed and will be retried.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SweepReport {
    pub processed: usize,
    pub actions: Vec<String>,
    pub errors: Vec<String>,
}

/// The periodic dunning sweep.
///
/// Advances every eligible order by at most one step per run. Each order is
/// processed in isolation: a failure is collected into the report and the
/// order is left untouched so the next sweep retries it. The final
/// status-plus-guard update is a conditional write, so overlapping sweeps
/// cannot double-send.
pub struct DunningProcessor {
    orders: OrderStoreBox,
    actions: ActionLogBox,
    emails: EmailDispatcherBox,
    gateway: PaymentGatewayBox,
}

impl DunningProcessor {
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

    /// Sweeps all non-terminal orders at the given instant.
    ///
    /// Never fails as a whole; a store error while listing yields an empty
    /// sweep with one error entry.
    pub async fn run(&self, now: DateTime<Utc>, policy: &TimingPolicy) -> SweepReport {
        let mut report = SweepReport::default();

        let orders = match self.orders.open_orders().await {
            Ok(orders) => orders,
            Err(e) => {
                report.errors.push(format!("listing open orders: {e}"));
                return report;
            }
        };

        for order in orders {
            match self.process_order(&order, now, policy).await {
                Ok(Some(description)) => {
                    report.processed += 1;
                    report.actions.push(description);
                }
                Ok(None) => {}
                Err(e) => report.errors.push(format!("order {}: {e}", order.id)),
            }
        }

        report
    }

    /// Runs at most one step for one order. Returns a human-readable
    /// description when the order advanced, `None` when nothing was due or a
    /// concurrent run got there first.
    async fn process_order(
        &self,
        order: &Order,
        now: DateTime<Utc>,
        policy: &TimingPolicy,
    ) -> Result<Option<String>> {
        let Some(step) = decide(order, now, policy) else {
            return Ok(None);
        };

        let mut order = order.clone();

        // The payment request must exist and be persisted before the invoice
        // email references it.
        if step.needs_payment_link() && order.payment_request_id.is_none() {
            order = self.ensure_payment_request(order, now).await?;
        }

        // Side effect first, commit second: a failed send leaves no state
        // behind, so the step stays retryable.
        let email = emails::render(step.email_kind(), &order);
        self.emails.send(&email).await?;

        let committed = self
            .orders
            .commit_step(&order.id, order.status, step, now)
            .await?;
        if !committed {
            // A concurrent sweep advanced the order between our read and the
            // conditional write. Its email already went out; ours is a
            // duplicate we can only avoid logging, not unsend.
            tracing::debug!(order_id = %order.id, step = ?step, "stale sweep result discarded");
            return Ok(None);
        }

        let from = order.status;
        let to = step.next_status();
        self.actions
            .append(&order.id, ActionEntry::status_changed(from, to, Actor::Cron))
            .await?;
        self.actions
            .append(
                &order.id,
                ActionEntry::email_sent(step.email_kind(), &email.to, Actor::Cron),
            )
            .await?;

        Ok(Some(format!(
            "order {} ({}): {from} -> {to}, {} email sent",
            order.id,
            order.dossier_number,
            step.email_kind()
        )))
    }

    async fn ensure_payment_request(&self, mut order: Order, now: DateTime<Utc>) -> Result<Order> {
        let request = self.gateway.create_payment_request(&order).await?;
        let attached = self
            .orders
            .attach_payment_request(&order.id, &request, now)
            .await?;
        if attached {
            self.actions
                .append(
                    &order.id,
                    ActionEntry::payment_created(&request.id, &request.url, Actor::Cron),
                )
                .await?;
            order.payment_request_id = Some(request.id);
            order.payment_request_url = Some(request.url);
            Ok(order)
        } else {
            // Another run attached a request first; use the stored one.
            self.orders
                .get(&order.id)
                .await?
                .ok_or_else(|| BillingError::Storage(format!("order {} disappeared", order.id)))
        }
    }
}
