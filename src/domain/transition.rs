use super::order::{EmailKind, Order, OrderStatus};
use super::policy::TimingPolicy;
use chrono::{DateTime, Utc};

/// One automatic dunning step: the email to send and the status to advance
/// to once the send succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DunningStep {
    Confirmation,
    Invoice,
    Reminder1,
    Reminder2,
}

impl DunningStep {
    /// The step that applies while an order sits in the given status.
    /// `Reminder2` status is a dead end awaiting payment or write-off, and
    /// terminal statuses never have a step.
    pub fn for_status(status: OrderStatus) -> Option<Self> {
        match status {
            OrderStatus::New => Some(DunningStep::Confirmation),
            OrderStatus::Confirmed => Some(DunningStep::Invoice),
            OrderStatus::Invoiced => Some(DunningStep::Reminder1),
            OrderStatus::Reminder1 => Some(DunningStep::Reminder2),
            OrderStatus::Reminder2 | OrderStatus::Paid | OrderStatus::WrittenOff => None,
        }
    }

    pub fn next_status(self) -> OrderStatus {
        match self {
            DunningStep::Confirmation => OrderStatus::Confirmed,
            DunningStep::Invoice => OrderStatus::Invoiced,
            DunningStep::Reminder1 => OrderStatus::Reminder1,
            DunningStep::Reminder2 => OrderStatus::Reminder2,
        }
    }

    pub fn email_kind(self) -> EmailKind {
        match self {
            DunningStep::Confirmation => EmailKind::Confirmation,
            DunningStep::Invoice => EmailKind::Invoice,
            DunningStep::Reminder1 => EmailKind::Reminder1,
            DunningStep::Reminder2 => EmailKind::Reminder2,
        }
    }

    /// Only the invoice step needs a hosted payment request in place before
    /// its email can go out.
    pub fn needs_payment_link(self) -> bool {
        matches!(self, DunningStep::Invoice)
    }
}

/// Pure decision function of the pipeline.
///
/// Given the order as loaded, the sweep instant, and the active timing
/// policy, returns the step that is due, or `None`. Never mutates anything;
/// the caller performs the side effect and only then commits the transition.
pub fn decide(order: &Order, now: DateTime<Utc>, policy: &TimingPolicy) -> Option<DunningStep> {
    if order.is_terminal() {
        return None;
    }
    let step = DunningStep::for_status(order.status)?;
    if now - order.created_at < policy.threshold(step) {
        return None;
    }
    // Guard field set means this step's email already went out, possibly by
    // an overlapping sweep.
    if order.sent_at(step.email_kind()).is_some() {
        return None;
    }
    Some(step)
}
