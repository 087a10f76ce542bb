use crate::error::BillingError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque order identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A positive monetary amount in the single supported currency (EUR).
///
/// Wrapper around `rust_decimal::Decimal` so amounts can never be zero or
/// negative once constructed.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, BillingError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(BillingError::Validation(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = BillingError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "€ {:.2}", self.0)
    }
}

/// Billing pipeline position of an order.
///
/// `Paid` and `WrittenOff` are terminal; everything else can still advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    Confirmed,
    Invoiced,
    #[serde(rename = "reminder_1")]
    Reminder1,
    #[serde(rename = "reminder_2")]
    Reminder2,
    Paid,
    WrittenOff,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::WrittenOff)
    }

    /// Position along the dunning pipeline. Terminal statuses sort last so
    /// that any forward move (including the webhook jump to `Paid`) is
    /// rank-increasing.
    pub fn rank(&self) -> u8 {
        match self {
            OrderStatus::New => 0,
            OrderStatus::Confirmed => 1,
            OrderStatus::Invoiced => 2,
            OrderStatus::Reminder1 => 3,
            OrderStatus::Reminder2 => 4,
            OrderStatus::Paid => 5,
            OrderStatus::WrittenOff => 5,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::New => "new",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Invoiced => "invoiced",
            OrderStatus::Reminder1 => "reminder_1",
            OrderStatus::Reminder2 => "reminder_2",
            OrderStatus::Paid => "paid",
            OrderStatus::WrittenOff => "written_off",
        };
        f.write_str(s)
    }
}

/// The transactional emails the pipeline can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailKind {
    Confirmation,
    Invoice,
    #[serde(rename = "reminder_1")]
    Reminder1,
    #[serde(rename = "reminder_2")]
    Reminder2,
    PaymentConfirmation,
}

impl fmt::Display for EmailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EmailKind::Confirmation => "confirmation",
            EmailKind::Invoice => "invoice",
            EmailKind::Reminder1 => "reminder_1",
            EmailKind::Reminder2 => "reminder_2",
            EmailKind::PaymentConfirmation => "payment_confirmation",
        };
        f.write_str(s)
    }
}

/// One billing record per CV download purchase.
///
/// The four `*_sent_at` timestamps are the idempotency guards for the
/// automatic emails: each is set at most once, and only after the
/// corresponding dispatch succeeded. All elapsed-time thresholds are measured
/// from `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Human-readable file number, assigned at creation, never changes.
    pub dossier_number: String,
    pub customer_email: String,
    pub amount: Amount,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub confirmation_sent_at: Option<DateTime<Utc>>,
    pub invoice_sent_at: Option<DateTime<Utc>>,
    pub reminder1_sent_at: Option<DateTime<Utc>>,
    pub reminder2_sent_at: Option<DateTime<Utc>>,
    pub payment_request_id: Option<String>,
    pub payment_request_url: Option<String>,
    pub payment_status: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn new(
        id: OrderId,
        dossier_number: impl Into<String>,
        customer_email: impl Into<String>,
        amount: Amount,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            dossier_number: dossier_number.into(),
            customer_email: customer_email.into(),
            amount,
            status: OrderStatus::New,
            created_at,
            updated_at: created_at,
            confirmation_sent_at: None,
            invoice_sent_at: None,
            reminder1_sent_at: None,
            reminder2_sent_at: None,
            payment_request_id: None,
            payment_request_url: None,
            payment_status: None,
            paid_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Guard timestamp for the given email kind, if that kind has one.
    pub fn sent_at(&self, kind: EmailKind) -> Option<DateTime<Utc>> {
        match kind {
            EmailKind::Confirmation => self.confirmation_sent_at,
            EmailKind::Invoice => self.invoice_sent_at,
            EmailKind::Reminder1 => self.reminder1_sent_at,
            EmailKind::Reminder2 => self.reminder2_sent_at,
            EmailKind::PaymentConfirmation => None,
        }
    }

    pub(crate) fn set_sent_at(&mut self, kind: EmailKind, at: DateTime<Utc>) {
        match kind {
            EmailKind::Confirmation => self.confirmation_sent_at = Some(at),
            EmailKind::Invoice => self.invoice_sent_at = Some(at),
            EmailKind::Reminder1 => self.reminder1_sent_at = Some(at),
            EmailKind::Reminder2 => self.reminder2_sent_at = Some(at),
            EmailKind::PaymentConfirmation => {}
        }
    }
}
