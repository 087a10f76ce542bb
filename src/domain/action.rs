use super::order::{EmailKind, OrderId, OrderStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// Kind of audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Created,
    StatusChanged,
    EmailSent,
    PaymentCreated,
    PaymentReceived,
    PaymentFailed,
    WrittenOff,
}

/// Who performed an audited action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    System,
    Cron,
    Webhook,
    Admin(String),
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::System => f.write_str("system"),
            Actor::Cron => f.write_str("cron"),
            Actor::Webhook => f.write_str("webhook"),
            Actor::Admin(name) => write!(f, "admin:{name}"),
        }
    }
}

/// Append-only audit record. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAction {
    pub id: u64,
    pub order_id: OrderId,
    pub action_type: ActionType,
    pub description: String,
    pub performed_by: Actor,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// An audit entry before the log has assigned it an id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionEntry {
    pub action_type: ActionType,
    pub description: String,
    pub performed_by: Actor,
    pub metadata: serde_json::Value,
}

impl ActionEntry {
    pub fn created(dossier_number: &str, performed_by: Actor) -> Self {
        Self {
            action_type: ActionType::Created,
            description: format!("order created with dossier {dossier_number}"),
            performed_by,
            metadata: json!({ "dossier_number": dossier_number }),
        }
    }

    /// The one entry that accompanies every status change; old and new status
    /// travel in the metadata so the trail can be replayed.
    pub fn status_changed(from: OrderStatus, to: OrderStatus, performed_by: Actor) -> Self {
        Self {
            action_type: ActionType::StatusChanged,
            description: format!("status changed from {from} to {to}"),
            performed_by,
            metadata: json!({ "from": from, "to": to }),
        }
    }

    pub fn email_sent(kind: EmailKind, recipient: &str, performed_by: Actor) -> Self {
        Self {
            action_type: ActionType::EmailSent,
            description: format!("{kind} email sent to {recipient}"),
            performed_by,
            metadata: json!({ "email": kind, "recipient": recipient }),
        }
    }

    pub fn payment_created(request_id: &str, url: &str, performed_by: Actor) -> Self {
        Self {
            action_type: ActionType::PaymentCreated,
            description: format!("payment request {request_id} created"),
            performed_by,
            metadata: json!({ "payment_request_id": request_id, "url": url }),
        }
    }

    pub fn payment_received(request_id: &str, provider_status: &str) -> Self {
        Self {
            action_type: ActionType::PaymentReceived,
            description: format!("payment {request_id} confirmed by provider"),
            performed_by: Actor::Webhook,
            metadata: json!({ "payment_request_id": request_id, "provider_status": provider_status }),
        }
    }

    pub fn payment_failed(request_id: &str, provider_status: &str) -> Self {
        Self {
            action_type: ActionType::PaymentFailed,
            description: format!("payment {request_id} failed at provider"),
            performed_by: Actor::Webhook,
            metadata: json!({ "payment_request_id": request_id, "provider_status": provider_status }),
        }
    }

    pub fn written_off(from: OrderStatus, performed_by: Actor) -> Self {
        Self {
            action_type: ActionType::WrittenOff,
            description: format!("order written off from {from}"),
            performed_by,
            metadata: json!({ "from": from, "to": OrderStatus::WrittenOff }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_changed_metadata_carries_both_statuses() {
        let entry =
            ActionEntry::status_changed(OrderStatus::New, OrderStatus::Confirmed, Actor::Cron);
        assert_eq!(entry.action_type, ActionType::StatusChanged);
        assert_eq!(entry.metadata["from"], "new");
        assert_eq!(entry.metadata["to"], "confirmed");
        assert!(entry.description.contains("new"));
        assert!(entry.description.contains("confirmed"));
    }

    #[test]
    fn test_actor_display() {
        assert_eq!(Actor::Cron.to_string(), "cron");
        assert_eq!(Actor::Admin("jan".to_string()).to_string(), "admin:jan");
    }

    #[test]
    fn test_payment_received_is_webhook_actor() {
        let entry = ActionEntry::payment_received("tr_1", "paid");
        assert_eq!(entry.performed_by, Actor::Webhook);
        assert_eq!(entry.metadata["payment_request_id"], "tr_1");
    }
}
