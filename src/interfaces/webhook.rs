use crate::application::webhook::WebhookProcessor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The provider posts only the payment identifier; everything else is
/// fetched back from the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookRequest {
    pub id: String,
}

/// What we tell the provider. Always `received`, by contract: surfacing an
/// internal failure would only trigger the provider's retry storm. Whether
/// the notification was actually processed lives in the logs and the audit
/// trail, not in this acknowledgement.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

impl WebhookAck {
    fn received() -> Self {
        Self { status: "received" }
    }
}

/// The webhook entry point: a plain async callable for any HTTP host.
pub struct WebhookEndpoint {
    processor: WebhookProcessor,
}

impl WebhookEndpoint {
    pub fn new(processor: WebhookProcessor) -> Self {
        Self { processor }
    }

    pub async fn handle(&self, request: &WebhookRequest, now: DateTime<Utc>) -> WebhookAck {
        match self.processor.handle(&request.id, now).await {
            Ok(outcome) => {
                tracing::info!(payment_id = %request.id, ?outcome, "webhook processed");
            }
            Err(e) => {
                tracing::error!(payment_id = %request.id, error = %e, "webhook processing failed");
            }
        }
        WebhookAck::received()
    }
}
