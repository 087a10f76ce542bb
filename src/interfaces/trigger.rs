use crate::application::dunning::{DunningProcessor, SweepReport};
use crate::domain::policy::TimingPolicy;
use crate::error::{BillingError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Credential-bearing request any scheduler can send to kick off a sweep.
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerRequest {
    pub secret: String,
    #[serde(default)]
    pub accelerated: bool,
}

/// Summary returned to an authorized caller.
#[derive(Debug, Clone, Serialize)]
pub struct TriggerResponse {
    pub processed: usize,
    pub actions: Vec<String>,
    pub errors: Vec<String>,
}

impl From<SweepReport> for TriggerResponse {
    fn from(report: SweepReport) -> Self {
        Self {
            processed: report.processed,
            actions: report.actions,
            errors: report.errors,
        }
    }
}

/// The dunning trigger entry point.
///
/// Plain async callable so any host (HTTP route, scheduler, CLI) can mount
/// it. Correctness does not depend on non-overlapping invocations; the
/// processor's conditional writes absorb racing triggers. An invalid secret
/// is rejected before any order is read.
pub struct DunningTrigger {
    secret: String,
    processor: DunningProcessor,
}

impl DunningTrigger {
    pub fn new(secret: impl Into<String>, processor: DunningProcessor) -> Self {
        Self {
            secret: secret.into(),
            processor,
        }
    }

    pub async fn handle(
        &self,
        request: &TriggerRequest,
        now: DateTime<Utc>,
    ) -> Result<TriggerResponse> {
        if request.secret != self.secret {
            return Err(BillingError::Unauthorized);
        }
        let policy = TimingPolicy::select(request.accelerated);
        let report = self.processor.run(now, &policy).await;
        Ok(report.into())
    }
}
