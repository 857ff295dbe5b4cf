use std::sync::Arc;

use crate::models::usage::UsageRecord;
use crate::store::UsageLog;

/// Best-effort usage writer.
///
/// Recording is a side effect of handling a request, not part of its
/// success/failure contract: a failed append is logged and swallowed so it
/// can never mask the primary outcome.
#[derive(Clone)]
pub struct UsageRecorder {
    log: Arc<dyn UsageLog>,
}

impl UsageRecorder {
    pub fn new(log: Arc<dyn UsageLog>) -> Self {
        Self { log }
    }

    pub async fn record(&self, record: UsageRecord) {
        // Never log the token secret itself.
        if let Err(e) = self.log.append(&record).await {
            tracing::error!(
                endpoint = %record.endpoint,
                status = ?record.status_code,
                "failed to write usage record: {}",
                e
            );
        } else {
            tracing::debug!(endpoint = %record.endpoint, "usage record written");
        }
    }
}
