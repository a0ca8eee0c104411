use std::sync::Arc;

use motorpool_audit::ChangeRecord;
use motorpool_infra::ChangeStore;

/// Best-effort appender for the change audit trail.
///
/// `record` returns `()` on purpose: the audit trail is diagnostic, not the
/// transactional source of truth, so a failed append must never fail the
/// mutation it describes. The failure is logged and the record is lost —
/// there is no retry queue.
#[derive(Clone)]
pub struct AuditRecorder {
    changes: Arc<dyn ChangeStore>,
}

impl AuditRecorder {
    pub fn new(changes: Arc<dyn ChangeStore>) -> Self {
        Self { changes }
    }

    pub async fn record(&self, record: ChangeRecord) {
        let change_type = record.change_type;
        let shop_id = record.shop_id;
        let notification_id = record.notification_id;
        let vehicle_id = record.vehicle_id;

        if let Err(error) = self.changes.append(record).await {
            tracing::warn!(
                %error,
                change_type = %change_type,
                shop_id = %shop_id,
                notification_id = ?notification_id,
                vehicle_id = ?vehicle_id,
                "failed to append change record; mutation result unaffected"
            );
        }
    }
}
