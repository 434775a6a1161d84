use crate::domain::UserId;
use crate::domain::event::LedgerEvent;
use crate::domain::ports::NotificationSink;
use crate::error::Result;
use async_trait::async_trait;
use tracing::info;

/// Delivers notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(
        &self,
        user_id: UserId,
        event: LedgerEvent,
        payload: serde_json::Value,
    ) -> Result<()> {
        info!(user_id = %user_id, event = %event, payload = %payload, "notification");
        Ok(())
    }
}
