pub mod twilio;

use async_trait::async_trait;

/// Outbound message channel, used to alert the salon owner about new
/// bookings. Swappable so tests can record sends instead of hitting Twilio.
#[async_trait]
pub trait MessagingProvider: Send + Sync {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()>;
}
