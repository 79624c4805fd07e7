use crate::domain::error::DomainError;
use crate::domain::ports::notifier::Notifier;
use tracing::info;

/// Writes messages to the log instead of a chat channel.
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> Result<(), DomainError> {
        info!(target: "swingwatch::notify", "{text}");
        Ok(())
    }
}
