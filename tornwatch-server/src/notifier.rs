use async_trait::async_trait;
use tracing::info;

use tornwatch_common::error::Error;
use tornwatch_common::models::NotifyChannel;
use tornwatch_common::traits::Notifier;

/// Writes notifications to the log. Stands in for a desktop toast or TTS voice.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_notification(&self, title: &str, body: &str, channel: NotifyChannel) -> Result<(), Error> {
        info!(target: "tornwatch::notify", "[{}] {}: {}", channel, title, body);
        Ok(())
    }
}
