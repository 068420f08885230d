use async_trait::async_trait;

use crate::error::Error;
use crate::models::NotifyChannel;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_notification(
        &self,
        title: &str,
        body: &str,
        channel: NotifyChannel,
    ) -> Result<(), Error>;
}
