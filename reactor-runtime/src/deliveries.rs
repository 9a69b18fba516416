use async_trait::async_trait;
use reactor_core::error::ReactorResult;
use reactor_core::worker::{Delivery, MailMessage};
use std::sync::{Mutex, PoisonError};

/// 进程内投递：只记录邮件，不发送
#[derive(Debug, Default)]
pub struct MailDeliveries {
    sent: Mutex<Vec<MailMessage>>,
}

impl MailDeliveries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Delivery for MailDeliveries {
    async fn deliver(&self, message: &MailMessage) -> ReactorResult<()> {
        tracing::debug!(to = ?message.to(), subject = message.subject(), "mail recorded");
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        Ok(())
    }
}
