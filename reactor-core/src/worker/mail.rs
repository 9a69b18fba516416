//! 邮件（MailMessage）与投递契约（Delivery）
//!
use crate::error::ReactorResult;
use async_trait::async_trait;
use bon::Builder;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct MailMessage {
    #[builder(default, into)]
    to: Vec<String>,
    #[builder(into)]
    from: Option<String>,
    #[builder(default, into)]
    subject: String,
    #[builder(default, into)]
    body: String,
    /// 构建该邮件的动作名，邮件类单元执行时写入 `{event}_email`
    #[builder(into)]
    action_name: Option<String>,
}

impl MailMessage {
    pub fn to(&self) -> &[String] {
        &self.to
    }

    pub fn sender(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn action_name(&self) -> Option<&str> {
        self.action_name.as_deref()
    }

    pub(crate) fn set_action_name(&mut self, name: String) {
        self.action_name = Some(name);
    }
}

/// 邮件投递
#[async_trait]
pub trait Delivery: Send + Sync {
    /// 是否可投递；默认要求至少一个收件人
    fn can_deliver(&self, message: &MailMessage) -> bool {
        message.to.iter().any(|to| !to.trim().is_empty())
    }

    async fn deliver(&self, message: &MailMessage) -> ReactorResult<()>;
}
