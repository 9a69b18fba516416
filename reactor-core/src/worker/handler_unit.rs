//! 处理单元（HandlerUnit）
//!
//! 注册表中每一条订阅对应一个处理单元。单元自身即是一种任务：
//! 分发时按提交策略入队（任务 class 为单元名），执行时经过配置校验与闸门后调用动作。
//!
use super::{Action, Delivery, MailMessage, Outcome, PerformGate};
use crate::{
    bag::DataBag,
    config::DEFAULT_QUEUE,
    error::{ReactorError, ReactorResult},
    event::Event,
    queue::{Job, JobId, JobQueue},
};
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc, time::Duration};

/// 透传给队列的任务选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOptions {
    pub queue: String,
    pub retry: bool,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            queue: DEFAULT_QUEUE.to_string(),
            retry: true,
        }
    }
}

#[derive(Clone, Default)]
pub enum HandlerKind {
    #[default]
    Event,
    /// 邮件类单元；未配置投递方时邮件只构建不发送
    Mailer { delivery: Option<Arc<dyn Delivery>> },
}

impl fmt::Debug for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event => f.write_str("Event"),
            Self::Mailer { delivery } => f
                .debug_struct("Mailer")
                .field("delivery", &delivery.is_some())
                .finish(),
        }
    }
}

/// 一次执行的结果
#[derive(Debug, Clone, PartialEq)]
pub enum Performed {
    /// 已弃用或被闸门拦下
    Aborted,
    Completed,
    Delivered(MailMessage),
    /// 邮件未调用或不可投递；前者为 `None`
    Undelivered(Option<MailMessage>),
}

#[derive(Debug, Clone, Builder)]
pub struct HandlerUnit {
    #[builder(into)]
    name: String,
    #[builder(into)]
    source: Option<String>,
    action: Option<Action>,
    delay: Option<Duration>,
    deprecated: Option<bool>,
    #[builder(default)]
    options: JobOptions,
    #[builder(default)]
    kind: HandlerKind,
}

impl HandlerUnit {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn delay(&self) -> Duration {
        self.delay.unwrap_or_default()
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated.unwrap_or(false)
    }

    pub fn options(&self) -> &JobOptions {
        &self.options
    }

    pub fn kind(&self) -> &HandlerKind {
        &self.kind
    }

    pub fn is_mailer(&self) -> bool {
        matches!(self.kind, HandlerKind::Mailer { .. })
    }

    pub(crate) fn renamed(mut self, name: String) -> Self {
        self.name = name;
        self
    }

    /// 四项必需配置是否齐全
    pub fn is_configured(&self) -> bool {
        self.source.is_some()
            && self.action.is_some()
            && self.delay.is_some()
            && self.deprecated.is_some()
    }

    /// 当前配置的文本形式，用于报错
    pub fn settings(&self) -> String {
        format!(
            "{{source: {:?}, action: {:?}, delay: {:?}, deprecated: {:?}}}",
            self.source, self.action, self.delay, self.deprecated
        )
    }

    /// 构造本单元的任务；`lane_override` 存在时替换队列
    pub fn job(&self, event: &str, data: DataBag, lane_override: Option<&str>) -> Job {
        Job::new(self.name.clone(), event, data)
            .on_queue(lane_override.unwrap_or(&self.options.queue))
            .with_retry(self.options.retry)
    }

    /// 提交策略：弃用 → 忽略；有延迟 → 定时入队；否则立即入队
    pub async fn perform_where_needed(
        &self,
        queue: &dyn JobQueue,
        lane_override: Option<&str>,
        event: &str,
        data: &DataBag,
    ) -> ReactorResult<Option<JobId>> {
        if self.is_deprecated() {
            tracing::debug!(handler = %self.name, event, "deprecated handler skipped");
            return Ok(None);
        }

        let job = self.job(event, data.clone(), lane_override);
        let delay = self.delay();
        let id = if delay > Duration::ZERO {
            queue.enqueue_in(delay, job).await?
        } else {
            queue.enqueue_now(job).await?
        };

        tracing::debug!(
            handler = %self.name,
            event,
            queue = lane_override.unwrap_or(&self.options.queue),
            delay_secs = delay.as_secs(),
            job = %id,
            "handler job submitted"
        );
        Ok(Some(id))
    }

    /// 执行处理单元
    pub async fn perform(
        &self,
        gate: &dyn PerformGate,
        event: &str,
        data: DataBag,
    ) -> ReactorResult<Performed> {
        let Some(action) = self.configured_action() else {
            return Err(ReactorError::UnconfiguredWorker {
                worker: self.name.clone(),
                settings: self.settings(),
            });
        };

        if self.is_deprecated() || !gate.should_perform(self) {
            tracing::debug!(handler = %self.name, event, "perform aborted");
            return Ok(Performed::Aborted);
        }

        let outcome = action
            .call(Event::inbound(event, data))
            .await
            .map_err(|e| ReactorError::Handler {
                handler: self.name.clone(),
                reason: format!("{e:#}"),
            })?;

        match (&self.kind, outcome) {
            (HandlerKind::Event, _) => Ok(Performed::Completed),
            (HandlerKind::Mailer { .. }, Outcome::Done) => Ok(Performed::Undelivered(None)),
            (HandlerKind::Mailer { delivery }, Outcome::Mail(mut message)) => {
                message.set_action_name(format!("{event}_email"));
                match delivery {
                    Some(delivery) if delivery.can_deliver(&message) => {
                        delivery.deliver(&message).await?;
                        tracing::info!(handler = %self.name, event, "mail delivered");
                        Ok(Performed::Delivered(message))
                    }
                    _ => Ok(Performed::Undelivered(Some(message))),
                }
            }
        }
    }

    fn configured_action(&self) -> Option<&Action> {
        if self.is_configured() {
            self.action.as_ref()
        } else {
            None
        }
    }
}
