//! 任务队列契约（JobQueue）
//!
//! 核心只依赖四种能力：立即入队、定时入队、扫描定时集合、取消定时任务。
//! 任务以 `class` 区分路由：事件任务为 `Event::JOB_CLASS`，处理单元任务为单元名。
//!
use crate::{bag::DataBag, error::ReactorResult, reference::Reference};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

/// 队列内任务标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 入队的任务：`class` + 参数 `(event, data)` + 队列选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    class: String,
    queue: String,
    retry: bool,
    event: String,
    data: DataBag,
    /// 已失败次数
    #[serde(default)]
    attempts: u32,
}

impl Job {
    pub fn new(class: impl Into<String>, event: impl Into<String>, data: DataBag) -> Self {
        Self {
            class: class.into(),
            queue: crate::config::DEFAULT_QUEUE.to_string(),
            retry: true,
            event: event.into(),
            data,
            attempts: 0,
        }
    }

    pub fn on_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = queue.into();
        self
    }

    pub fn with_retry(mut self, retry: bool) -> Self {
        self.retry = retry;
        self
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn retry(&self) -> bool {
        self.retry
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// 记一次失败，返回用于重新入队的任务
    pub fn failed_once(mut self) -> Self {
        self.attempts = self.attempts.saturating_add(1);
        self
    }

    /// 第一个参数：事件名
    pub fn event(&self) -> &str {
        &self.event
    }

    /// 第二个参数：数据包
    pub fn data(&self) -> &DataBag {
        &self.data
    }
}

/// 定时集合中的一项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub id: JobId,
    pub job: Job,
    pub scheduled_at: DateTime<Utc>,
}

impl ScheduledJob {
    /// 是否为给定事件在 `was` 时刻（按整秒比较）安排的任务；
    /// 传入 `actor` 时还要求任务数据中的 actor 一致
    pub fn matches(
        &self,
        class: &str,
        event: &str,
        was: DateTime<Utc>,
        actor: Option<&Reference>,
    ) -> bool {
        if self.job.class() != class || self.job.event() != event {
            return false;
        }
        if self.scheduled_at.timestamp() != was.timestamp() {
            return false;
        }
        match actor {
            None => true,
            Some(actor) => matches!(
                Reference::read(self.job.data(), "actor"),
                Ok(Some(found)) if &found == actor
            ),
        }
    }
}

/// 异步任务队列
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue_now(&self, job: Job) -> ReactorResult<JobId>;

    async fn enqueue_at(&self, at: DateTime<Utc>, job: Job) -> ReactorResult<JobId>;

    async fn enqueue_in(&self, delay: Duration, job: Job) -> ReactorResult<JobId> {
        let delay = chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::MAX);
        let at = Utc::now().checked_add_signed(delay).unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.enqueue_at(at, job).await
    }

    /// 当前尚未出队的定时任务
    async fn scan_scheduled(&self) -> ReactorResult<Vec<ScheduledJob>>;

    /// 取消定时任务；任务已不存在时返回 `false`
    async fn cancel(&self, id: &JobId) -> ReactorResult<bool>;
}
