//! 进程内任务队列（InMemoryJobQueue）
//!
//! - 就绪队列：先进先出；
//! - 定时集合：`DashMap<JobId, ScheduledJob>`，按时间扫描、按标识取消；
//! - `promote_due` 将到期任务移入就绪队列，`drain` 依次执行直至队列为空。
//!
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use reactor_core::error::ReactorResult;
use reactor_core::queue::{Job, JobId, JobQueue, ScheduledJob};
use reactor_core::reactor::{JobOutcome, Reactor};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct InMemoryJobQueue {
    ready: Mutex<VecDeque<Job>>,
    scheduled: DashMap<JobId, ScheduledJob>,
    seq: AtomicU64,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> JobId {
        // 定长编号，字典序即入队顺序
        JobId::new(format!("{:020}", self.seq.fetch_add(1, Ordering::SeqCst)))
    }

    fn ready_lock(&self) -> MutexGuard<'_, VecDeque<Job>> {
        self.ready.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 就绪任务快照（按入队顺序）
    pub fn ready_jobs(&self) -> Vec<Job> {
        self.ready_lock().iter().cloned().collect()
    }

    /// 定时任务快照（按时间、再按入队顺序）
    pub fn scheduled_jobs(&self) -> Vec<ScheduledJob> {
        let mut jobs: Vec<ScheduledJob> = self.scheduled.iter().map(|e| e.value().clone()).collect();
        jobs.sort_by(|a, b| {
            a.scheduled_at
                .cmp(&b.scheduled_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        jobs
    }

    pub fn pop_ready(&self) -> Option<Job> {
        self.ready_lock().pop_front()
    }

    /// 将 `now` 之前（含）到期的定时任务移入就绪队列，返回移动数量
    pub fn promote_due(&self, now: DateTime<Utc>) -> usize {
        let due: Vec<ScheduledJob> = self
            .scheduled_jobs()
            .into_iter()
            .filter(|s| s.scheduled_at <= now)
            .collect();

        let mut promoted = 0;
        for scheduled in due {
            if let Some((_, scheduled)) = self.scheduled.remove(&scheduled.id) {
                self.ready_lock().push_back(scheduled.job);
                promoted += 1;
            }
        }
        promoted
    }

    /// 依次执行就绪任务（包括执行过程中新入队的），直至就绪队列为空
    pub async fn drain(&self, reactor: &Reactor) -> ReactorResult<Vec<JobOutcome>> {
        let mut outcomes = Vec::new();
        while let Some(job) = self.pop_ready() {
            outcomes.push(reactor.perform_job(&job).await?);
        }
        Ok(outcomes)
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue_now(&self, job: Job) -> ReactorResult<JobId> {
        let id = self.next_id();
        tracing::debug!(class = job.class(), event = job.event(), queue = job.queue(), job = %id, "job enqueued");
        self.ready_lock().push_back(job);
        Ok(id)
    }

    async fn enqueue_at(&self, at: DateTime<Utc>, job: Job) -> ReactorResult<JobId> {
        let id = self.next_id();
        tracing::debug!(class = job.class(), event = job.event(), queue = job.queue(), job = %id, %at, "job scheduled");
        self.scheduled.insert(
            id.clone(),
            ScheduledJob {
                id: id.clone(),
                job,
                scheduled_at: at,
            },
        );
        Ok(id)
    }

    async fn scan_scheduled(&self) -> ReactorResult<Vec<ScheduledJob>> {
        Ok(self.scheduled_jobs())
    }

    async fn cancel(&self, id: &JobId) -> ReactorResult<bool> {
        Ok(self.scheduled.remove(id).is_some())
    }
}
