//! 任务执行器（JobWorker）
//!
//! 周期性地：
//! - 将到期的定时任务提升到就绪队列；
//! - 按批次执行就绪任务，失败时按任务的重试选项延迟重新入队；
//! - 提供关闭与等待的 `WorkerHandle`。
//!
use crate::job_queue::InMemoryJobQueue;
use bon::Builder;
use chrono::Utc;
use reactor_core::queue::{Job, JobQueue};
use reactor_core::reactor::Reactor;
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct JobWorkerConfig {
    pub poll_interval: Duration,
    pub batch_size: usize,
    pub retry_backoff: Duration,
    /// 单个任务最多执行的次数（含首次）
    pub max_attempts: u32,
}

impl Default for JobWorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            batch_size: 32,
            retry_backoff: Duration::from_secs(30),
            max_attempts: 25,
        }
    }
}

#[derive(Builder)]
pub struct JobWorker {
    queue: Arc<InMemoryJobQueue>,
    reactor: Arc<Reactor>,
    #[builder(default)]
    config: JobWorkerConfig,
}

impl JobWorker {
    /// 执行一轮：提升到期任务并处理至多 `batch_size` 个就绪任务，返回处理数量
    pub async fn tick(&self) -> usize {
        let promoted = self.queue.promote_due(Utc::now());
        if promoted > 0 {
            tracing::debug!(promoted, "scheduled jobs promoted");
        }

        let mut processed = 0;
        while processed < self.config.batch_size {
            let Some(job) = self.queue.pop_ready() else {
                break;
            };
            self.run(job).await;
            processed += 1;
        }
        processed
    }

    async fn run(&self, job: Job) {
        let err = match self.reactor.perform_job(&job).await {
            Ok(outcome) => {
                tracing::debug!(class = job.class(), event = job.event(), ?outcome, "job performed");
                return;
            }
            Err(err) => err,
        };

        let job = job.failed_once();
        if !(job.retry() && err.is_retryable()) {
            tracing::error!(class = job.class(), event = job.event(), error = %err, "job failed");
            return;
        }
        if job.attempts() >= self.config.max_attempts {
            tracing::error!(
                class = job.class(),
                event = job.event(),
                attempts = job.attempts(),
                error = %err,
                "job failed, retries exhausted"
            );
            return;
        }

        tracing::warn!(
            class = job.class(),
            event = job.event(),
            error = %err,
            attempts = job.attempts(),
            backoff = ?self.config.retry_backoff,
            "job failed, retrying"
        );
        let class = job.class().to_string();
        if let Err(requeue) = self.queue.enqueue_in(self.config.retry_backoff, job).await {
            tracing::error!(class, error = %requeue, "job retry could not be scheduled");
        }
    }

    /// 启动执行器，返回可用于关闭/等待的句柄
    pub fn start(self: Arc<Self>) -> WorkerHandle {
        let token = CancellationToken::new();
        let interval = self.config.poll_interval;

        let task = Self::spawn_periodic(token.clone(), interval, move || {
            let worker = self.clone();
            async move {
                worker.tick().await;
            }
        });

        WorkerHandle {
            token,
            tasks: vec![task],
        }
    }

    fn spawn_periodic<F, Fut>(token: CancellationToken, interval: Duration, mut f: F) -> JoinHandle<()>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => f().await,
                }
            }
        })
    }
}

/// 执行器运行句柄：用于优雅关闭与等待任务结束
pub struct WorkerHandle {
    token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub async fn join(mut self) {
        let tasks = std::mem::take(&mut self.tasks);

        for t in tasks {
            let _ = t.await;
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity_store::InMemoryEntityStore;
    use reactor_core::bag::DataBag;
    use reactor_core::reference::Reference;
    use reactor_core::subscriber::SubscriberRegistry;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Bell {
        rings: AtomicUsize,
        fail: bool,
    }

    fn setup(fail: bool, retry: bool) -> (Arc<InMemoryJobQueue>, Arc<Bell>, Arc<Reactor>) {
        let queue = Arc::new(InMemoryJobQueue::new());
        let bell = Arc::new(Bell {
            rings: AtomicUsize::new(0),
            fail,
        });

        let mut builder = SubscriberRegistry::builder();
        builder
            .declare(bell.clone())
            .on_event("rang")
            .retry(retry)
            .run(|bell: Arc<Bell>, _event| async move {
                bell.rings.fetch_add(1, Ordering::SeqCst);
                if bell.fail {
                    anyhow::bail!("bell is broken");
                }
                Ok(reactor_core::worker::Outcome::Done)
            });

        let reactor = Reactor::builder()
            .job_queue(queue.clone())
            .entity_store(Arc::new(InMemoryEntityStore::new()))
            .subscribers(Arc::new(builder.build()))
            .environment(Arc::new(reactor_core::environment::StaticEnvironment::default()))
            .build();
        (queue, bell, Arc::new(reactor))
    }

    impl reactor_core::worker::Source for Bell {
        fn source_name(&self) -> &str {
            "Bell"
        }
    }

    #[tokio::test]
    async fn tick_runs_event_and_handler_jobs() {
        let (queue, bell, reactor) = setup(false, true);
        reactor.publish("rang", DataBag::new()).await.unwrap();

        let worker = JobWorker::builder()
            .queue(queue.clone())
            .reactor(reactor)
            .build();

        assert_eq!(worker.tick().await, 2);
        assert_eq!(bell.rings.load(Ordering::SeqCst), 1);
        assert!(queue.ready_jobs().is_empty());
    }

    #[tokio::test]
    async fn failed_handler_is_retried_after_backoff() {
        let (queue, bell, reactor) = setup(true, true);
        reactor.publish("rang", DataBag::new()).await.unwrap();

        let worker = JobWorker::builder()
            .queue(queue.clone())
            .reactor(reactor)
            .build();

        let before = Utc::now();
        worker.tick().await;
        assert_eq!(bell.rings.load(Ordering::SeqCst), 1);

        let scheduled = queue.scheduled_jobs();
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].job.class(), "StaticSubscribers::Bell::RangHandler");
        assert!(scheduled[0].scheduled_at >= before + chrono::Duration::seconds(30));
        assert_eq!(scheduled[0].job.attempts(), 1);
    }

    #[tokio::test]
    async fn retries_stop_after_max_attempts() {
        let (queue, bell, reactor) = setup(true, true);
        reactor.publish("rang", DataBag::new()).await.unwrap();

        let worker = JobWorker::builder()
            .queue(queue.clone())
            .reactor(reactor)
            .config(JobWorkerConfig {
                retry_backoff: Duration::ZERO,
                max_attempts: 3,
                ..JobWorkerConfig::default()
            })
            .build();

        for _ in 0..10 {
            worker.tick().await;
        }
        assert_eq!(bell.rings.load(Ordering::SeqCst), 3);
        assert!(queue.scheduled_jobs().is_empty());
        assert!(queue.ready_jobs().is_empty());
    }

    #[tokio::test]
    async fn event_job_for_a_vanished_actor_is_dropped() {
        let (queue, bell, reactor) = setup(false, true);
        let mut data = DataBag::new();
        Reference::new("Pet", "404").write(&mut data, "actor");
        reactor.publish("rang", data).await.unwrap();

        let worker = JobWorker::builder()
            .queue(queue.clone())
            .reactor(reactor)
            .config(JobWorkerConfig {
                retry_backoff: Duration::ZERO,
                ..JobWorkerConfig::default()
            })
            .build();

        assert_eq!(worker.tick().await, 1);
        assert_eq!(worker.tick().await, 0);
        assert_eq!(bell.rings.load(Ordering::SeqCst), 0);
        assert!(queue.scheduled_jobs().is_empty());
        assert!(queue.ready_jobs().is_empty());
    }

    #[tokio::test]
    async fn failed_handler_without_retry_is_dropped() {
        let (queue, bell, reactor) = setup(true, false);
        reactor.publish("rang", DataBag::new()).await.unwrap();

        let worker = JobWorker::builder()
            .queue(queue.clone())
            .reactor(reactor)
            .build();

        worker.tick().await;
        assert_eq!(bell.rings.load(Ordering::SeqCst), 1);
        assert!(queue.scheduled_jobs().is_empty());
        assert!(queue.ready_jobs().is_empty());
    }

    #[tokio::test]
    async fn batch_size_bounds_a_tick() {
        let (queue, _bell, reactor) = setup(false, true);
        for _ in 0..3 {
            reactor.publish("rang", DataBag::new()).await.unwrap();
        }

        let worker = JobWorker::builder()
            .queue(queue.clone())
            .reactor(reactor)
            .config(JobWorkerConfig {
                batch_size: 2,
                ..JobWorkerConfig::default()
            })
            .build();

        assert_eq!(worker.tick().await, 2);
        assert_eq!(queue.ready_jobs().len(), 1 + 2);
    }

    #[tokio::test(start_paused = true)]
    async fn started_worker_drains_until_shutdown() {
        let (queue, bell, reactor) = setup(false, true);
        reactor.publish("rang", DataBag::new()).await.unwrap();

        let worker = Arc::new(
            JobWorker::builder()
                .queue(queue.clone())
                .reactor(reactor)
                .build(),
        );
        let handle = worker.start();

        tokio::time::sleep(Duration::from_secs(3)).await;
        handle.shutdown();
        handle.join().await;

        assert_eq!(bell.rings.load(Ordering::SeqCst), 1);
        assert!(queue.ready_jobs().is_empty());
    }
}
