//! 反应堆（Reactor）
//!
//! 串联发布、执行、分发与重新调度：
//! - `publish`：守卫 → 构建出站事件 → 校验 → 立即/定时入队；
//! - `perform`：按 actor 类型重新计算触发条件，为真时盖章并分发；
//! - 分发：精确匹配与通配符订阅的有序并集，逐个按提交策略入队；
//! - `reschedule`：扫描定时集合撤销旧任务，新时间在未来则重新发布；
//! - `after_create/after_commit`：实体提交钩子，驱动发布规则引擎；
//! - `perform_job`：队列执行任务时的统一入口。
//!
use crate::{
    bag::DataBag,
    config::ReactorConfig,
    entity::{Change, Entity},
    environment::{Environment, SystemEnvironment},
    error::{ReactorError, ReactorResult},
    event::{ACTOR, Event, KEY_AT, KEY_IF, KEY_WAS},
    publishable::{Publication, PublisherRegistry},
    queue::{Job, JobId, JobQueue},
    reference::Reference,
    store::EntityStore,
    subscriber::SubscriberRegistry,
    validator::{AcceptAll, EventValidator},
    worker::{AlwaysPerform, PerformGate, Performed},
};
use bon::Builder;
use chrono::Utc;
use std::sync::Arc;

/// 事件执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fired {
    /// 触发条件为假，未通知任何订阅方
    Dropped,
    /// 已分发给订阅方；`handlers` 为实际入队的处理单元数
    Dispatched { handlers: usize },
}

/// 任务执行结果
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Event(Fired),
    Handler(Performed),
}

#[derive(Builder)]
pub struct Reactor {
    job_queue: Arc<dyn JobQueue>,
    entity_store: Arc<dyn EntityStore>,
    #[builder(default)]
    subscribers: Arc<SubscriberRegistry>,
    #[builder(default)]
    publishers: PublisherRegistry,
    #[builder(default = Arc::new(AcceptAll) as Arc<dyn EventValidator>)]
    validator: Arc<dyn EventValidator>,
    #[builder(default = Arc::new(SystemEnvironment::from_env()) as Arc<dyn Environment>)]
    environment: Arc<dyn Environment>,
    #[builder(default = Arc::new(AlwaysPerform) as Arc<dyn PerformGate>)]
    gate: Arc<dyn PerformGate>,
    #[builder(default)]
    config: ReactorConfig,
}

impl Reactor {
    pub fn subscribers(&self) -> &SubscriberRegistry {
        &self.subscribers
    }

    pub fn publishers(&self) -> &PublisherRegistry {
        &self.publishers
    }

    pub fn config(&self) -> &ReactorConfig {
        &self.config
    }

    pub fn job_queue(&self) -> &Arc<dyn JobQueue> {
        &self.job_queue
    }

    pub fn entity_store(&self) -> &Arc<dyn EntityStore> {
        &self.entity_store
    }

    fn confirmation_message(&self) -> String {
        format!(
            "It looks like you are on a production console. Only fire an event if you intend to \
             trigger all of its subscribers. In order to proceed, you must pass `{}: true` in the \
             event data.",
            self.config.confirm_key
        )
    }

    /// 发布事件
    pub async fn publish(&self, name: &str, options: DataBag) -> ReactorResult<JobId> {
        if self.environment.is_interactive_production()
            && !options.is_truthy(self.config.confirm_key.as_str())
        {
            return Err(ReactorError::ConfirmationRequired {
                message: self.confirmation_message(),
            });
        }

        let event = Event::outbound(name, options);
        self.validator.validate(&event).map_err(|e| match e {
            ReactorError::Validation { .. } => e,
            other => ReactorError::Validation {
                reason: other.to_string(),
            },
        })?;

        let lane = self
            .environment
            .queue_override()
            .unwrap_or_else(|| self.config.event_queue().to_string());
        let job = event.to_job(lane);
        let now = Utc::now();

        let id = match event.at()? {
            Some(at) if at > now => self.job_queue.enqueue_at(at, job).await?,
            _ => self.job_queue.enqueue_now(job).await?,
        };

        tracing::info!(
            event = name,
            uuid = event.uuid().unwrap_or_default(),
            job = %id,
            "event published"
        );
        Ok(id)
    }

    /// 以实体为默认 actor 发布
    pub async fn publish_from<E: Entity>(
        &self,
        entity: &E,
        name: &str,
        mut options: DataBag,
    ) -> ReactorResult<JobId> {
        if Reference::read(&options, ACTOR)?.is_none() {
            Reference::of(entity).write(&mut options, ACTOR);
        }
        self.publish(name, options).await
    }

    /// 执行事件任务
    pub async fn perform(&self, name: &str, data: DataBag) -> ReactorResult<Fired> {
        let mut event = Event::inbound(name, data);

        if let Some(record) = event.resolve(ACTOR, self.entity_store.as_ref()).await? {
            let fire = match self.publishers.fire_condition(name, &record) {
                Some(condition) => condition?,
                None => true,
            };
            if !fire {
                tracing::debug!(event = name, actor = %record.reference(), "fire condition false, event dropped");
                return Ok(Fired::Dropped);
            }
        }

        event.stamp_fired(Utc::now());
        let handlers = self.fire_subscribers(&event).await?;
        tracing::debug!(event = name, handlers, "event fired");
        Ok(Fired::Dispatched { handlers })
    }

    async fn fire_subscribers(&self, event: &Event) -> ReactorResult<usize> {
        let lane_override = self.environment.queue_override();
        let mut submitted = 0;
        for unit in self.subscribers.matching(event.name()) {
            let id = unit
                .perform_where_needed(
                    self.job_queue.as_ref(),
                    lane_override.as_deref(),
                    event.name(),
                    event.data(),
                )
                .await?;
            if id.is_some() {
                submitted += 1;
            }
        }
        Ok(submitted)
    }

    /// 撤销 `was` 时刻的旧任务，新 `at` 在未来时重新发布
    pub async fn reschedule(&self, name: &str, options: DataBag) -> ReactorResult<Option<JobId>> {
        let was = options.get_time(KEY_WAS)?;
        let at = options.get_time(KEY_AT)?;

        if let Some(was) = was {
            let actor = Reference::read(&options, ACTOR)?;
            let scheduled = self.job_queue.scan_scheduled().await?;
            let stale = scheduled
                .iter()
                .find(|s| s.matches(Event::JOB_CLASS, name, was, actor.as_ref()));
            if let Some(stale) = stale {
                if self.job_queue.cancel(&stale.id).await? {
                    tracing::debug!(event = name, job = %stale.id, "stale scheduled event cancelled");
                } else {
                    tracing::warn!(event = name, job = %stale.id, "scheduled event vanished before cancel");
                }
            }
        }

        match at {
            Some(at) if at > Utc::now() => {
                let id = self.publish(name, options.without(&[KEY_WAS, KEY_IF])).await?;
                Ok(Some(id))
            }
            _ => Ok(None),
        }
    }

    /// 实体创建后
    pub async fn after_create<E: Entity>(&self, entity: &E) -> ReactorResult<()> {
        let Some(publisher) = self.publishers.get::<E>() else {
            return Ok(());
        };
        let publications = publisher.on_create(entity)?;
        self.apply(publications).await
    }

    /// 实体任意提交后（包括创建）
    pub async fn after_commit<E: Entity>(&self, change: &Change<E>) -> ReactorResult<()> {
        let Some(publisher) = self.publishers.get::<E>() else {
            return Ok(());
        };
        let publications = publisher.on_commit(change)?;
        self.apply(publications).await
    }

    /// 提交钩子的统一入口：创建时两个钩子都执行
    pub async fn committed<E: Entity>(&self, change: &Change<E>) -> ReactorResult<()> {
        if change.is_create() {
            self.after_create(change.after()).await?;
        }
        self.after_commit(change).await
    }

    async fn apply(&self, publications: Vec<Publication>) -> ReactorResult<()> {
        for publication in publications {
            match publication {
                Publication::Publish { name, options } => {
                    self.publish(&name, options).await?;
                }
                Publication::Reschedule { name, options } => {
                    self.reschedule(&name, options).await?;
                }
            }
        }
        Ok(())
    }

    /// 队列执行任务的入口：事件任务转 `perform`，处理单元任务转单元的 `perform`
    pub async fn perform_job(&self, job: &Job) -> ReactorResult<JobOutcome> {
        if job.class() == Event::JOB_CLASS {
            let fired = self.perform(job.event(), job.data().clone()).await?;
            return Ok(JobOutcome::Event(fired));
        }

        let unit = self
            .subscribers
            .unit(job.class())
            .ok_or_else(|| ReactorError::UnknownJob {
                class: job.class().to_string(),
            })?;
        let performed = unit
            .perform(self.gate.as_ref(), job.event(), job.data().clone())
            .await?;
        Ok(JobOutcome::Handler(performed))
    }
}
