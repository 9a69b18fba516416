#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use reactor_core::environment::{Environment, StaticEnvironment};
use reactor_core::publishable::PublisherRegistry;
use reactor_core::reactor::Reactor;
use reactor_core::subscriber::SubscriberRegistry;
use reactor_core::worker::PerformGate;
use reactor_macros::entity;
use reactor_runtime::{EntityRepository, InMemoryEntityStore, InMemoryJobQueue};
use std::sync::Arc;

#[entity(id = u64)]
#[derive(PartialEq)]
pub struct Pet {
    pub name: String,
    pub awake: bool,
}

impl Pet {
    pub fn new(id: u64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            awake: true,
        }
    }
}

#[entity(id = u64)]
pub struct Appointment {
    pub pet_id: u64,
    pub start_at: Option<DateTime<Utc>>,
}

#[entity(id = u64)]
pub struct Order {
    pub status: Option<String>,
}

/// 整秒时刻，`offset` 为相对当前的秒数
pub fn seconds_from_now(offset: i64) -> DateTime<Utc> {
    let secs = Utc::now().timestamp() + offset;
    Utc.timestamp_opt(secs, 0)
        .single()
        .expect("valid timestamp")
}

pub struct Harness {
    pub queue: Arc<InMemoryJobQueue>,
    pub store: Arc<InMemoryEntityStore>,
    pub reactor: Arc<Reactor>,
}

pub struct HarnessBuilder {
    subscribers: SubscriberRegistry,
    publishers: PublisherRegistry,
    environment: Arc<dyn Environment>,
    gate: Option<Arc<dyn PerformGate>>,
}

impl HarnessBuilder {
    pub fn subscribers(mut self, subscribers: SubscriberRegistry) -> Self {
        self.subscribers = subscribers;
        self
    }

    pub fn publishers(mut self, publishers: PublisherRegistry) -> Self {
        self.publishers = publishers;
        self
    }

    pub fn environment(mut self, environment: StaticEnvironment) -> Self {
        self.environment = Arc::new(environment);
        self
    }

    pub fn gate(mut self, gate: Arc<dyn PerformGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn build(self) -> Harness {
        let queue = Arc::new(InMemoryJobQueue::new());
        let store = Arc::new(InMemoryEntityStore::new());
        let reactor = Reactor::builder()
            .job_queue(queue.clone())
            .entity_store(store.clone())
            .subscribers(Arc::new(self.subscribers))
            .publishers(self.publishers)
            .environment(self.environment)
            .maybe_gate(self.gate)
            .build();
        Harness {
            queue,
            store,
            reactor: Arc::new(reactor),
        }
    }
}

impl Harness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder {
            subscribers: SubscriberRegistry::default(),
            publishers: PublisherRegistry::default(),
            environment: Arc::new(StaticEnvironment::default()),
            gate: None,
        }
    }

    pub fn repository<E: reactor_core::entity::Entity>(&self) -> EntityRepository<E> {
        EntityRepository::new(self.store.clone(), self.reactor.clone())
    }

    /// 就绪队列中各任务的事件名
    pub fn ready_events(&self) -> Vec<String> {
        self.queue
            .ready_jobs()
            .iter()
            .map(|job| job.event().to_string())
            .collect()
    }

    /// 就绪队列中各任务的类名
    pub fn ready_classes(&self) -> Vec<String> {
        self.queue
            .ready_jobs()
            .iter()
            .map(|job| job.class().to_string())
            .collect()
    }
}
