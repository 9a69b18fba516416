//! 单元测试共用的实体与协作方替身
//!
use crate::{
    error::{ReactorError, ReactorResult},
    queue::{Job, JobId, JobQueue, ScheduledJob},
    reference::{Reference, SerializedRecord},
    store::EntityStore,
    worker::{Delivery, MailMessage},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reactor_macros::entity;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[entity(id = u64)]
#[derive(PartialEq)]
pub struct Pet {
    pub id: u64,
    pub name: String,
    pub appointment: Option<DateTime<Utc>>,
}

impl Pet {
    pub fn new(id: u64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            appointment: None,
        }
    }
}

#[entity(id = u64)]
#[derive(PartialEq)]
pub struct Order {
    pub id: u64,
    pub status: Option<String>,
    pub pet_id: Option<u64>,
}

impl Order {
    pub fn new(id: u64, pet_id: Option<u64>) -> Self {
        Self {
            id,
            status: Some("pending".to_string()),
            pet_id,
        }
    }
}

#[derive(Default)]
pub struct SpyQueue {
    ready: Mutex<Vec<Job>>,
    scheduled: Mutex<Vec<ScheduledJob>>,
    seq: AtomicUsize,
}

impl SpyQueue {
    pub fn ready(&self) -> Vec<Job> {
        self.ready.lock().unwrap().clone()
    }

    pub fn scheduled(&self) -> Vec<ScheduledJob> {
        self.scheduled.lock().unwrap().clone()
    }

    fn next_id(&self) -> JobId {
        JobId::new(self.seq.fetch_add(1, Ordering::SeqCst).to_string())
    }
}

#[async_trait]
impl JobQueue for SpyQueue {
    async fn enqueue_now(&self, job: Job) -> ReactorResult<JobId> {
        self.ready.lock().unwrap().push(job);
        Ok(self.next_id())
    }

    async fn enqueue_at(&self, at: DateTime<Utc>, job: Job) -> ReactorResult<JobId> {
        let id = self.next_id();
        self.scheduled.lock().unwrap().push(ScheduledJob {
            id: id.clone(),
            job,
            scheduled_at: at,
        });
        Ok(id)
    }

    async fn scan_scheduled(&self) -> ReactorResult<Vec<ScheduledJob>> {
        Ok(self.scheduled())
    }

    async fn cancel(&self, id: &JobId) -> ReactorResult<bool> {
        let mut scheduled = self.scheduled.lock().unwrap();
        let before = scheduled.len();
        scheduled.retain(|s| &s.id != id);
        Ok(scheduled.len() != before)
    }
}

#[derive(Default)]
pub struct SpyStore {
    records: Mutex<HashMap<Reference, SerializedRecord>>,
    finds: AtomicUsize,
}

impl SpyStore {
    pub fn put<E: crate::entity::Entity>(&self, entity: &E) {
        let record = SerializedRecord::from_entity(entity).unwrap();
        self.records
            .lock()
            .unwrap()
            .insert(record.reference(), record);
    }

    pub fn remove(&self, reference: &Reference) {
        self.records.lock().unwrap().remove(reference);
    }

    pub fn finds(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityStore for SpyStore {
    async fn find(&self, reference: &Reference) -> ReactorResult<SerializedRecord> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .unwrap()
            .get(reference)
            .cloned()
            .ok_or_else(|| ReactorError::not_found(reference.record_type(), reference.record_id()))
    }
}

#[derive(Default)]
pub struct SpyDelivery {
    sent: Mutex<Vec<MailMessage>>,
}

impl SpyDelivery {
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Delivery for SpyDelivery {
    async fn deliver(&self, message: &MailMessage) -> ReactorResult<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}
