//! 事件（Event）
//!
//! 事件的全部属性（`event`、`name`、`uuid`、`at`、`fired_at` 以及 `actor`/`target` 引用）
//! 都保存在数据包中，以便原样穿过任务队列。
//! 出站事件（发布侧）与入站事件（执行侧）由两个构造函数分别创建，
//! `fired_at` 只会在入站实例上盖章。
//!
use crate::{
    bag::{BagKey, DataBag},
    entity::Entity,
    error::{ReactorError, ReactorResult},
    queue::Job,
    reference::{Reference, SerializedRecord},
    store::EntityStore,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

pub const KEY_EVENT: &str = "event";
pub const KEY_NAME: &str = "name";
pub const KEY_UUID: &str = "uuid";
pub const KEY_AT: &str = "at";
pub const KEY_WAS: &str = "was";
pub const KEY_IF: &str = "if";
pub const KEY_FIRED_AT: &str = "fired_at";
pub const ACTOR: &str = "actor";
pub const TARGET: &str = "target";

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    name: String,
    data: DataBag,
}

impl Event {
    /// 事件任务的 class
    pub const JOB_CLASS: &'static str = "Reactor::Event";

    /// 出站事件：在选项之上写入 `event` 与新的 `uuid`
    pub fn outbound(name: impl Into<String>, options: DataBag) -> Self {
        let name = name.into();
        let mut data = options;
        data.set(KEY_EVENT, name.clone());
        data.set(KEY_UUID, Uuid::new_v4().to_string());
        Self { name, data }
    }

    /// 入站事件：直接包装队列传入的数据包
    pub fn inbound(name: impl Into<String>, data: DataBag) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uuid(&self) -> Option<&str> {
        self.data.get_str(KEY_UUID)
    }

    pub fn at(&self) -> ReactorResult<Option<DateTime<Utc>>> {
        self.data.get_time(KEY_AT)
    }

    pub fn fired_at(&self) -> ReactorResult<Option<DateTime<Utc>>> {
        self.data.get_time(KEY_FIRED_AT)
    }

    /// 确认触发后盖章
    pub(crate) fn stamp_fired(&mut self, now: DateTime<Utc>) {
        self.data.set_time(KEY_FIRED_AT, now);
        self.data.set(KEY_NAME, self.name.clone());
    }

    pub fn get(&self, key: impl BagKey) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn set(&mut self, key: impl BagKey, value: impl Into<Value>) -> Option<Value> {
        self.data.set(key, value)
    }

    pub fn set_reference(&mut self, field: &str, reference: &Reference) {
        reference.write(&mut self.data, field);
    }

    pub fn reference(&self, field: &str) -> ReactorResult<Option<Reference>> {
        Reference::read(&self.data, field)
    }

    pub fn actor(&self) -> ReactorResult<Option<Reference>> {
        self.reference(ACTOR)
    }

    pub fn target(&self) -> ReactorResult<Option<Reference>> {
        self.reference(TARGET)
    }

    /// 读取引用字段并向存储重新查询；字段缺失时返回 `None`
    pub async fn resolve(
        &self,
        field: &str,
        store: &dyn EntityStore,
    ) -> ReactorResult<Option<SerializedRecord>> {
        match self.reference(field)? {
            Some(reference) => Ok(Some(reference.resolve(store).await?)),
            None => Ok(None),
        }
    }

    /// 读取引用字段并反序列化为实体
    pub async fn resolve_as<E: Entity>(
        &self,
        field: &str,
        store: &dyn EntityStore,
    ) -> ReactorResult<Option<E>> {
        match self.resolve(field, store).await? {
            Some(record) => Ok(Some(record.to_entity()?)),
            None => Ok(None),
        }
    }

    pub fn data(&self) -> &DataBag {
        &self.data
    }

    pub fn into_data(self) -> DataBag {
        self.data
    }

    /// 构造事件任务
    pub fn to_job(&self, queue: impl Into<String>) -> Job {
        Job::new(Self::JOB_CLASS, self.name.clone(), self.data.clone()).on_queue(queue)
    }

    /// 读取必需的字符串字段
    pub fn require_str(&self, key: &str) -> ReactorResult<&str> {
        self.data.get_str(key).ok_or_else(|| ReactorError::Parse {
            reason: format!("event {} carries no string '{key}'", self.name),
        })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
