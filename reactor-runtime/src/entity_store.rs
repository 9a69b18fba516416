//! 进程内实体存储与仓储
//!
//! `EntityRepository` 封装“加载旧值 → 保存新值 → 触发提交钩子”的流程，
//! 以 `Change` 的形式把前后快照交给 `Reactor`。
//!
use async_trait::async_trait;
use dashmap::DashMap;
use reactor_core::{
    entity::{Change, Entity},
    error::{ReactorError, ReactorResult},
    reactor::Reactor,
    reference::{Reference, SerializedRecord},
    store::EntityStore,
};
use std::marker::PhantomData;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    records: DashMap<Reference, SerializedRecord>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存记录，返回被替换的旧记录
    pub fn insert(&self, record: SerializedRecord) -> Option<SerializedRecord> {
        self.records.insert(record.reference(), record)
    }

    pub fn remove(&self, reference: &Reference) -> Option<SerializedRecord> {
        self.records.remove(reference).map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn find(&self, reference: &Reference) -> ReactorResult<SerializedRecord> {
        self.records
            .get(reference)
            .map(|r| r.value().clone())
            .ok_or_else(|| ReactorError::not_found(reference.record_type(), reference.record_id()))
    }
}

/// 面向单一实体类型的仓储
pub struct EntityRepository<E>
where
    E: Entity,
{
    store: Arc<InMemoryEntityStore>,
    reactor: Arc<Reactor>,
    _marker: PhantomData<E>,
}

impl<E> EntityRepository<E>
where
    E: Entity,
{
    pub fn new(store: Arc<InMemoryEntityStore>, reactor: Arc<Reactor>) -> Self {
        Self {
            store,
            reactor,
            _marker: PhantomData,
        }
    }

    pub async fn find(&self, id: &E::Id) -> ReactorResult<E> {
        let reference = Reference::new(E::TYPE, id.to_string());
        self.store.find(&reference).await?.to_entity()
    }

    /// 保存新实体并触发创建与提交钩子
    pub async fn create(&self, entity: E) -> ReactorResult<()> {
        self.store.insert(SerializedRecord::from_entity(&entity)?);
        self.reactor.committed(&Change::created(entity)).await
    }

    /// 保存已有实体并以旧值为基准触发提交钩子；实体不存在时返回 `NotFound`
    pub async fn update(&self, entity: E) -> ReactorResult<()> {
        let previous: E = self.store.find(&Reference::of(&entity)).await?.to_entity()?;
        self.store.insert(SerializedRecord::from_entity(&entity)?);
        self.reactor
            .committed(&Change::updated(previous, entity))
            .await
    }

    /// 读取、修改并保存
    pub async fn modify<F>(&self, id: &E::Id, f: F) -> ReactorResult<()>
    where
        F: FnOnce(&mut E),
    {
        let mut entity = self.find(id).await?;
        f(&mut entity);
        self.update(entity).await
    }

    pub fn delete(&self, id: &E::Id) -> Option<SerializedRecord> {
        self.store.remove(&Reference::new(E::TYPE, id.to_string()))
    }
}
