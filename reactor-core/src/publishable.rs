//! 发布规则引擎（Publisher）
//!
//! 实体类型以规则声明自己在生命周期中发布哪些事件：
//! - 无 `watch` 的规则只在创建时发布；
//! - 有 `watch` 的规则在任意提交中、且被观察属性确实变化时发布，
//!   若同时声明了 `at`，则改为重新调度（撤销旧时间点的任务后按新时间发布）；
//! - `enqueue_if` 在发布侧求值，`fire_if` 在事件执行时针对最新实体重新求值。
//!
//! 引擎只计算需要做什么（`Publication`），真正的入队由 `Reactor` 完成。
//!
use crate::{
    bag::DataBag,
    entity::{Change, Entity},
    error::ReactorResult,
    event::{ACTOR, KEY_AT, KEY_WAS, TARGET},
    reference::{Reference, SerializedRecord},
    resolver::Resolver,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::{any::Any, collections::HashMap, sync::Arc};

type TimeResolver<E> = Resolver<E, Option<DateTime<Utc>>>;

/// 单条发布规则，以事件名为键
#[derive(Debug, Clone)]
pub struct PublishRule<E> {
    name: String,
    actor: Option<Resolver<E, Option<Reference>>>,
    target: bool,
    at: Option<TimeResolver<E>>,
    fire_if: Option<Resolver<E, bool>>,
    enqueue_if: Option<Resolver<E, bool>>,
    watch: Option<String>,
    data: DataBag,
}

impl<E: Entity> PublishRule<E> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actor: None,
            target: false,
            at: None,
            fire_if: None,
            enqueue_if: None,
            watch: None,
            data: DataBag::new(),
        }
    }

    /// 事件的 actor；未声明或求值为空时为实体自身
    pub fn actor(mut self, resolver: impl Into<Resolver<E, Option<Reference>>>) -> Self {
        self.actor = Some(resolver.into());
        self
    }

    /// 以实体自身作为 target
    pub fn target_self(mut self) -> Self {
        self.target = true;
        self
    }

    pub fn at(mut self, resolver: impl Into<TimeResolver<E>>) -> Self {
        self.at = Some(resolver.into());
        self
    }

    /// 执行时的触发条件
    pub fn fire_if(mut self, resolver: impl Into<Resolver<E, bool>>) -> Self {
        self.fire_if = Some(resolver.into());
        self
    }

    /// 发布时的入队条件
    pub fn enqueue_if(mut self, resolver: impl Into<Resolver<E, bool>>) -> Self {
        self.enqueue_if = Some(resolver.into());
        self
    }

    pub fn watch(mut self, attribute: impl Into<String>) -> Self {
        self.watch = Some(attribute.into());
        self
    }

    /// 随事件一并发布的静态数据
    pub fn data(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.set(key, value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn watched(&self) -> Option<&str> {
        self.watch.as_deref()
    }

    pub fn has_fire_condition(&self) -> bool {
        self.fire_if.is_some()
    }

    fn should_enqueue(&self, entity: &E) -> ReactorResult<bool> {
        match &self.enqueue_if {
            Some(resolver) => resolver.evaluate(entity),
            None => Ok(true),
        }
    }

    fn resolve_at(&self, entity: &E) -> ReactorResult<Option<DateTime<Utc>>> {
        match &self.at {
            Some(resolver) => resolver.evaluate(entity),
            None => Ok(None),
        }
    }

    /// 计算发布选项：静态数据 + actor + target + at
    pub fn resolve(&self, entity: &E) -> ReactorResult<DataBag> {
        let mut options = self.data.clone();

        let actor = match &self.actor {
            Some(resolver) => resolver.evaluate(entity)?,
            None => None,
        };
        actor
            .unwrap_or_else(|| Reference::of(entity))
            .write(&mut options, ACTOR);

        if self.target {
            Reference::of(entity).write(&mut options, TARGET);
        }

        if let Some(at) = self.resolve_at(entity)? {
            options.set_time(KEY_AT, at);
        }

        Ok(options)
    }

    /// 针对最新实体计算触发条件；未声明时为真
    pub fn should_fire(&self, entity: &E) -> ReactorResult<bool> {
        match &self.fire_if {
            Some(resolver) => resolver.evaluate(entity),
            None => Ok(true),
        }
    }
}

/// 规则引擎的产出
#[derive(Debug, Clone, PartialEq)]
pub enum Publication {
    Publish { name: String, options: DataBag },
    /// `options` 携带 `at`（可缺省）与 `was`（可缺省）
    Reschedule { name: String, options: DataBag },
}

impl Publication {
    pub fn name(&self) -> &str {
        match self {
            Self::Publish { name, .. } | Self::Reschedule { name, .. } => name,
        }
    }
}

/// 某一实体类型的全部发布规则
#[derive(Debug, Clone)]
pub struct Publisher<E> {
    rules: Vec<PublishRule<E>>,
}

impl<E> Default for Publisher<E> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<E: Entity> Publisher<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 声明规则；同名规则被替换
    pub fn publishes(mut self, rule: PublishRule<E>) -> Self {
        match self.rules.iter_mut().find(|r| r.name == rule.name) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
        self
    }

    pub fn rule(&self, name: &str) -> Option<&PublishRule<E>> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn rules(&self) -> &[PublishRule<E>] {
        &self.rules
    }

    /// 创建后：所有无 `watch` 的规则
    pub fn on_create(&self, entity: &E) -> ReactorResult<Vec<Publication>> {
        let mut out = Vec::new();
        for rule in self.rules.iter().filter(|r| r.watch.is_none()) {
            if !rule.should_enqueue(entity)? {
                tracing::debug!(event = %rule.name, "enqueue_if rejected publication");
                continue;
            }
            out.push(Publication::Publish {
                name: rule.name.clone(),
                options: rule.resolve(entity)?,
            });
        }
        Ok(out)
    }

    /// 任意提交后：所有有 `watch` 且被观察属性变化的规则
    pub fn on_commit(&self, change: &Change<E>) -> ReactorResult<Vec<Publication>> {
        let entity = change.after();
        let mut out = Vec::new();
        for rule in &self.rules {
            let Some(watch) = rule.watch.as_deref() else {
                continue;
            };
            if !change.changed(watch) {
                continue;
            }
            if !rule.should_enqueue(entity)? {
                tracing::debug!(event = %rule.name, watch, "enqueue_if rejected publication");
                continue;
            }

            let mut options = rule.resolve(entity)?;
            if rule.at.is_none() {
                out.push(Publication::Publish {
                    name: rule.name.clone(),
                    options,
                });
                continue;
            }

            let was = match change.before() {
                Some(before) => rule.resolve_at(before)?,
                None => None,
            };
            if let Some(was) = was {
                options.set_time(KEY_WAS, was);
            }
            out.push(Publication::Reschedule {
                name: rule.name.clone(),
                options,
            });
        }
        Ok(out)
    }
}

/// 擦除实体类型后的规则集，供执行侧按 actor 类型查找触发条件
pub trait ErasedPublisher: Send + Sync {
    fn as_any(&self) -> &dyn Any;

    /// 事件未声明触发条件时返回 `None`
    fn fire_condition(&self, event: &str, record: &SerializedRecord) -> Option<ReactorResult<bool>>;
}

impl<E: Entity> ErasedPublisher for Publisher<E> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn fire_condition(&self, event: &str, record: &SerializedRecord) -> Option<ReactorResult<bool>> {
        let rule = self.rule(event).filter(|r| r.has_fire_condition())?;
        Some(
            record
                .to_entity::<E>()
                .and_then(|entity| rule.should_fire(&entity)),
        )
    }
}

/// 实体类型名 → 规则集
#[derive(Clone, Default)]
pub struct PublisherRegistry {
    by_type: HashMap<&'static str, Arc<dyn ErasedPublisher>>,
}

impl PublisherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<E: Entity>(mut self, publisher: Publisher<E>) -> Self {
        self.by_type.insert(E::TYPE, Arc::new(publisher));
        self
    }

    pub fn get<E: Entity>(&self) -> Option<&Publisher<E>> {
        self.by_type
            .get(E::TYPE)
            .and_then(|p| p.as_any().downcast_ref::<Publisher<E>>())
    }

    pub fn fire_condition(
        &self,
        event: &str,
        record: &SerializedRecord,
    ) -> Option<ReactorResult<bool>> {
        self.by_type
            .get(record.record_type())
            .and_then(|p| p.fire_condition(event, record))
    }
}

impl std::fmt::Debug for PublisherRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.by_type.keys()).finish()
    }
}
