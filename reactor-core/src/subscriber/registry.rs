//! 静态订阅注册表（SubscriberRegistry）
//!
//! 启动时通过 `SubscriberRegistryBuilder` 一次性构建，之后只读：
//! - 事件名或通配符 `*` → 有序的处理单元列表；
//! - 单元名 → 处理单元，用于任务路由。
//!
use super::{Declaration, WILDCARD};
use crate::worker::{HandlerKind, HandlerUnit, Source};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct SubscriberRegistry {
    by_event: HashMap<String, Vec<Arc<HandlerUnit>>>,
    by_name: HashMap<String, Arc<HandlerUnit>>,
}

impl SubscriberRegistry {
    pub fn builder() -> SubscriberRegistryBuilder {
        SubscriberRegistryBuilder::default()
    }

    /// 精确匹配在前、通配符在后，按单元名去重（保留先出现者）
    pub fn matching(&self, event: &str) -> Vec<Arc<HandlerUnit>> {
        let mut seen = HashSet::new();
        let mut merged: Vec<Arc<HandlerUnit>> = Vec::new();
        let exact = self.handlers_for(event);
        let wildcard = if event == WILDCARD {
            &[][..]
        } else {
            self.handlers_for(WILDCARD)
        };
        for unit in exact.iter().chain(wildcard) {
            if seen.insert(unit.name()) {
                merged.push(unit.clone());
            }
        }
        merged
    }

    /// 仅返回精确登记在该名称下的单元
    pub fn handlers_for(&self, event: &str) -> &[Arc<HandlerUnit>] {
        self.by_event.get(event).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn unit(&self, name: &str) -> Option<&Arc<HandlerUnit>> {
        self.by_name.get(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct SubscriberRegistryBuilder {
    by_event: HashMap<String, Vec<Arc<HandlerUnit>>>,
    by_name: HashMap<String, Arc<HandlerUnit>>,
}

impl SubscriberRegistryBuilder {
    /// 以声明方开始一组订阅
    pub fn declare<S: Source>(&mut self, source: Arc<S>) -> Declaration<'_, S> {
        Declaration::new(self, source, HandlerKind::Event)
    }

    /// 登记一个处理单元；名称冲突时追加序号
    pub fn register(&mut self, events: &[&str], unit: HandlerUnit) -> Arc<HandlerUnit> {
        let name = self.unique_name(unit.name());
        let unit = Arc::new(unit.renamed(name.clone()));
        for event in events {
            self.by_event
                .entry(event.to_string())
                .or_default()
                .push(unit.clone());
        }
        tracing::debug!(handler = %name, ?events, "subscriber registered");
        self.by_name.insert(name, unit.clone());
        unit
    }

    fn unique_name(&self, base: &str) -> String {
        if !self.by_name.contains_key(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base}{n}"))
            .find(|candidate| !self.by_name.contains_key(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    pub fn build(self) -> SubscriberRegistry {
        SubscriberRegistry {
            by_event: self.by_event,
            by_name: self.by_name,
        }
    }
}
