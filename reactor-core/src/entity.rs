//! 实体（Entity）与提交变更（Change）
//!
//! 实体是发布规则的求值对象：具备稳定的类型名与标识，
//! 并可按名称读取零参数属性（默认取序列化后的同名字段）。
//! 变更检测由调用方以 `Change` 的形式提供（变更前/后两份快照）。
//!
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fmt::Display;
use std::str::FromStr;

/// 实体：具备类型名与唯一标识的可序列化记录
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    type Id: FromStr + Clone + Display + Send + Sync;

    const TYPE: &'static str;

    fn id(&self) -> &Self::Id;

    /// 按名称读取属性，`null` 视为缺省
    fn read(&self, name: &str) -> Option<Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut fields)) => fields.remove(name).filter(|v| !v.is_null()),
            _ => None,
        }
    }
}

/// 单个属性的变更，包含旧值与新值
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeChange {
    pub old: Option<Value>,
    pub new: Option<Value>,
}

impl AttributeChange {
    pub fn is_changed(&self) -> bool {
        self.old != self.new
    }
}

/// 一次提交的前后快照；`before` 为空表示创建
#[derive(Debug, Clone)]
pub struct Change<E> {
    before: Option<E>,
    after: E,
}

impl<E: Entity> Change<E> {
    pub fn created(after: E) -> Self {
        Self {
            before: None,
            after,
        }
    }

    pub fn updated(before: E, after: E) -> Self {
        Self {
            before: Some(before),
            after,
        }
    }

    pub fn before(&self) -> Option<&E> {
        self.before.as_ref()
    }

    pub fn after(&self) -> &E {
        &self.after
    }

    pub fn into_after(self) -> E {
        self.after
    }

    pub fn is_create(&self) -> bool {
        self.before.is_none()
    }

    /// 指定属性的前后值
    pub fn attribute(&self, name: &str) -> AttributeChange {
        AttributeChange {
            old: self.before.as_ref().and_then(|e| e.read(name)),
            new: self.after.read(name),
        }
    }

    /// 指定属性是否在本次提交中变化（缺省与存在之间的切换也算）
    pub fn changed(&self, name: &str) -> bool {
        self.attribute(name).is_changed()
    }
}
