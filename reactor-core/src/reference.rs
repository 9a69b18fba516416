//! 多态引用（Reference）与实体的序列化形态（SerializedRecord）
//!
//! 数据包中一个逻辑字段 `F` 以 `F_type` / `F_id` 两个条目表示，
//! 读取时总是重新向实体存储查询，不做缓存。
//!
use crate::{
    bag::DataBag,
    entity::Entity,
    error::{ReactorError, ReactorResult},
    store::EntityStore,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// 指向某个实体记录的多态引用
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "type")]
    record_type: String,
    #[serde(rename = "id")]
    record_id: String,
}

impl Reference {
    pub fn new(record_type: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            record_id: record_id.into(),
        }
    }

    /// 由实体实例构造引用
    pub fn of<E: Entity>(entity: &E) -> Self {
        Self::new(E::TYPE, entity.id().to_string())
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    /// 是否指向给定类型
    pub fn is<E: Entity>(&self) -> bool {
        self.record_type == E::TYPE
    }

    /// 写入数据包：`{field}_type` 与 `{field}_id`（id 统一为字符串）
    pub fn write(&self, bag: &mut DataBag, field: &str) {
        bag.set(format!("{field}_type"), self.record_type.clone());
        bag.set(format!("{field}_id"), self.record_id.clone());
    }

    /// 从数据包读取；类型缺失时返回 `None`
    pub fn read(bag: &DataBag, field: &str) -> ReactorResult<Option<Self>> {
        let Some(record_type) = bag.present(format!("{field}_type")) else {
            return Ok(None);
        };
        let record_type = match record_type {
            Value::String(s) => s.clone(),
            other => {
                return Err(ReactorError::Parse {
                    reason: format!("{field}_type is not a string: {other}"),
                });
            }
        };
        let record_id = match bag.present(format!("{field}_id")) {
            None => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => {
                return Err(ReactorError::Parse {
                    reason: format!("{field}_id is not a scalar: {other}"),
                });
            }
        };
        Ok(Some(Self::new(record_type, record_id)))
    }

    /// 向实体存储查询当前记录
    pub async fn resolve(&self, store: &dyn EntityStore) -> ReactorResult<SerializedRecord> {
        store.find(self).await
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.record_type, self.record_id)
    }
}

/// 实体存储中记录的通用形态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedRecord {
    record_type: String,
    record_id: String,
    attributes: Value,
}

impl SerializedRecord {
    pub fn new(
        record_type: impl Into<String>,
        record_id: impl Into<String>,
        attributes: Value,
    ) -> Self {
        Self {
            record_type: record_type.into(),
            record_id: record_id.into(),
            attributes,
        }
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    pub fn attributes(&self) -> &Value {
        &self.attributes
    }

    pub fn reference(&self) -> Reference {
        Reference::new(self.record_type.clone(), self.record_id.clone())
    }

    /// 读取单个属性，`null` 视为缺省
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name).filter(|v| !v.is_null())
    }

    /// 将记录反序列化为实体实例
    pub fn to_entity<E: Entity>(&self) -> ReactorResult<E> {
        if E::TYPE != self.record_type {
            return Err(ReactorError::TypeMismatch {
                expected: E::TYPE.to_string(),
                found: self.record_type.clone(),
            });
        }

        let entity = serde_json::from_value(self.attributes.clone())?;
        Ok(entity)
    }

    /// 从实体实例创建记录
    pub fn from_entity<E: Entity>(entity: &E) -> ReactorResult<Self> {
        Ok(Self {
            record_type: E::TYPE.to_string(),
            record_id: entity.id().to_string(),
            attributes: serde_json::to_value(entity)?,
        })
    }
}
