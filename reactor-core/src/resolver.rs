//! 规则字段求值器（Resolver）
//!
//! 发布规则中的 `actor`、`at`、`if`、`enqueue_if` 等字段既可以是实体上的具名属性，
//! 也可以是闭包；二者统一通过 `Resolver::evaluate` 求值。
//!
use crate::{
    bag::{time_from_value, truthy},
    entity::Entity,
    error::{ReactorError, ReactorResult},
    reference::Reference,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::{borrow::Cow, fmt, sync::Arc};

/// 从属性值转换为目标类型
pub trait Resolved: Sized {
    fn from_resolved(value: Option<Value>) -> ReactorResult<Self>;
}

impl Resolved for bool {
    fn from_resolved(value: Option<Value>) -> ReactorResult<Self> {
        Ok(value.as_ref().is_some_and(truthy))
    }
}

impl Resolved for Option<DateTime<Utc>> {
    fn from_resolved(value: Option<Value>) -> ReactorResult<Self> {
        match value {
            Some(v) => time_from_value(&v),
            None => Ok(None),
        }
    }
}

impl Resolved for Option<Reference> {
    fn from_resolved(value: Option<Value>) -> ReactorResult<Self> {
        match value {
            Some(Value::Null) | None => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }
}

impl Resolved for Option<Value> {
    fn from_resolved(value: Option<Value>) -> ReactorResult<Self> {
        Ok(value)
    }
}

type InlineFn<E, T> = dyn Fn(&E) -> anyhow::Result<T> + Send + Sync;

/// 具名属性或闭包
pub enum Resolver<E, T> {
    Method(Cow<'static, str>),
    Inline(Arc<InlineFn<E, T>>),
}

impl<E, T> Resolver<E, T>
where
    E: Entity,
    T: Resolved,
{
    pub fn method(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Method(name.into())
    }

    pub fn inline<F>(f: F) -> Self
    where
        F: Fn(&E) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self::Inline(Arc::new(f))
    }

    /// 针对实体求值；闭包失败时包装为 `ReactorError::Resolver`
    pub fn evaluate(&self, entity: &E) -> ReactorResult<T> {
        match self {
            Self::Method(name) => T::from_resolved(entity.read(name))
                .map_err(|e| ReactorError::resolver(name.as_ref(), e)),
            Self::Inline(f) => f(entity).map_err(|e| ReactorError::resolver("<inline>", e)),
        }
    }
}

impl<E, T> Clone for Resolver<E, T> {
    fn clone(&self) -> Self {
        match self {
            Self::Method(name) => Self::Method(name.clone()),
            Self::Inline(f) => Self::Inline(f.clone()),
        }
    }
}

impl<E, T> fmt::Debug for Resolver<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method(name) => f.debug_tuple("Method").field(name).finish(),
            Self::Inline(_) => f.write_str("Inline(..)"),
        }
    }
}

impl<E, T> From<&'static str> for Resolver<E, T> {
    fn from(name: &'static str) -> Self {
        Self::Method(Cow::Borrowed(name))
    }
}
