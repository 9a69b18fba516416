//! 实体存储契约（EntityStore）
//!
//! 核心对存储只读：按多态引用取回当前记录。
//!
use crate::{error::ReactorResult, reference::{Reference, SerializedRecord}};
use async_trait::async_trait;

#[async_trait]
pub trait EntityStore: Send + Sync {
    /// 记录不存在时返回 `ReactorError::NotFound`
    async fn find(&self, reference: &Reference) -> ReactorResult<SerializedRecord>;
}
