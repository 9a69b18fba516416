//! 统一错误定义
//!
//! 聚焦发布守卫、处理单元配置、规则求值与外部协作方（任务队列/实体存储/投递）
//! 的最小必要集合，便于各实现层统一转换为 `ReactorError`。
//!
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ReactorError {
    // --- 发布 ---
    #[error("{message}")]
    ConfirmationRequired { message: String },
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    // --- 处理单元 ---
    #[error("{worker} is not properly configured! Here are the settings: {settings}")]
    UnconfiguredWorker { worker: String, settings: String },
    /// 预留：当前没有触发路径
    #[error("event handler already defined: handler={handler}")]
    DuplicateHandlerDefinition { handler: String },
    /// 预留：当前没有触发路径
    #[error("undeliverable message: {reason}")]
    UndeliverableMessage { reason: String },
    #[error("event handler error: handler={handler}, reason={reason}")]
    Handler { handler: String, reason: String },
    #[error("unknown job class: {class}")]
    UnknownJob { class: String },

    // --- 规则求值 ---
    #[error("resolver failed: field={field}, reason={reason}")]
    Resolver { field: String, reason: String },

    // --- 实体 ---
    #[error("not found: type={record_type}, id={record_id}")]
    NotFound {
        record_type: String,
        record_id: String,
    },
    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch { expected: String, found: String },

    // --- 外部协作方 ---
    #[error("job queue error: {reason}")]
    JobQueue { reason: String },
    #[error("entity store error: {reason}")]
    EntityStore { reason: String },
    #[error("delivery error: {reason}")]
    Delivery { reason: String },

    // --- 序列化 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
    #[error("parse error: {reason}")]
    Parse { reason: String },
}

impl ReactorError {
    pub fn job_queue(reason: impl Into<String>) -> Self {
        Self::JobQueue {
            reason: reason.into(),
        }
    }

    pub fn entity_store(reason: impl Into<String>) -> Self {
        Self::EntityStore {
            reason: reason.into(),
        }
    }

    pub fn resolver(field: impl Into<String>, reason: impl ToString) -> Self {
        Self::Resolver {
            field: field.into(),
            reason: reason.to_string(),
        }
    }

    pub fn not_found(record_type: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self::NotFound {
            record_type: record_type.into(),
            record_id: record_id.into(),
        }
    }

    /// 是否值得由队列重试。
    ///
    /// 配置类与输入类错误重放也不会成功，应直接失败并告警；
    /// 触发时 actor 已不存在同样视为致命失败。
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::ConfirmationRequired { .. }
                | Self::Validation { .. }
                | Self::UnconfiguredWorker { .. }
                | Self::UnknownJob { .. }
                | Self::NotFound { .. }
                | Self::TypeMismatch { .. }
                | Self::Serde { .. }
                | Self::Parse { .. }
        )
    }
}

/// 统一 Result 类型别名
pub type ReactorResult<T> = Result<T, ReactorError>;

impl From<chrono::ParseError> for ReactorError {
    fn from(err: chrono::ParseError) -> Self {
        ReactorError::Parse {
            reason: err.to_string(),
        }
    }
}
