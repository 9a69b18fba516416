//! 处理单元的动作（Action）
//!
//! 动作要么是声明方（`Source`）上的具名方法，要么是捕获了声明方的闭包。
//! 邮件类动作以 `Outcome::Mail` 返回构建好的邮件，表示“已调用 mail”。
//!
use super::mail::MailMessage;
use crate::event::Event;
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use std::{borrow::Cow, fmt, future::Future, sync::Arc};

/// 动作执行结果
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Done,
    Mail(MailMessage),
}

pub type ActionFuture = BoxFuture<'static, anyhow::Result<Outcome>>;

/// 订阅声明方：以类型名标识，可按名称响应事件
#[async_trait]
pub trait Source: Send + Sync + 'static {
    /// 声明方名称，可带命名空间，例如 `MyNamespace::MyClass`
    fn source_name(&self) -> &str;

    /// 按名称调用方法
    async fn invoke(&self, method: &str, event: Event) -> anyhow::Result<Outcome> {
        let _ = event;
        anyhow::bail!("{} does not respond to {method}", self.source_name())
    }
}

type InlineAction = dyn Fn(Event) -> ActionFuture + Send + Sync;

#[derive(Clone)]
pub enum Action {
    Method {
        source: Arc<dyn Source>,
        method: Cow<'static, str>,
    },
    Inline(Arc<InlineAction>),
}

impl Action {
    pub fn method(source: Arc<dyn Source>, method: impl Into<Cow<'static, str>>) -> Self {
        Self::Method {
            source,
            method: method.into(),
        }
    }

    pub fn inline<F, Fut>(f: F) -> Self
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Outcome>> + Send + 'static,
    {
        Self::Inline(Arc::new(move |event| Box::pin(f(event))))
    }

    pub async fn call(&self, event: Event) -> anyhow::Result<Outcome> {
        match self {
            Self::Method { source, method } => source.invoke(method, event).await,
            Self::Inline(f) => f(event).await,
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method { source, method } => {
                write!(f, "{}.{}", source.source_name(), method)
            }
            Self::Inline(_) => f.write_str("<inline>"),
        }
    }
}
