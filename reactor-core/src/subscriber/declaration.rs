//! 订阅声明
//!
//! ```ignore
//! let mut builder = SubscriberRegistry::builder();
//! let mut auction = builder.declare(Arc::new(Auction));
//! auction.on_event("puppy_delivered").call("ring_bell");
//! auction.on_event("pooped").delay(Duration::from_secs(300)).call("pick_up_poop");
//! auction.on_event("*").run(|auction, event| async move { auction.watch(event).await });
//! let registry = Arc::new(builder.build());
//! ```
//!
use super::{SubscriberRegistryBuilder, WILDCARD};
use crate::event::Event;
use crate::worker::{Action, Delivery, HandlerKind, HandlerUnit, JobOptions, Outcome, Source};
use std::{borrow::Cow, future::Future, sync::Arc, time::Duration};

pub struct Declaration<'a, S> {
    builder: &'a mut SubscriberRegistryBuilder,
    source: Arc<S>,
    kind: HandlerKind,
}

impl<'a, S: Source> Declaration<'a, S> {
    pub(crate) fn new(
        builder: &'a mut SubscriberRegistryBuilder,
        source: Arc<S>,
        kind: HandlerKind,
    ) -> Self {
        Self {
            builder,
            source,
            kind,
        }
    }

    /// 声明方为邮件类；动作返回的邮件经由 `delivery` 投递
    pub fn mailer(mut self, delivery: Arc<dyn Delivery>) -> Self {
        self.kind = HandlerKind::Mailer {
            delivery: Some(delivery),
        };
        self
    }

    pub fn on_event(&mut self, event: &str) -> OnEvent<'_, S> {
        OnEvent {
            builder: &mut *self.builder,
            source: self.source.clone(),
            kind: self.kind.clone(),
            event: event.to_string(),
            handler_name: None,
            delay: Duration::ZERO,
            deprecated: false,
            options: JobOptions::default(),
        }
    }
}

/// 单条订阅的选项，以 `call` 或 `run` 结束
pub struct OnEvent<'a, S> {
    builder: &'a mut SubscriberRegistryBuilder,
    source: Arc<S>,
    kind: HandlerKind,
    event: String,
    handler_name: Option<String>,
    delay: Duration,
    deprecated: bool,
    options: JobOptions,
}

impl<S: Source> OnEvent<'_, S> {
    pub fn handler_name(mut self, name: impl Into<String>) -> Self {
        self.handler_name = Some(name.into());
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }

    pub fn queue(mut self, queue: impl Into<String>) -> Self {
        self.options.queue = queue.into();
        self
    }

    pub fn retry(mut self, retry: bool) -> Self {
        self.options.retry = retry;
        self
    }

    /// 绑定声明方上的具名方法
    pub fn call(self, method: impl Into<Cow<'static, str>>) -> Arc<HandlerUnit> {
        let source: Arc<dyn Source> = self.source.clone();
        let action = Action::method(source, method);
        self.finish(action)
    }

    /// 绑定闭包；闭包收到声明方本身与入站事件
    pub fn run<F, Fut>(self, f: F) -> Arc<HandlerUnit>
    where
        F: Fn(Arc<S>, Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Outcome>> + Send + 'static,
    {
        let source = self.source.clone();
        let action = Action::inline(move |event| f(source.clone(), event));
        self.finish(action)
    }

    fn finish(self, action: Action) -> Arc<HandlerUnit> {
        let source_name = self.source.source_name().to_string();
        let name = unit_name(&source_name, &self.event, self.handler_name.as_deref());
        let unit = HandlerUnit::builder()
            .name(name)
            .source(source_name)
            .action(action)
            .delay(self.delay)
            .deprecated(self.deprecated)
            .options(self.options)
            .kind(self.kind)
            .build();
        self.builder.register(&[self.event.as_str()], unit)
    }
}

/// `StaticSubscribers::<Source>::<Camelized>`
pub fn unit_name(source: &str, event: &str, handler_name: Option<&str>) -> String {
    let local = match handler_name {
        Some(name) => camelize(name),
        None if event == WILDCARD => "WildcardHandler".to_string(),
        None => camelize(&format!("{event}_handler")),
    };
    format!("StaticSubscribers::{source}::{local}")
}

/// `puppy_delivered_handler` → `PuppyDeliveredHandler`
pub fn camelize(raw: &str) -> String {
    raw.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
