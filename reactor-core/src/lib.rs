//! 事件反应堆核心库（reactor-core）
//!
//! 在异步任务队列之上构建的进程内事件总线：
//! - 实体在生命周期变化时按规则发布（`publishable`）具名事件，可延迟、可条件触发；
//! - 订阅方在静态注册表（`subscriber`）中声明处理单元，互不感知发布方；
//! - 事件任务执行时重新计算触发条件，再将事件分发给所有匹配的处理单元（`reactor`）；
//! - 处理单元按各自的提交策略（延迟/弃用/队列）再次入队，最终执行动作或投递邮件（`worker`）。
//!
//! 外部协作方（任务队列、实体存储、邮件投递、运行环境）仅以 trait 形式定义，
//! 由 `reactor-runtime` 或业务方提供实现。
//!
//! 典型用法：
//! 1. 以 `#[entity]` 声明实体，并为其构建 `Publisher` 规则；
//! 2. 通过 `SubscriberRegistry::builder()` 声明订阅处理单元；
//! 3. 组装 `Reactor`，在实体提交后调用 `after_create/after_commit`；
//! 4. 队列执行任务时调用 `Reactor::perform_job`。
//!
pub mod bag;
pub mod config;
pub mod entity;
pub mod environment;
pub mod error;
pub mod event;
pub mod publishable;
pub mod queue;
pub mod reactor;
pub mod reference;
pub mod resolver;
pub mod store;
pub mod subscriber;
pub mod validator;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

// 允许在本 crate 内部通过 ::reactor_core 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::reactor_core 路径。
extern crate self as reactor_core;
