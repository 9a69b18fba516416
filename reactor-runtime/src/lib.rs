//! 反应堆运行时（reactor-runtime）
//!
//! 为 `reactor-core` 的协作方契约提供进程内实现：
//! - `InMemoryJobQueue`：立即队列 + 定时集合，支持扫描与取消；
//! - `InMemoryEntityStore` 与 `EntityRepository`：保存实体并驱动提交钩子；
//! - `MailDeliveries`：收集已投递邮件；
//! - `AllowListGate`：仅放行显式启用的订阅方；
//! - `JobWorker`：周期性提升到期任务并执行就绪任务；
//! - `telemetry::init`：安装 tracing 订阅器。
//!
pub mod deliveries;
pub mod entity_store;
pub mod error;
pub mod gate;
pub mod job_queue;
pub mod telemetry;
pub mod worker;

pub use deliveries::MailDeliveries;
pub use entity_store::{EntityRepository, InMemoryEntityStore};
pub use error::RuntimeError;
pub use gate::AllowListGate;
pub use job_queue::InMemoryJobQueue;
pub use worker::{JobWorker, JobWorkerConfig, WorkerHandle};
