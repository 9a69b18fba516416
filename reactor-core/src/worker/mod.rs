//! 处理单元契约（worker）
//!
//! - `HandlerUnit`：订阅注册表中的一项，携带声明方、动作、延迟、弃用标记与队列选项；
//! - `perform_where_needed`：提交策略（弃用即忽略、有延迟则定时、否则立即）；
//! - `perform`：配置校验、闸门判断、执行动作，邮件类单元负责投递。
//!
pub mod action;
pub mod gate;
pub mod handler_unit;
pub mod mail;

pub use action::{Action, ActionFuture, Outcome, Source};
pub use gate::{AlwaysPerform, PerformGate};
pub use handler_unit::{HandlerKind, HandlerUnit, JobOptions, Performed};
pub use mail::{Delivery, MailMessage};
