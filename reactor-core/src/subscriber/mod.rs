//! 静态订阅（subscriber）
//!
//! 与发布方互不感知的订阅声明：声明方以事件名（或通配符）绑定方法或闭包，
//! 每条绑定生成一个唯一命名的处理单元并登记到注册表。
//!
mod declaration;
mod registry;

pub use declaration::{Declaration, OnEvent, camelize, unit_name};
pub use registry::{SubscriberRegistry, SubscriberRegistryBuilder};

/// 匹配所有事件的订阅名
pub const WILDCARD: &str = "*";
