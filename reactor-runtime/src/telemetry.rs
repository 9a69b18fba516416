//! tracing 初始化
//!
use crate::error::RuntimeError;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_DIRECTIVE: &str = "info";

/// 安装 fmt 订阅器；过滤规则取 `RUST_LOG`，缺省为 `info`
pub fn init() -> Result<(), RuntimeError> {
    init_with(DEFAULT_DIRECTIVE)
}

pub fn init_with(default_directive: &str) -> Result<(), RuntimeError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .map_err(|e| RuntimeError::Telemetry(e.to_string()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| RuntimeError::Telemetry(e.to_string()))
}
