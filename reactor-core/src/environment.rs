//! 运行环境（Environment）
//!
//! 提供两项进程级信息：是否处于交互式生产环境（发布守卫），以及全局队列覆盖。
//!
use bon::Builder;
use std::io::IsTerminal;

pub const ENV_QUEUE: &str = "REACTOR_QUEUE";
pub const ENV_MODE: &str = "REACTOR_ENV";

pub trait Environment: Send + Sync {
    /// 交互式生产环境（例如生产控制台）下需要显式确认才能发布
    fn is_interactive_production(&self) -> bool;

    /// 全局队列覆盖，存在时替换所有任务的队列
    fn queue_override(&self) -> Option<String>;
}

/// 从进程环境变量读取；每次调用时重新读取
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl SystemEnvironment {
    pub fn from_env() -> Self {
        Self
    }
}

impl Environment for SystemEnvironment {
    fn is_interactive_production(&self) -> bool {
        let production = std::env::var(ENV_MODE)
            .map(|mode| mode.trim().eq_ignore_ascii_case("production"))
            .unwrap_or(false);
        production && std::io::stdin().is_terminal()
    }

    fn queue_override(&self) -> Option<String> {
        std::env::var(ENV_QUEUE)
            .ok()
            .map(|queue| queue.trim().to_string())
            .filter(|queue| !queue.is_empty())
    }
}

/// 固定取值的环境，便于测试
#[derive(Debug, Clone, Default, Builder)]
pub struct StaticEnvironment {
    #[builder(default)]
    interactive_production: bool,
    #[builder(into)]
    queue_override: Option<String>,
}

impl Environment for StaticEnvironment {
    fn is_interactive_production(&self) -> bool {
        self.interactive_production
    }

    fn queue_override(&self) -> Option<String> {
        self.queue_override.clone()
    }
}
