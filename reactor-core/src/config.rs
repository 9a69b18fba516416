//! 反应堆配置
//!
use bon::Builder;

pub const DEFAULT_QUEUE: &str = "default";
pub const DEFAULT_CONFIRM_KEY: &str = "confirmed";

#[derive(Clone, Debug, Builder)]
pub struct ReactorConfig {
    /// 缺省队列
    #[builder(default = DEFAULT_QUEUE.to_string(), into)]
    pub default_queue: String,
    /// 事件任务所在队列，缺省时使用 `default_queue`
    #[builder(into)]
    pub event_queue: Option<String>,
    /// 交互式生产环境下放行发布的确认键
    #[builder(default = DEFAULT_CONFIRM_KEY.to_string(), into)]
    pub confirm_key: String,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ReactorConfig {
    pub fn event_queue(&self) -> &str {
        self.event_queue.as_deref().unwrap_or(&self.default_queue)
    }
}
