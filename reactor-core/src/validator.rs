//! 事件校验（EventValidator）
//!
//! 出站事件在入队前经过一次可插拔的校验；拒绝即中止发布。
//!
use crate::{error::ReactorResult, event::Event};

pub trait EventValidator: Send + Sync {
    fn validate(&self, event: &Event) -> ReactorResult<()>;
}

impl<F> EventValidator for F
where
    F: Fn(&Event) -> ReactorResult<()> + Send + Sync,
{
    fn validate(&self, event: &Event) -> ReactorResult<()> {
        self(event)
    }
}

/// 默认校验器：全部放行
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl EventValidator for AcceptAll {
    fn validate(&self, _event: &Event) -> ReactorResult<()> {
        Ok(())
    }
}
