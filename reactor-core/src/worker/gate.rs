use super::HandlerUnit;

/// 执行闸门：返回 `false` 时处理单元放弃本次执行
pub trait PerformGate: Send + Sync {
    fn should_perform(&self, unit: &HandlerUnit) -> bool;
}

/// 默认闸门：总是执行
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysPerform;

impl PerformGate for AlwaysPerform {
    fn should_perform(&self, _unit: &HandlerUnit) -> bool {
        true
    }
}
