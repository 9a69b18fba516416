use dashmap::DashSet;
use reactor_core::worker::{HandlerUnit, PerformGate};

/// 仅放行显式启用的订阅方（按声明方名称）
#[derive(Debug, Default)]
pub struct AllowListGate {
    sources: DashSet<String>,
}

impl AllowListGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allowed<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let gate = Self::new();
        for source in sources {
            gate.allow(source);
        }
        gate
    }

    pub fn allow(&self, source: impl Into<String>) {
        self.sources.insert(source.into());
    }

    pub fn revoke(&self, source: &str) {
        self.sources.remove(source);
    }

    pub fn is_allowed(&self, source: &str) -> bool {
        self.sources.contains(source)
    }
}

impl PerformGate for AllowListGate {
    fn should_perform(&self, unit: &HandlerUnit) -> bool {
        unit.source().is_some_and(|source| self.is_allowed(source))
    }
}
