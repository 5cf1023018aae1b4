//! Builder 模式实现
//!
//! 提供链式构造 [`ControlLink`] 的便捷方式。

use crate::actuator::Actuator;
use crate::config::ProtocolConfig;
use crate::error::DriverError;
use crate::link::ControlLink;
use crate::listener::{ListenerFailurePolicy, ListenerRegistry};
use nxtar_transport::SplittableTransport;
use std::sync::Arc;

/// ControlLink Builder（链式构造）
///
/// # Example
///
/// ```
/// use nxtar_driver::{ControlLinkBuilder, ListenerFailurePolicy, SimulatedActuator};
/// use nxtar_transport::mock::MockTransport;
///
/// let link = ControlLinkBuilder::new()
///     .listener_failure_policy(ListenerFailurePolicy::Abort)
///     .outgoing_capacity(4)
///     .build(MockTransport::new(), SimulatedActuator::new())
///     .unwrap();
/// assert!(link.registry().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct ControlLinkBuilder {
    config: ProtocolConfig,
    /// 外部共享的注册表（设置后忽略 `listener_failure_policy`）
    registry: Option<Arc<ListenerRegistry>>,
}

impl ControlLinkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 整体替换配置
    pub fn config(mut self, config: ProtocolConfig) -> Self {
        self.config = config;
        self
    }

    pub fn listener_failure_policy(mut self, policy: ListenerFailurePolicy) -> Self {
        self.config.listener_failure_policy = policy;
        self
    }

    /// 发送队列容量（最小为 1）
    pub fn outgoing_capacity(mut self, capacity: usize) -> Self {
        self.config.outgoing_capacity = capacity;
        self
    }

    pub fn max_consecutive_read_errors(mut self, count: u32) -> Self {
        self.config.max_consecutive_read_errors = count;
        self
    }

    pub fn shutdown_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.shutdown_timeout_ms = timeout_ms;
        self
    }

    /// 与其他链路或 `ControlProtocol` 共享监听器注册表
    pub fn registry(mut self, registry: Arc<ListenerRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// 拆分传输适配器并启动 IO 线程
    pub fn build<T, A>(self, transport: T, actuator: A) -> Result<ControlLink<A>, DriverError>
    where
        T: SplittableTransport,
        A: Actuator + Send + 'static,
    {
        let registry = self.registry.unwrap_or_else(|| {
            Arc::new(ListenerRegistry::with_policy(
                self.config.listener_failure_policy,
            ))
        });
        ControlLink::start(transport, actuator, registry, &self.config)
    }
}
