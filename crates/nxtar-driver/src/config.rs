//! 协议运行配置

use crate::listener::ListenerFailurePolicy;
use nxtar_protocol::Speed;
use std::time::Duration;

/// 协议运行配置
///
/// # Example
///
/// ```
/// use nxtar_driver::{ListenerFailurePolicy, ProtocolConfig};
///
/// // 默认配置（隔离失败的监听器，发送队列 16 帧）
/// let config = ProtocolConfig::default();
///
/// let config = ProtocolConfig {
///     listener_failure_policy: ListenerFailurePolicy::Abort,
///     outgoing_capacity: 64,
///     ..ProtocolConfig::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProtocolConfig {
    /// 监听器回调失败时的处理策略
    pub listener_failure_policy: ListenerFailurePolicy,
    /// 发送队列容量（帧）
    pub outgoing_capacity: usize,
    /// 读线程连续遇到多少次非超时读错误后退出
    pub max_consecutive_read_errors: u32,
    /// 关闭时等待 IO 线程退出的时间（毫秒）
    pub shutdown_timeout_ms: u64,
    /// 模拟执行器的回零速度
    pub recenter_speed: Speed,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            listener_failure_policy: ListenerFailurePolicy::Isolate,
            outgoing_capacity: 16,
            max_consecutive_read_errors: 16,
            shutdown_timeout_ms: 500,
            recenter_speed: crate::actuator::DEFAULT_RECENTER_SPEED,
        }
    }
}

impl ProtocolConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}
