//! 驱动层模块
//!
//! 本模块把协议编解码接到传输层和执行器上，包括：
//! - 分发：电机扇出（A、B、C 固定顺序）或用户动作通知
//! - 监听器注册表（恰好一次的注册/移除回调）
//! - 单线程管线 [`ControlProtocol`]
//! - 双线程链路 [`ControlLink`]（读线程 + 写线程，消息通道）
//!
//! # 使用场景
//!
//! 在测试或嵌入式主循环中直接使用 [`ControlProtocol`]；
//! 需要后台接收并从其他线程发送时使用 [`ControlLinkBuilder`]。

pub mod actuator;
mod builder;
mod config;
pub mod dispatch;
mod error;
mod link;
pub mod listener;
pub mod protocol;
pub mod stats;

pub use actuator::{
    Actuator, ActuatorError, DEFAULT_RECENTER_SPEED, Drive, MotorIntent, MotorState,
    SimulatedActuator,
};
pub use builder::ControlLinkBuilder;
pub use config::ProtocolConfig;
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use error::DriverError;
pub use link::ControlLink;
pub use listener::{
    ListenerError, ListenerFailurePolicy, ListenerRegistry, ListenerResult, NotifyReport,
    TracingListener, UserActionListener,
};
pub use protocol::ControlProtocol;
pub use stats::{LinkStats, LinkStatsSnapshot};
