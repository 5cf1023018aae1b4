//! NxtAR SDK - 两字节电机控制协议的 Rust SDK
//!
//! # 架构设计
//!
//! 本 SDK 采用分层架构，从底层到高层：
//!
//! - **协议层** (`protocol`): 位级编码/解码与优先级规则
//! - **传输层** (`transport`): 读/写恰好 2 字节的字节流适配
//! - **驱动层** (`driver`): 分发、监听器注册表、IO 线程
//!
//! # 快速开始
//!
//! ```rust
//! use nxtar_sdk::prelude::*;
//!
//! let action = ControlAction::new(Action::MoveForward, MotorSelector::Abc, 70);
//! assert_eq!(action.to_frame().as_bytes(), &[0x0F, 70]);
//! ```

pub use nxtar_driver as driver;
pub use nxtar_protocol as protocol;
pub use nxtar_transport as transport;

pub mod logging;
pub mod prelude;

pub use driver::{
    ControlLink, ControlLinkBuilder, ControlProtocol, DriverError, ListenerFailurePolicy,
    ProtocolConfig, UserActionListener,
};
pub use logging::init_logger;
pub use protocol::{Action, ControlAction, MotorSelector, ProtocolError, Speed};
pub use transport::TransportError;
