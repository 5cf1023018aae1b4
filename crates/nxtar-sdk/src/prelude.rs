//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use nxtar_sdk::prelude::*;
//! ```

// 协议层
pub use crate::protocol::{Action, ControlAction, ControlFrame, MotorPort, MotorSelector, Speed};

// 传输层（常用 Trait）
pub use crate::transport::{SplittableTransport, TcpTransport, Transport};

// 驱动层
pub use crate::driver::{
    Actuator, ControlLink, ControlLinkBuilder, ControlProtocol, DispatchOutcome, Drive,
    ListenerFailurePolicy, ListenerRegistry, ListenerResult, SimulatedActuator,
    UserActionListener,
};

// 错误类型
pub use crate::driver::DriverError;
pub use crate::protocol::ProtocolError;
pub use crate::transport::TransportError;
