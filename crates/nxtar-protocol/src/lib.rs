//! # NxtAR Protocol
//!
//! NxtAR 机器人控制协议定义（无硬件依赖、无 IO）
//!
//! ## 模块
//!
//! - `action`: 解码后的控制指令（动作、电机组合、速度）
//! - `flags`: 第 0 字节的位域定义
//! - `frame`: 2 字节线路帧 `ControlFrame`
//! - `codec`: 帧与指令之间的编码/解码
//!
//! ## 帧格式
//!
//! 每条消息固定 2 字节，无帧头、无长度前缀、无校验：
//!
//! ```text
//! Byte 0: 位域（LSB first）
//!   Bit 0-2: 电机 A/B/C 选中
//!   Bit 3:   方向（1 = 前进，0 = 后退）
//!   Bit 4:   回零请求
//!   Bit 5-7: 用户动作 1/2/3
//! Byte 1: 有符号速度（i8）
//! ```

pub mod action;
pub mod codec;
pub mod flags;
pub mod frame;

pub use action::{Action, ControlAction, MotorPort, MotorSelector, PortList, Speed, UserAction};
pub use codec::{decode, encode};
pub use flags::*;
pub use frame::ControlFrame;

use thiserror::Error;

/// 协议解析错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid frame length: expected {expected}, got {actual}")]
    InvalidFrame { expected: usize, actual: usize },

    #[error("Invalid motor mask: 0b{0:03b}")]
    InvalidMotorMask(u8),

    #[error("Not a user action: {0:?}")]
    NotUserAction(Action),
}
