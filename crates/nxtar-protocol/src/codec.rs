//! 帧编解码
//!
//! 纯位运算，无状态、无 IO，可在任意线程并发调用。
//!
//! 解码优先级：用户动作 1 > 2 > 3 > 回零 > 前进/后退。
//! 前进/后退且未选中任何电机时，解释为停止全部电机；
//! 回零与用户动作不做此替换，按原样返回。

use crate::action::{Action, ControlAction, MotorSelector, Speed};
use crate::flags::ControlFlags;
use crate::{ControlFrame, ProtocolError};
use bilge::prelude::*;

/// 解码一段原始字节（只读取前 2 字节）
///
/// # Errors
/// 不足 2 字节时返回 `ProtocolError::InvalidFrame`。
pub fn decode(bytes: &[u8]) -> Result<ControlAction, ProtocolError> {
    ControlFrame::from_slice(bytes).map(decode_frame)
}

/// 解码一帧
pub fn decode_frame(frame: ControlFrame) -> ControlAction {
    let flags = frame.flags();
    let mask = flags.motor_mask();

    let action = if flags.any_user() {
        if flags.user_1() {
            Action::User1
        } else if flags.user_2() {
            Action::User2
        } else {
            Action::User3
        }
    } else if flags.recenter() {
        Action::Recenter
    } else if flags.forward() {
        Action::MoveForward
    } else {
        Action::MoveBackward
    };

    // 未选中电机时默认 ABC
    let motors = MotorSelector::from_mask(mask).unwrap_or(MotorSelector::Abc);

    let action = if action.is_movement() && mask == 0 {
        Action::Stop
    } else {
        action
    };

    ControlAction::new(action, motors, Speed::from_raw(frame.speed_byte()))
}

/// 编码为 2 字节帧，从不失败
pub fn encode(action: &ControlAction) -> ControlFrame {
    let mut flags = ControlFlags::from_byte(0);

    match action.kind() {
        Action::MoveForward => flags.set_forward(true),
        // 字节从 0 开始，后退与停止不置任何动作位
        Action::MoveBackward | Action::Stop => {},
        Action::Recenter => flags.set_recenter(true),
        Action::User1 => flags.set_user_1(true),
        Action::User2 => flags.set_user_2(true),
        Action::User3 => flags.set_user_3(true),
    }

    flags.set_motors(u3::new(action.motors().mask()));

    ControlFrame::new(flags.to_byte(), action.speed().value() as u8)
}

impl ControlAction {
    /// 编码为线路帧
    pub fn to_frame(&self) -> ControlFrame {
        encode(self)
    }
}

impl From<ControlAction> for ControlFrame {
    fn from(action: ControlAction) -> Self {
        encode(&action)
    }
}

impl From<ControlFrame> for ControlAction {
    fn from(frame: ControlFrame) -> Self {
        decode_frame(frame)
    }
}
